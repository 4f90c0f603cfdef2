//! Notification delivery and inbox operations

use serde_json::Value;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::notification::{NewNotification, Notification},
    realtime::{self, Channel, EventPublisher, NOTIFICATION_NEW},
    repositories::NotificationRepository,
};

/// Number of notifications returned by the inbox
const INBOX_LIMIT: i64 = 50;

/// Persists a notification and pushes it to the recipient
///
/// Never fails: a notification is a side effect of another operation.
#[derive(Clone)]
pub struct Notifier {
    notifications: Arc<dyn NotificationRepository>,
    publisher: Arc<dyn EventPublisher>,
}

impl Notifier {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            notifications,
            publisher,
        }
    }

    pub fn publisher(&self) -> &dyn EventPublisher {
        self.publisher.as_ref()
    }

    pub async fn notify(&self, notification: NewNotification) {
        let created = match self.notifications.create(&notification).await {
            Ok(created) => created,
            Err(e) => {
                warn!(
                    "Failed to store {} notification for {}: {}",
                    notification.kind, notification.user_id, e
                );
                return;
            }
        };

        let payload = serde_json::to_value(&created).unwrap_or(Value::Null);
        realtime::emit(
            self.publisher(),
            Channel::User(created.user_id),
            NOTIFICATION_NEW,
            payload,
        )
        .await;
    }
}

#[derive(Clone)]
pub struct NotificationService {
    notifications: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(notifications: Arc<dyn NotificationRepository>) -> Self {
        Self { notifications }
    }

    pub async fn my_notifications(&self, user_id: Uuid) -> ApiResult<Vec<Notification>> {
        Ok(self
            .notifications
            .list_for_user(user_id, INBOX_LIMIT)
            .await?)
    }

    pub async fn mark_as_read(&self, user_id: Uuid, id: Uuid) -> ApiResult<()> {
        if self.notifications.mark_read(id, user_id).await? {
            Ok(())
        } else {
            Err(ApiError::not_found("Notification not found"))
        }
    }

    pub async fn mark_all_as_read(&self, user_id: Uuid) -> ApiResult<u64> {
        Ok(self.notifications.mark_all_read(user_id).await?)
    }
}
