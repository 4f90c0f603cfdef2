//! Notification models

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::text_enum;

text_enum! {
    /// What a notification is about
    NotificationKind {
        SessionApplication => "session_application",
        SessionConfirmed => "session_confirmed",
        SessionUpdate => "session_update",
        NewMessage => "new_message",
        MatchAccepted => "match_accepted",
        PhotoModerated => "photo_moderated",
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub data: Option<Value>,
    pub related_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub data: Option<Value>,
    pub related_id: Option<Uuid>,
}

impl NewNotification {
    pub fn new(
        user_id: Uuid,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            kind,
            title: title.into(),
            message: message.into(),
            data: None,
            related_id: None,
        }
    }

    pub fn related_to(mut self, related_id: Uuid) -> Self {
        self.related_id = Some(related_id);
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Response for mark-all-as-read
#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub success: bool,
    pub count: u64,
}
