//! Session photos and community moderation

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    models::{
        notification::{NewNotification, NotificationKind},
        photo::{
            FlagPhotoRequest, FlaggedPhoto, ModerationAction, NewPhotoFlag, NewSessionPhoto,
            PhotoFlag, SessionPhoto, UploadPhotoRequest,
        },
    },
    repositories::{PhotoRepository, SessionRepository},
    services::notifications::Notifier,
    storage::PhotoStorage,
};

pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Decode a base64 upload and check its size
pub(crate) fn decode_photo(photo_data: &str) -> ApiResult<Vec<u8>> {
    let bytes = STANDARD
        .decode(photo_data.trim())
        .map_err(|_| ApiError::bad_request("Photo data is not valid base64"))?;
    if bytes.is_empty() {
        return Err(ApiError::bad_request("Photo data is empty"));
    }
    if bytes.len() > MAX_PHOTO_BYTES {
        return Err(ApiError::bad_request("Photo exceeds the 5 MB limit"));
    }
    Ok(bytes)
}

fn photo_key(session_id: Uuid) -> String {
    format!("sessions/{}/photos/{}.jpg", session_id, Uuid::new_v4())
}

#[derive(Clone)]
pub struct PhotoService {
    photos: Arc<dyn PhotoRepository>,
    sessions: Arc<dyn SessionRepository>,
    storage: Arc<dyn PhotoStorage>,
    notifier: Notifier,
    auto_hide_threshold: i32,
}

impl PhotoService {
    pub fn new(
        photos: Arc<dyn PhotoRepository>,
        sessions: Arc<dyn SessionRepository>,
        storage: Arc<dyn PhotoStorage>,
        notifier: Notifier,
        auto_hide_threshold: i32,
    ) -> Self {
        Self {
            photos,
            sessions,
            storage,
            notifier,
            auto_hide_threshold,
        }
    }

    pub async fn upload(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        request: UploadPhotoRequest,
    ) -> ApiResult<SessionPhoto> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Session not found"))?;

        if !session.is_participant(user_id) {
            return Err(ApiError::forbidden(
                "Only session participants can upload photos",
            ));
        }

        let bytes = decode_photo(&request.photo_data)?;
        let key = photo_key(session.id);
        let photo_url = self.storage.put(&key, bytes, "image/jpeg").await?;

        let photo = self
            .photos
            .create(&NewSessionPhoto {
                session_id: session.id,
                user_id,
                photo_url,
                caption: request.caption,
            })
            .await?;

        info!("Photo {} uploaded to session {}", photo.id, session.id);
        Ok(photo)
    }

    pub async fn session_photos(&self, session_id: Uuid) -> ApiResult<Vec<SessionPhoto>> {
        Ok(self.photos.list_visible(session_id).await?)
    }

    pub async fn flag(
        &self,
        reporter_id: Uuid,
        photo_id: Uuid,
        request: FlagPhotoRequest,
    ) -> ApiResult<PhotoFlag> {
        if self.photos.find_by_id(photo_id).await?.is_none() {
            return Err(ApiError::not_found("Photo not found"));
        }

        let (flag, photo) = self
            .photos
            .record_flag(
                &NewPhotoFlag {
                    photo_id,
                    reporter_id,
                    reason: request.reason,
                    description: request.description,
                },
                self.auto_hide_threshold,
            )
            .await?
            .ok_or_else(|| ApiError::bad_request("You have already flagged this photo"))?;

        if photo.is_hidden {
            warn!(
                "Photo {} hidden for review after {} flags",
                photo.id, photo.flag_count
            );
        }

        Ok(flag)
    }

    pub async fn flagged_photos(&self, user: &AuthUser) -> ApiResult<Vec<FlaggedPhoto>> {
        require_admin(user)?;
        Ok(self.photos.list_flagged().await?)
    }

    pub async fn moderate(
        &self,
        user: &AuthUser,
        photo_id: Uuid,
        action: ModerationAction,
    ) -> ApiResult<SessionPhoto> {
        require_admin(user)?;

        let photo = self
            .photos
            .moderate(photo_id, action, user.id, Utc::now())
            .await?
            .ok_or_else(|| ApiError::not_found("Photo not found"))?;

        info!("Photo {} moderated by {}: {}", photo.id, user.id, action);

        let message = match action {
            ModerationAction::Approve => "Your photo was reviewed and is visible again",
            ModerationAction::Reject => "Your photo was removed after review",
        };
        self.notifier
            .notify(
                NewNotification::new(
                    photo.user_id,
                    NotificationKind::PhotoModerated,
                    "Photo Reviewed",
                    message,
                )
                .related_to(photo.session_id)
                .with_data(json!({ "photo_id": photo.id, "action": action })),
            )
            .await;

        Ok(photo)
    }
}

fn require_admin(user: &AuthUser) -> ApiResult<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Admin access required"))
    }
}
