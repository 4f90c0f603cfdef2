//! Photos on a user's own profile

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::photo::{NewProfilePhoto, ProfilePhoto, UploadProfilePhotoRequest},
    repositories::ProfilePhotoRepository,
    services::photos::decode_photo,
    storage::PhotoStorage,
};

fn profile_photo_key(user_id: Uuid) -> String {
    format!("users/{}/photos/{}.jpg", user_id, Uuid::new_v4())
}

#[derive(Clone)]
pub struct ProfilePhotoService {
    photos: Arc<dyn ProfilePhotoRepository>,
    storage: Arc<dyn PhotoStorage>,
}

impl ProfilePhotoService {
    pub fn new(photos: Arc<dyn ProfilePhotoRepository>, storage: Arc<dyn PhotoStorage>) -> Self {
        Self { photos, storage }
    }

    pub async fn upload(
        &self,
        user_id: Uuid,
        request: UploadProfilePhotoRequest,
    ) -> ApiResult<ProfilePhoto> {
        let bytes = decode_photo(&request.photo_data)?;
        let photo_url = self
            .storage
            .put(&profile_photo_key(user_id), bytes, "image/jpeg")
            .await?;

        let photo = self
            .photos
            .create(&NewProfilePhoto {
                user_id,
                photo_url,
                is_primary: request.is_primary,
            })
            .await?;

        info!("Profile photo {} uploaded by {}", photo.id, user_id);
        Ok(photo)
    }

    pub async fn photos(&self, user_id: Uuid) -> ApiResult<Vec<ProfilePhoto>> {
        Ok(self.photos.list_for_user(user_id).await?)
    }

    pub async fn delete(&self, user_id: Uuid, photo_id: Uuid) -> ApiResult<()> {
        if !self.photos.delete(photo_id, user_id).await? {
            return Err(ApiError::not_found("Photo not found"));
        }
        Ok(())
    }

    pub async fn set_primary(&self, user_id: Uuid, photo_id: Uuid) -> ApiResult<ProfilePhoto> {
        self.photos
            .set_primary(photo_id, user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Photo not found"))
    }
}
