//! Profile photo persistence

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::models::photo::{NewProfilePhoto, ProfilePhoto};

#[async_trait]
pub trait ProfilePhotoRepository: Send + Sync {
    /// Insert at the end of the user's photos; a primary photo replaces the
    /// previous primary in the same transaction
    async fn create(&self, photo: &NewProfilePhoto) -> Result<ProfilePhoto>;

    /// Primary first, then display order
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ProfilePhoto>>;

    /// `false` when the photo does not exist or belongs to someone else
    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool>;

    /// `None` when the photo does not exist or belongs to someone else
    async fn set_primary(&self, id: Uuid, user_id: Uuid) -> Result<Option<ProfilePhoto>>;
}

const PROFILE_PHOTO_COLUMNS: &str =
    "id, user_id, photo_url, is_primary, display_order, uploaded_at";

fn profile_photo_from_row(row: &PgRow) -> Result<ProfilePhoto> {
    Ok(ProfilePhoto {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        photo_url: row.try_get("photo_url")?,
        is_primary: row.try_get("is_primary")?,
        display_order: row.try_get("display_order")?,
        uploaded_at: row.try_get("uploaded_at")?,
    })
}

async fn clear_primary(tx: &mut Transaction<'_, Postgres>, user_id: Uuid) -> Result<()> {
    sqlx::query("UPDATE profile_photos SET is_primary = FALSE WHERE user_id = $1 AND is_primary")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// PostgreSQL profile photo repository
#[derive(Clone)]
pub struct PgProfilePhotoRepository {
    pool: PgPool,
}

impl PgProfilePhotoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfilePhotoRepository for PgProfilePhotoRepository {
    async fn create(&self, photo: &NewProfilePhoto) -> Result<ProfilePhoto> {
        let mut tx = self.pool.begin().await?;

        if photo.is_primary {
            clear_primary(&mut tx, photo.user_id).await?;
        }

        let query = format!(
            r#"
            INSERT INTO profile_photos (id, user_id, photo_url, is_primary, display_order)
            VALUES ($1, $2, $3, $4,
                    (SELECT COUNT(*) FROM profile_photos WHERE user_id = $2)::INTEGER)
            RETURNING {}
            "#,
            PROFILE_PHOTO_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(photo.user_id)
            .bind(&photo.photo_url)
            .bind(photo.is_primary)
            .fetch_one(&mut *tx)
            .await?;
        let created = profile_photo_from_row(&row)?;

        tx.commit().await?;

        Ok(created)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ProfilePhoto>> {
        let query = format!(
            r#"
            SELECT {} FROM profile_photos
            WHERE user_id = $1
            ORDER BY is_primary DESC, display_order ASC
            "#,
            PROFILE_PHOTO_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(profile_photo_from_row).collect()
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM profile_photos WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_primary(&self, id: Uuid, user_id: Uuid) -> Result<Option<ProfilePhoto>> {
        let mut tx = self.pool.begin().await?;

        clear_primary(&mut tx, user_id).await?;

        let query = format!(
            r#"
            UPDATE profile_photos SET is_primary = TRUE
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            PROFILE_PHOTO_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };
        let photo = profile_photo_from_row(&row)?;

        tx.commit().await?;

        Ok(Some(photo))
    }
}
