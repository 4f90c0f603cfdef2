//! Session photo and flag persistence

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use std::collections::HashMap;
use uuid::Uuid;

use super::parse_column;
use crate::models::photo::{
    FlaggedPhoto, ModerationAction, NewPhotoFlag, NewSessionPhoto, PhotoFlag, SessionPhoto,
};

#[async_trait]
pub trait PhotoRepository: Send + Sync {
    async fn create(&self, photo: &NewSessionPhoto) -> Result<SessionPhoto>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SessionPhoto>>;

    /// Photos of a session that are not hidden, in display order
    async fn list_visible(&self, session_id: Uuid) -> Result<Vec<SessionPhoto>>;

    /// Visible photos of sessions the user hosted or washed, newest first
    async fn list_visible_for_participant(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<SessionPhoto>>;

    /// Record a flag and bump the photo's counter in one transaction
    ///
    /// Reaching `auto_hide_threshold` hides the photo pending review.
    /// `None` if the reporter already flagged this photo.
    async fn record_flag(
        &self,
        flag: &NewPhotoFlag,
        auto_hide_threshold: i32,
    ) -> Result<Option<(PhotoFlag, SessionPhoto)>>;

    /// Photos with pending flags, most flagged first
    async fn list_flagged(&self) -> Result<Vec<FlaggedPhoto>>;

    /// Apply an admin decision to the photo and close its pending flags
    async fn moderate(
        &self,
        photo_id: Uuid,
        action: ModerationAction,
        reviewer_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionPhoto>>;
}

const PHOTO_COLUMNS: &str = "id, session_id, user_id, photo_url, caption, display_order, \
     moderation_status, flag_count, is_hidden, uploaded_at";

const FLAG_COLUMNS: &str =
    "id, photo_id, reporter_id, reason, description, status, reviewed_by, reviewed_at, created_at";

fn photo_from_row(row: &PgRow) -> Result<SessionPhoto> {
    Ok(SessionPhoto {
        id: row.try_get("id")?,
        session_id: row.try_get("session_id")?,
        user_id: row.try_get("user_id")?,
        photo_url: row.try_get("photo_url")?,
        caption: row.try_get("caption")?,
        display_order: row.try_get("display_order")?,
        moderation_status: parse_column(row, "moderation_status")?,
        flag_count: row.try_get("flag_count")?,
        is_hidden: row.try_get("is_hidden")?,
        uploaded_at: row.try_get("uploaded_at")?,
    })
}

fn flag_from_row(row: &PgRow) -> Result<PhotoFlag> {
    Ok(PhotoFlag {
        id: row.try_get("id")?,
        photo_id: row.try_get("photo_id")?,
        reporter_id: row.try_get("reporter_id")?,
        reason: parse_column(row, "reason")?,
        description: row.try_get("description")?,
        status: parse_column(row, "status")?,
        reviewed_by: row.try_get("reviewed_by")?,
        reviewed_at: row.try_get("reviewed_at")?,
        created_at: row.try_get("created_at")?,
    })
}

/// PostgreSQL photo repository
#[derive(Clone)]
pub struct PgPhotoRepository {
    pool: PgPool,
}

impl PgPhotoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PhotoRepository for PgPhotoRepository {
    async fn create(&self, photo: &NewSessionPhoto) -> Result<SessionPhoto> {
        let query = format!(
            r#"
            INSERT INTO session_photos (id, session_id, user_id, photo_url, caption, display_order)
            VALUES ($1, $2, $3, $4, $5,
                    (SELECT COUNT(*) FROM session_photos WHERE session_id = $2)::INTEGER)
            RETURNING {}
            "#,
            PHOTO_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(photo.session_id)
            .bind(photo.user_id)
            .bind(&photo.photo_url)
            .bind(&photo.caption)
            .fetch_one(&self.pool)
            .await?;

        photo_from_row(&row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SessionPhoto>> {
        let query = format!("SELECT {} FROM session_photos WHERE id = $1", PHOTO_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(photo_from_row).transpose()
    }

    async fn list_visible(&self, session_id: Uuid) -> Result<Vec<SessionPhoto>> {
        let query = format!(
            r#"
            SELECT {} FROM session_photos
            WHERE session_id = $1 AND is_hidden = FALSE
            ORDER BY display_order ASC, uploaded_at ASC
            "#,
            PHOTO_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(session_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(photo_from_row).collect()
    }

    async fn list_visible_for_participant(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<SessionPhoto>> {
        let query = format!(
            r#"
            SELECT {} FROM session_photos
            WHERE is_hidden = FALSE
              AND session_id IN (
                  SELECT id FROM sessions WHERE host_id = $1 OR dishwasher_id = $1
              )
            ORDER BY uploaded_at DESC
            LIMIT $2
            "#,
            PHOTO_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(photo_from_row).collect()
    }

    async fn record_flag(
        &self,
        flag: &NewPhotoFlag,
        auto_hide_threshold: i32,
    ) -> Result<Option<(PhotoFlag, SessionPhoto)>> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            r#"
            INSERT INTO photo_flags (id, photo_id, reporter_id, reason, description)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (photo_id, reporter_id) DO NOTHING
            RETURNING {}
            "#,
            FLAG_COLUMNS
        );
        let flag_row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(flag.photo_id)
            .bind(flag.reporter_id)
            .bind(flag.reason.as_str())
            .bind(&flag.description)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(flag_row) = flag_row else {
            tx.rollback().await?;
            return Ok(None);
        };

        let query = format!(
            r#"
            UPDATE session_photos
            SET flag_count = flag_count + 1,
                is_hidden = CASE WHEN flag_count + 1 >= $2 THEN TRUE ELSE is_hidden END,
                moderation_status = CASE WHEN flag_count + 1 >= $2 THEN 'pending_review'
                                         ELSE moderation_status END
            WHERE id = $1
            RETURNING {}
            "#,
            PHOTO_COLUMNS
        );
        let photo_row = sqlx::query(&query)
            .bind(flag.photo_id)
            .bind(auto_hide_threshold)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some((flag_from_row(&flag_row)?, photo_from_row(&photo_row)?)))
    }

    async fn list_flagged(&self) -> Result<Vec<FlaggedPhoto>> {
        let query = format!(
            r#"
            SELECT {} FROM session_photos p
            WHERE EXISTS (
                SELECT 1 FROM photo_flags f WHERE f.photo_id = p.id AND f.status = 'pending'
            )
            ORDER BY flag_count DESC, uploaded_at ASC
            "#,
            PHOTO_COLUMNS
        );
        let photo_rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        let photos = photo_rows
            .iter()
            .map(photo_from_row)
            .collect::<Result<Vec<_>>>()?;

        if photos.is_empty() {
            return Ok(Vec::new());
        }

        let photo_ids: Vec<Uuid> = photos.iter().map(|photo| photo.id).collect();
        let query = format!(
            r#"
            SELECT {} FROM photo_flags
            WHERE photo_id = ANY($1) AND status = 'pending'
            ORDER BY created_at ASC
            "#,
            FLAG_COLUMNS
        );
        let flag_rows = sqlx::query(&query)
            .bind(&photo_ids)
            .fetch_all(&self.pool)
            .await?;

        let mut flags_by_photo: HashMap<Uuid, Vec<PhotoFlag>> = HashMap::new();
        for row in &flag_rows {
            let flag = flag_from_row(row)?;
            flags_by_photo.entry(flag.photo_id).or_default().push(flag);
        }

        Ok(photos
            .into_iter()
            .map(|photo| {
                let flags = flags_by_photo.remove(&photo.id).unwrap_or_default();
                FlaggedPhoto { photo, flags }
            })
            .collect())
    }

    async fn moderate(
        &self,
        photo_id: Uuid,
        action: ModerationAction,
        reviewer_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionPhoto>> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            r#"
            UPDATE session_photos
            SET moderation_status = $2,
                is_hidden = $3,
                flag_count = CASE WHEN $3 THEN flag_count ELSE 0 END
            WHERE id = $1
            RETURNING {}
            "#,
            PHOTO_COLUMNS
        );
        let photo_row = sqlx::query(&query)
            .bind(photo_id)
            .bind(action.photo_status().as_str())
            .bind(action == ModerationAction::Reject)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(photo_row) = photo_row else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(
            r#"
            UPDATE photo_flags
            SET status = $2, reviewed_by = $3, reviewed_at = $4
            WHERE photo_id = $1 AND status = 'pending'
            "#,
        )
        .bind(photo_id)
        .bind(action.flag_status().as_str())
        .bind(reviewer_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        photo_from_row(&photo_row).map(Some)
    }
}
