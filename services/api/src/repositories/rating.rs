//! Rating persistence

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::models::rating::{NewRating, Rating};

#[async_trait]
pub trait RatingRepository: Send + Sync {
    async fn find_by_session_and_rater(
        &self,
        session_id: Uuid,
        rater_id: Uuid,
    ) -> Result<Option<Rating>>;

    /// Insert a rating; `None` if this rater already rated the session
    async fn insert(&self, new_rating: &NewRating) -> Result<Option<Rating>>;

    /// Ratings received by a user, newest first
    async fn list_for_rated(&self, rated_id: Uuid) -> Result<Vec<Rating>>;
}

const RATING_COLUMNS: &str = "id, session_id, rater_id, rated_id, rating, review_text, \
     punctuality_rating, quality_rating, friendliness_rating, would_recommend, created_at, updated_at";

fn rating_from_row(row: &PgRow) -> Result<Rating> {
    Ok(Rating {
        id: row.try_get("id")?,
        session_id: row.try_get("session_id")?,
        rater_id: row.try_get("rater_id")?,
        rated_id: row.try_get("rated_id")?,
        rating: row.try_get("rating")?,
        review_text: row.try_get("review_text")?,
        punctuality_rating: row.try_get("punctuality_rating")?,
        quality_rating: row.try_get("quality_rating")?,
        friendliness_rating: row.try_get("friendliness_rating")?,
        would_recommend: row.try_get("would_recommend")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// PostgreSQL rating repository
#[derive(Clone)]
pub struct PgRatingRepository {
    pool: PgPool,
}

impl PgRatingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RatingRepository for PgRatingRepository {
    async fn find_by_session_and_rater(
        &self,
        session_id: Uuid,
        rater_id: Uuid,
    ) -> Result<Option<Rating>> {
        let query = format!(
            "SELECT {} FROM ratings WHERE session_id = $1 AND rater_id = $2",
            RATING_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(session_id)
            .bind(rater_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(rating_from_row).transpose()
    }

    async fn insert(&self, new_rating: &NewRating) -> Result<Option<Rating>> {
        let query = format!(
            r#"
            INSERT INTO ratings (id, session_id, rater_id, rated_id, rating, review_text,
                                 punctuality_rating, quality_rating, friendliness_rating,
                                 would_recommend)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (session_id, rater_id) DO NOTHING
            RETURNING {}
            "#,
            RATING_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(new_rating.session_id)
            .bind(new_rating.rater_id)
            .bind(new_rating.rated_id)
            .bind(new_rating.rating)
            .bind(&new_rating.review_text)
            .bind(new_rating.punctuality_rating)
            .bind(new_rating.quality_rating)
            .bind(new_rating.friendliness_rating)
            .bind(new_rating.would_recommend)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(rating_from_row).transpose()
    }

    async fn list_for_rated(&self, rated_id: Uuid) -> Result<Vec<Rating>> {
        let query = format!(
            "SELECT {} FROM ratings WHERE rated_id = $1 ORDER BY created_at DESC",
            RATING_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(rated_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(rating_from_row).collect()
    }
}
