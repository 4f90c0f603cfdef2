//! Match suggestion persistence

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::{
    parse_column,
    session::{SESSION_COLUMNS, session_from_row},
};
use crate::models::{
    matches::{Match, NewMatch},
    session::Session,
};

/// Result of accepting a match
#[derive(Debug)]
pub enum Acceptance {
    Accepted { accepted: Match, session: Session },
    /// The match was no longer pending for this dishwasher
    NotPending,
    /// The session was no longer open; the match is left pending
    SessionUnavailable,
}

#[async_trait]
pub trait MatchRepository: Send + Sync {
    async fn create(&self, new_match: &NewMatch) -> Result<Match>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Match>>;

    /// Highest score first, unscored last
    async fn list_for_session(&self, session_id: Uuid) -> Result<Vec<Match>>;

    /// Newest first
    async fn list_for_dishwasher(&self, dishwasher_id: Uuid) -> Result<Vec<Match>>;

    /// pending -> declined, only for the proposed dishwasher
    async fn decline(
        &self,
        id: Uuid,
        dishwasher_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Match>>;

    /// pending -> accepted and open -> matched in one transaction
    async fn accept(
        &self,
        id: Uuid,
        dishwasher_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Acceptance>;
}

const MATCH_COLUMNS: &str =
    "id, session_id, dishwasher_id, match_score, status, created_at, responded_at";

fn match_from_row(row: &PgRow) -> Result<Match> {
    Ok(Match {
        id: row.try_get("id")?,
        session_id: row.try_get("session_id")?,
        dishwasher_id: row.try_get("dishwasher_id")?,
        match_score: row.try_get("match_score")?,
        status: parse_column(row, "status")?,
        created_at: row.try_get("created_at")?,
        responded_at: row.try_get("responded_at")?,
    })
}

/// PostgreSQL match repository
#[derive(Clone)]
pub struct PgMatchRepository {
    pool: PgPool,
}

impl PgMatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MatchRepository for PgMatchRepository {
    async fn create(&self, new_match: &NewMatch) -> Result<Match> {
        let query = format!(
            r#"
            INSERT INTO matches (id, session_id, dishwasher_id, match_score)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            MATCH_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(new_match.session_id)
            .bind(new_match.dishwasher_id)
            .bind(new_match.match_score)
            .fetch_one(&self.pool)
            .await?;

        match_from_row(&row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Match>> {
        let query = format!("SELECT {} FROM matches WHERE id = $1", MATCH_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn list_for_session(&self, session_id: Uuid) -> Result<Vec<Match>> {
        let query = format!(
            "SELECT {} FROM matches WHERE session_id = $1 ORDER BY match_score DESC NULLS LAST",
            MATCH_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(session_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(match_from_row).collect()
    }

    async fn list_for_dishwasher(&self, dishwasher_id: Uuid) -> Result<Vec<Match>> {
        let query = format!(
            "SELECT {} FROM matches WHERE dishwasher_id = $1 ORDER BY created_at DESC",
            MATCH_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(dishwasher_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(match_from_row).collect()
    }

    async fn decline(
        &self,
        id: Uuid,
        dishwasher_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Match>> {
        let query = format!(
            r#"
            UPDATE matches SET status = 'declined', responded_at = $3
            WHERE id = $1 AND dishwasher_id = $2 AND status = 'pending'
            RETURNING {}
            "#,
            MATCH_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(dishwasher_id)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn accept(
        &self,
        id: Uuid,
        dishwasher_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Acceptance> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            r#"
            UPDATE matches SET status = 'accepted', responded_at = $3
            WHERE id = $1 AND dishwasher_id = $2 AND status = 'pending'
            RETURNING {}
            "#,
            MATCH_COLUMNS
        );
        let match_row = sqlx::query(&query)
            .bind(id)
            .bind(dishwasher_id)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(match_row) = match_row else {
            tx.rollback().await?;
            return Ok(Acceptance::NotPending);
        };
        let accepted = match_from_row(&match_row)?;

        let query = format!(
            r#"
            UPDATE sessions
            SET status = 'matched', dishwasher_id = $2, updated_at = $3
            WHERE id = $1 AND status = 'open' AND host_id <> $2
            RETURNING {}
            "#,
            SESSION_COLUMNS
        );
        let session_row = sqlx::query(&query)
            .bind(accepted.session_id)
            .bind(dishwasher_id)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(session_row) = session_row else {
            tx.rollback().await?;
            return Ok(Acceptance::SessionUnavailable);
        };
        let session = session_from_row(&session_row)?;

        tx.commit().await?;

        Ok(Acceptance::Accepted { accepted, session })
    }
}
