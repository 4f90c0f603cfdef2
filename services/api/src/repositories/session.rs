//! Session persistence

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::parse_column;
use crate::models::session::{NewSession, Session, SessionStatus, TransitionGuard};

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, new_session: &NewSession) -> Result<Session>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>>;

    /// Open sessions, soonest first
    async fn list_open(&self) -> Result<Vec<Session>>;

    /// Newest scheduled first
    async fn list_by_host(&self, host_id: Uuid) -> Result<Vec<Session>>;

    /// Newest scheduled first
    async fn list_by_dishwasher(&self, dishwasher_id: Uuid) -> Result<Vec<Session>>;

    /// Sessions where the user is host or dishwasher, newest scheduled first
    async fn list_for_participant(&self, user_id: Uuid) -> Result<Vec<Session>>;

    /// open -> matched, assigning the dishwasher
    ///
    /// `None` when the session is not open or is hosted by `dishwasher_id`.
    async fn claim_open(
        &self,
        id: Uuid,
        dishwasher_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>>;

    /// matched -> confirmed, only for the host
    async fn confirm_matched(
        &self,
        id: Uuid,
        host_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>>;

    /// Apply a participant status change if `guard` holds
    async fn transition(
        &self,
        id: Uuid,
        guard: &TransitionGuard,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>>;

    /// Set `actual_duration_minutes` when `participant_id` is host or dishwasher
    ///
    /// Status and assignment are left as they are.
    async fn record_actual_duration(
        &self,
        id: Uuid,
        participant_id: Uuid,
        minutes: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>>;
}

pub(super) const SESSION_COLUMNS: &str = "id, host_id, dishwasher_id, status, scheduled_date, \
     estimated_duration_minutes, actual_duration_minutes, dish_count, meal_description, \
     special_instructions, completed_at, created_at, updated_at";

pub(super) fn session_from_row(row: &PgRow) -> Result<Session> {
    Ok(Session {
        id: row.try_get("id")?,
        host_id: row.try_get("host_id")?,
        dishwasher_id: row.try_get("dishwasher_id")?,
        status: parse_column(row, "status")?,
        scheduled_date: row.try_get("scheduled_date")?,
        estimated_duration_minutes: row.try_get("estimated_duration_minutes")?,
        actual_duration_minutes: row.try_get("actual_duration_minutes")?,
        dish_count: row.try_get("dish_count")?,
        meal_description: row.try_get("meal_description")?,
        special_instructions: row.try_get("special_instructions")?,
        completed_at: row.try_get("completed_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn sessions_from_rows(rows: Vec<PgRow>) -> Result<Vec<Session>> {
    rows.iter().map(session_from_row).collect()
}

/// PostgreSQL session repository
#[derive(Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    /// Create a new session repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn list_where(&self, filter: &str, order: &str, user_id: Uuid) -> Result<Vec<Session>> {
        let query = format!(
            "SELECT {} FROM sessions WHERE {} ORDER BY {}",
            SESSION_COLUMNS, filter, order
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        sessions_from_rows(rows)
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create(&self, new_session: &NewSession) -> Result<Session> {
        let query = format!(
            r#"
            INSERT INTO sessions (id, host_id, status, scheduled_date, estimated_duration_minutes,
                                  dish_count, meal_description, special_instructions)
            VALUES ($1, $2, 'open', $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            SESSION_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(new_session.host_id)
            .bind(new_session.scheduled_date)
            .bind(new_session.estimated_duration_minutes)
            .bind(new_session.dish_count)
            .bind(&new_session.meal_description)
            .bind(&new_session.special_instructions)
            .fetch_one(&self.pool)
            .await?;

        session_from_row(&row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>> {
        let query = format!("SELECT {} FROM sessions WHERE id = $1", SESSION_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn list_open(&self) -> Result<Vec<Session>> {
        let query = format!(
            "SELECT {} FROM sessions WHERE status = 'open' ORDER BY scheduled_date ASC",
            SESSION_COLUMNS
        );
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        sessions_from_rows(rows)
    }

    async fn list_by_host(&self, host_id: Uuid) -> Result<Vec<Session>> {
        self.list_where("host_id = $1", "scheduled_date DESC", host_id)
            .await
    }

    async fn list_by_dishwasher(&self, dishwasher_id: Uuid) -> Result<Vec<Session>> {
        self.list_where("dishwasher_id = $1", "scheduled_date DESC", dishwasher_id)
            .await
    }

    async fn list_for_participant(&self, user_id: Uuid) -> Result<Vec<Session>> {
        self.list_where(
            "host_id = $1 OR dishwasher_id = $1",
            "scheduled_date DESC",
            user_id,
        )
        .await
    }

    async fn claim_open(
        &self,
        id: Uuid,
        dishwasher_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>> {
        let query = format!(
            r#"
            UPDATE sessions
            SET status = 'matched', dishwasher_id = $2, updated_at = $3
            WHERE id = $1 AND status = 'open' AND host_id <> $2
            RETURNING {}
            "#,
            SESSION_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(dishwasher_id)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn confirm_matched(
        &self,
        id: Uuid,
        host_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>> {
        let query = format!(
            r#"
            UPDATE sessions
            SET status = 'confirmed', updated_at = $3
            WHERE id = $1 AND status = 'matched' AND host_id = $2
            RETURNING {}
            "#,
            SESSION_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(host_id)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn transition(
        &self,
        id: Uuid,
        guard: &TransitionGuard,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>> {
        let allowed_from: Vec<String> = guard
            .allowed_from
            .iter()
            .map(|status| status.as_str().to_string())
            .collect();

        let query = format!(
            r#"
            UPDATE sessions
            SET status = $3,
                completed_at = CASE WHEN $6 THEN $4 ELSE completed_at END,
                updated_at = $4
            WHERE id = $1
              AND (host_id = $2 OR dishwasher_id = $2)
              AND status = ANY($5)
              AND (NOT $7 OR dishwasher_id IS NOT NULL)
            RETURNING {}
            "#,
            SESSION_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(guard.actor)
            .bind(guard.target.as_str())
            .bind(now)
            .bind(allowed_from)
            .bind(guard.target == SessionStatus::Completed)
            .bind(guard.requires_dishwasher)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn record_actual_duration(
        &self,
        id: Uuid,
        participant_id: Uuid,
        minutes: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>> {
        let query = format!(
            r#"
            UPDATE sessions
            SET actual_duration_minutes = $3, updated_at = $4
            WHERE id = $1 AND (host_id = $2 OR dishwasher_id = $2)
            RETURNING {}
            "#,
            SESSION_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(participant_id)
            .bind(minutes)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(session_from_row).transpose()
    }
}
