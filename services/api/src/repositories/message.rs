//! Chat message persistence

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::models::message::{Message, NewMessage};

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(&self, message: &NewMessage) -> Result<Message>;

    /// Oldest first
    async fn list_for_session(&self, session_id: Uuid) -> Result<Vec<Message>>;

    /// `false` unless the message exists and `receiver_id` received it
    async fn mark_read(&self, id: Uuid, receiver_id: Uuid) -> Result<bool>;

    /// Messages exchanged between two users, oldest first
    async fn list_between(&self, user_id: Uuid, other_id: Uuid) -> Result<Vec<Message>>;

    /// Messages sent or received by the user, newest first
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Message>>;
}

const MESSAGE_COLUMNS: &str =
    "id, session_id, sender_id, receiver_id, message_text, is_read, created_at";

fn message_from_row(row: &PgRow) -> Result<Message> {
    Ok(Message {
        id: row.try_get("id")?,
        session_id: row.try_get("session_id")?,
        sender_id: row.try_get("sender_id")?,
        receiver_id: row.try_get("receiver_id")?,
        message_text: row.try_get("message_text")?,
        is_read: row.try_get("is_read")?,
        created_at: row.try_get("created_at")?,
    })
}

/// PostgreSQL message repository
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn create(&self, message: &NewMessage) -> Result<Message> {
        let query = format!(
            r#"
            INSERT INTO messages (id, session_id, sender_id, receiver_id, message_text)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(message.session_id)
            .bind(message.sender_id)
            .bind(message.receiver_id)
            .bind(&message.message_text)
            .fetch_one(&self.pool)
            .await?;

        message_from_row(&row)
    }

    async fn list_for_session(&self, session_id: Uuid) -> Result<Vec<Message>> {
        let query = format!(
            "SELECT {} FROM messages WHERE session_id = $1 ORDER BY created_at ASC",
            MESSAGE_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(session_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(message_from_row).collect()
    }

    async fn mark_read(&self, id: Uuid, receiver_id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("UPDATE messages SET is_read = TRUE WHERE id = $1 AND receiver_id = $2")
                .bind(id)
                .bind(receiver_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_between(&self, user_id: Uuid, other_id: Uuid) -> Result<Vec<Message>> {
        let query = format!(
            r#"
            SELECT {} FROM messages
            WHERE (sender_id = $1 AND receiver_id = $2)
               OR (sender_id = $2 AND receiver_id = $1)
            ORDER BY created_at ASC
            "#,
            MESSAGE_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .bind(other_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(message_from_row).collect()
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Message>> {
        let query = format!(
            r#"
            SELECT {} FROM messages
            WHERE sender_id = $1 OR receiver_id = $1
            ORDER BY created_at DESC
            "#,
            MESSAGE_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(message_from_row).collect()
    }
}
