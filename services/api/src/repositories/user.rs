//! User account persistence

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::parse_column;
use crate::models::user::{UpdateUserRequest, User};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Update the editable profile fields, leaving absent ones untouched
    async fn update_profile(&self, id: Uuid, request: &UpdateUserRequest) -> Result<Option<User>>;
}

const USER_COLUMNS: &str = "id, email, name, role, user_type, first_name, last_name, phone, bio, \
     date_of_birth, email_verified, created_at, updated_at";

fn user_from_row(row: &PgRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        role: parse_column(row, "role")?,
        user_type: parse_column(row, "user_type")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        phone: row.try_get("phone")?,
        bio: row.try_get("bio")?,
        date_of_birth: row.try_get("date_of_birth")?,
        email_verified: row.try_get("email_verified")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// PostgreSQL user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn update_profile(&self, id: Uuid, request: &UpdateUserRequest) -> Result<Option<User>> {
        let query = format!(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone = COALESCE($4, phone),
                bio = COALESCE($5, bio),
                date_of_birth = COALESCE($6, date_of_birth),
                user_type = COALESCE($7, user_type),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(&request.first_name)
            .bind(&request.last_name)
            .bind(&request.phone)
            .bind(&request.bio)
            .bind(request.date_of_birth)
            .bind(request.user_type.map(|user_type| user_type.as_str()))
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }
}
