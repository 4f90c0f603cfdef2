//! Allergy and food specialty catalogues with per-user selections

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::parse_column;
use crate::models::preference::{
    Allergy, AllergySeverity, FoodPreference, FoodSpecialty, HostSpecialty, PreferenceLevel,
    UserAllergy,
};

#[async_trait]
pub trait PreferenceRepository: Send + Sync {
    /// Allergy catalogue, by name
    async fn list_allergies(&self) -> Result<Vec<Allergy>>;

    async fn find_allergy(&self, id: Uuid) -> Result<Option<Allergy>>;

    async fn list_user_allergies(&self, user_id: Uuid) -> Result<Vec<UserAllergy>>;

    /// Add an allergy to the user's list, or change its severity
    async fn upsert_user_allergy(
        &self,
        user_id: Uuid,
        allergy_id: Uuid,
        severity: AllergySeverity,
    ) -> Result<UserAllergy>;

    /// `false` when the allergy was not on the user's list
    async fn remove_user_allergy(&self, user_id: Uuid, allergy_id: Uuid) -> Result<bool>;

    /// Specialty catalogue, by name
    async fn list_specialties(&self) -> Result<Vec<FoodSpecialty>>;

    async fn find_specialty(&self, id: Uuid) -> Result<Option<FoodSpecialty>>;

    async fn list_host_specialties(&self, host_profile_id: Uuid) -> Result<Vec<HostSpecialty>>;

    /// Adding a specialty twice returns the existing entry
    async fn add_host_specialty(
        &self,
        host_profile_id: Uuid,
        specialty_id: Uuid,
    ) -> Result<HostSpecialty>;

    async fn remove_host_specialty(
        &self,
        host_profile_id: Uuid,
        specialty_id: Uuid,
    ) -> Result<bool>;

    async fn list_dishwasher_preferences(
        &self,
        dishwasher_profile_id: Uuid,
    ) -> Result<Vec<FoodPreference>>;

    /// Add a preference, or change its level
    async fn upsert_dishwasher_preference(
        &self,
        dishwasher_profile_id: Uuid,
        specialty_id: Uuid,
        level: PreferenceLevel,
    ) -> Result<FoodPreference>;

    async fn remove_dishwasher_preference(
        &self,
        dishwasher_profile_id: Uuid,
        specialty_id: Uuid,
    ) -> Result<bool>;
}

const ALLERGY_COLUMNS: &str = "id, name, description, created_at";

const SPECIALTY_COLUMNS: &str = "id, name, category, description, created_at";

/// Joined catalogue columns, prefixed so they sit beside the selection's own
const JOINED_ALLERGY: &str = "a.id AS allergy_id, a.name AS allergy_name, \
     a.description AS allergy_description, a.created_at AS allergy_created_at";

const JOINED_SPECIALTY: &str = "s.id AS specialty_id, s.name AS specialty_name, \
     s.category AS specialty_category, s.description AS specialty_description, \
     s.created_at AS specialty_created_at";

fn allergy_from_row(row: &PgRow) -> Result<Allergy> {
    Ok(Allergy {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}

fn specialty_from_row(row: &PgRow) -> Result<FoodSpecialty> {
    Ok(FoodSpecialty {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        category: row.try_get("category")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}

fn joined_specialty(row: &PgRow) -> Result<FoodSpecialty> {
    Ok(FoodSpecialty {
        id: row.try_get("specialty_id")?,
        name: row.try_get("specialty_name")?,
        category: row.try_get("specialty_category")?,
        description: row.try_get("specialty_description")?,
        created_at: row.try_get("specialty_created_at")?,
    })
}

fn user_allergy_from_row(row: &PgRow) -> Result<UserAllergy> {
    Ok(UserAllergy {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        allergy: Allergy {
            id: row.try_get("allergy_id")?,
            name: row.try_get("allergy_name")?,
            description: row.try_get("allergy_description")?,
            created_at: row.try_get("allergy_created_at")?,
        },
        severity: parse_column(row, "severity")?,
        created_at: row.try_get("created_at")?,
    })
}

fn host_specialty_from_row(row: &PgRow) -> Result<HostSpecialty> {
    Ok(HostSpecialty {
        id: row.try_get("id")?,
        host_profile_id: row.try_get("host_profile_id")?,
        specialty: joined_specialty(row)?,
        created_at: row.try_get("created_at")?,
    })
}

fn preference_from_row(row: &PgRow) -> Result<FoodPreference> {
    Ok(FoodPreference {
        id: row.try_get("id")?,
        dishwasher_profile_id: row.try_get("dishwasher_profile_id")?,
        specialty: joined_specialty(row)?,
        preference_level: parse_column(row, "preference_level")?,
        created_at: row.try_get("created_at")?,
    })
}

/// PostgreSQL preference repository
#[derive(Clone)]
pub struct PgPreferenceRepository {
    pool: PgPool,
}

impl PgPreferenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreferenceRepository for PgPreferenceRepository {
    async fn list_allergies(&self) -> Result<Vec<Allergy>> {
        let query = format!("SELECT {} FROM allergies ORDER BY name", ALLERGY_COLUMNS);
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        rows.iter().map(allergy_from_row).collect()
    }

    async fn find_allergy(&self, id: Uuid) -> Result<Option<Allergy>> {
        let query = format!("SELECT {} FROM allergies WHERE id = $1", ALLERGY_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(allergy_from_row).transpose()
    }

    async fn list_user_allergies(&self, user_id: Uuid) -> Result<Vec<UserAllergy>> {
        let query = format!(
            r#"
            SELECT ua.id, ua.user_id, ua.severity, ua.created_at, {}
            FROM user_allergies ua
            JOIN allergies a ON a.id = ua.allergy_id
            WHERE ua.user_id = $1
            ORDER BY a.name
            "#,
            JOINED_ALLERGY
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(user_allergy_from_row).collect()
    }

    async fn upsert_user_allergy(
        &self,
        user_id: Uuid,
        allergy_id: Uuid,
        severity: AllergySeverity,
    ) -> Result<UserAllergy> {
        let query = format!(
            r#"
            WITH ua AS (
                INSERT INTO user_allergies (id, user_id, allergy_id, severity)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (user_id, allergy_id) DO UPDATE SET severity = EXCLUDED.severity
                RETURNING id, user_id, allergy_id, severity, created_at
            )
            SELECT ua.id, ua.user_id, ua.severity, ua.created_at, {}
            FROM ua
            JOIN allergies a ON a.id = ua.allergy_id
            "#,
            JOINED_ALLERGY
        );
        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(allergy_id)
            .bind(severity.as_str())
            .fetch_one(&self.pool)
            .await?;

        user_allergy_from_row(&row)
    }

    async fn remove_user_allergy(&self, user_id: Uuid, allergy_id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM user_allergies WHERE user_id = $1 AND allergy_id = $2")
                .bind(user_id)
                .bind(allergy_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_specialties(&self) -> Result<Vec<FoodSpecialty>> {
        let query = format!(
            "SELECT {} FROM food_specialties ORDER BY name",
            SPECIALTY_COLUMNS
        );
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        rows.iter().map(specialty_from_row).collect()
    }

    async fn find_specialty(&self, id: Uuid) -> Result<Option<FoodSpecialty>> {
        let query = format!(
            "SELECT {} FROM food_specialties WHERE id = $1",
            SPECIALTY_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(specialty_from_row).transpose()
    }

    async fn list_host_specialties(&self, host_profile_id: Uuid) -> Result<Vec<HostSpecialty>> {
        let query = format!(
            r#"
            SELECT hs.id, hs.host_profile_id, hs.created_at, {}
            FROM host_food_specialties hs
            JOIN food_specialties s ON s.id = hs.specialty_id
            WHERE hs.host_profile_id = $1
            ORDER BY s.name
            "#,
            JOINED_SPECIALTY
        );
        let rows = sqlx::query(&query)
            .bind(host_profile_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(host_specialty_from_row).collect()
    }

    async fn add_host_specialty(
        &self,
        host_profile_id: Uuid,
        specialty_id: Uuid,
    ) -> Result<HostSpecialty> {
        // The no-op update lets RETURNING yield the existing row
        let query = format!(
            r#"
            WITH hs AS (
                INSERT INTO host_food_specialties (id, host_profile_id, specialty_id)
                VALUES ($1, $2, $3)
                ON CONFLICT (host_profile_id, specialty_id)
                    DO UPDATE SET specialty_id = EXCLUDED.specialty_id
                RETURNING id, host_profile_id, specialty_id, created_at
            )
            SELECT hs.id, hs.host_profile_id, hs.created_at, {}
            FROM hs
            JOIN food_specialties s ON s.id = hs.specialty_id
            "#,
            JOINED_SPECIALTY
        );
        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(host_profile_id)
            .bind(specialty_id)
            .fetch_one(&self.pool)
            .await?;

        host_specialty_from_row(&row)
    }

    async fn remove_host_specialty(
        &self,
        host_profile_id: Uuid,
        specialty_id: Uuid,
    ) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM host_food_specialties WHERE host_profile_id = $1 AND specialty_id = $2",
        )
        .bind(host_profile_id)
        .bind(specialty_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_dishwasher_preferences(
        &self,
        dishwasher_profile_id: Uuid,
    ) -> Result<Vec<FoodPreference>> {
        let query = format!(
            r#"
            SELECT fp.id, fp.dishwasher_profile_id, fp.preference_level, fp.created_at, {}
            FROM dishwasher_food_preferences fp
            JOIN food_specialties s ON s.id = fp.specialty_id
            WHERE fp.dishwasher_profile_id = $1
            ORDER BY s.name
            "#,
            JOINED_SPECIALTY
        );
        let rows = sqlx::query(&query)
            .bind(dishwasher_profile_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(preference_from_row).collect()
    }

    async fn upsert_dishwasher_preference(
        &self,
        dishwasher_profile_id: Uuid,
        specialty_id: Uuid,
        level: PreferenceLevel,
    ) -> Result<FoodPreference> {
        let query = format!(
            r#"
            WITH fp AS (
                INSERT INTO dishwasher_food_preferences
                    (id, dishwasher_profile_id, specialty_id, preference_level)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (dishwasher_profile_id, specialty_id)
                    DO UPDATE SET preference_level = EXCLUDED.preference_level
                RETURNING id, dishwasher_profile_id, specialty_id, preference_level, created_at
            )
            SELECT fp.id, fp.dishwasher_profile_id, fp.preference_level, fp.created_at, {}
            FROM fp
            JOIN food_specialties s ON s.id = fp.specialty_id
            "#,
            JOINED_SPECIALTY
        );
        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(dishwasher_profile_id)
            .bind(specialty_id)
            .bind(level.as_str())
            .fetch_one(&self.pool)
            .await?;

        preference_from_row(&row)
    }

    async fn remove_dishwasher_preference(
        &self,
        dishwasher_profile_id: Uuid,
        specialty_id: Uuid,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM dishwasher_food_preferences
            WHERE dishwasher_profile_id = $1 AND specialty_id = $2
            "#,
        )
        .bind(dishwasher_profile_id)
        .bind(specialty_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
