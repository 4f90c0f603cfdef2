//! Host and dishwasher profile persistence

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::parse_column;
use crate::models::{
    profile::{
        CreateDishwasherProfileRequest, CreateHostProfileRequest, DishwasherProfile, HostProfile,
        UpdateDishwasherProfileRequest, UpdateHostProfileRequest,
    },
    rating::RatingSummary,
};

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// `None` if the user already has a host profile
    async fn create_host(
        &self,
        user_id: Uuid,
        request: &CreateHostProfileRequest,
    ) -> Result<Option<HostProfile>>;

    async fn find_host(&self, user_id: Uuid) -> Result<Option<HostProfile>>;

    async fn update_host(
        &self,
        user_id: Uuid,
        request: &UpdateHostProfileRequest,
    ) -> Result<Option<HostProfile>>;

    /// `None` if the user already has a dishwasher profile
    async fn create_dishwasher(
        &self,
        user_id: Uuid,
        request: &CreateDishwasherProfileRequest,
    ) -> Result<Option<DishwasherProfile>>;

    async fn find_dishwasher(&self, user_id: Uuid) -> Result<Option<DishwasherProfile>>;

    async fn update_dishwasher(
        &self,
        user_id: Uuid,
        request: &UpdateDishwasherProfileRequest,
    ) -> Result<Option<DishwasherProfile>>;

    /// Write the rating aggregate onto every profile the user has
    async fn set_rating_summary(&self, user_id: Uuid, summary: RatingSummary) -> Result<()>;
}

const HOST_COLUMNS: &str = "id, user_id, address_line1, address_line2, city, state, postal_code, \
     country, latitude, longitude, typical_dish_count, kitchen_size, has_dishwasher_machine, \
     average_rating, total_ratings, total_sessions_hosted, created_at, updated_at";

const DISHWASHER_COLUMNS: &str = "id, user_id, work_range_km, experience_years, \
     availability_schedule, is_available, total_dishes_done, average_rating, total_ratings, \
     latitude, longitude, city, state, country, created_at, updated_at";

fn host_from_row(row: &PgRow) -> Result<HostProfile> {
    Ok(HostProfile {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        address_line1: row.try_get("address_line1")?,
        address_line2: row.try_get("address_line2")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        postal_code: row.try_get("postal_code")?,
        country: row.try_get("country")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        typical_dish_count: row.try_get("typical_dish_count")?,
        kitchen_size: parse_column(row, "kitchen_size")?,
        has_dishwasher_machine: row.try_get("has_dishwasher_machine")?,
        average_rating: row.try_get("average_rating")?,
        total_ratings: row.try_get("total_ratings")?,
        total_sessions_hosted: row.try_get("total_sessions_hosted")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn dishwasher_from_row(row: &PgRow) -> Result<DishwasherProfile> {
    Ok(DishwasherProfile {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        work_range_km: row.try_get("work_range_km")?,
        experience_years: row.try_get("experience_years")?,
        availability_schedule: row.try_get("availability_schedule")?,
        is_available: row.try_get("is_available")?,
        total_dishes_done: row.try_get("total_dishes_done")?,
        average_rating: row.try_get("average_rating")?,
        total_ratings: row.try_get("total_ratings")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        country: row.try_get("country")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// PostgreSQL profile repository
#[derive(Clone)]
pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    async fn create_host(
        &self,
        user_id: Uuid,
        request: &CreateHostProfileRequest,
    ) -> Result<Option<HostProfile>> {
        let query = format!(
            r#"
            INSERT INTO host_profiles (id, user_id, address_line1, address_line2, city, state,
                                       postal_code, country, latitude, longitude,
                                       typical_dish_count, kitchen_size, has_dishwasher_machine)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (user_id) DO NOTHING
            RETURNING {}
            "#,
            HOST_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(&request.address_line1)
            .bind(&request.address_line2)
            .bind(&request.city)
            .bind(&request.state)
            .bind(&request.postal_code)
            .bind(&request.country)
            .bind(&request.latitude)
            .bind(&request.longitude)
            .bind(request.typical_dish_count)
            .bind(request.kitchen_size.as_str())
            .bind(request.has_dishwasher_machine)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(host_from_row).transpose()
    }

    async fn find_host(&self, user_id: Uuid) -> Result<Option<HostProfile>> {
        let query = format!("SELECT {} FROM host_profiles WHERE user_id = $1", HOST_COLUMNS);
        let row = sqlx::query(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(host_from_row).transpose()
    }

    async fn update_host(
        &self,
        user_id: Uuid,
        request: &UpdateHostProfileRequest,
    ) -> Result<Option<HostProfile>> {
        let query = format!(
            r#"
            UPDATE host_profiles
            SET address_line1 = COALESCE($2, address_line1),
                address_line2 = COALESCE($3, address_line2),
                city = COALESCE($4, city),
                state = COALESCE($5, state),
                postal_code = COALESCE($6, postal_code),
                country = COALESCE($7, country),
                latitude = COALESCE($8, latitude),
                longitude = COALESCE($9, longitude),
                typical_dish_count = COALESCE($10, typical_dish_count),
                kitchen_size = COALESCE($11, kitchen_size),
                has_dishwasher_machine = COALESCE($12, has_dishwasher_machine),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING {}
            "#,
            HOST_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(user_id)
            .bind(&request.address_line1)
            .bind(&request.address_line2)
            .bind(&request.city)
            .bind(&request.state)
            .bind(&request.postal_code)
            .bind(&request.country)
            .bind(&request.latitude)
            .bind(&request.longitude)
            .bind(request.typical_dish_count)
            .bind(request.kitchen_size.map(|size| size.as_str()))
            .bind(request.has_dishwasher_machine)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(host_from_row).transpose()
    }

    async fn create_dishwasher(
        &self,
        user_id: Uuid,
        request: &CreateDishwasherProfileRequest,
    ) -> Result<Option<DishwasherProfile>> {
        let query = format!(
            r#"
            INSERT INTO dishwasher_profiles (id, user_id, work_range_km, experience_years,
                                             availability_schedule, latitude, longitude,
                                             city, state, country)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (user_id) DO NOTHING
            RETURNING {}
            "#,
            DISHWASHER_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(request.work_range_km)
            .bind(request.experience_years)
            .bind(&request.availability_schedule)
            .bind(&request.latitude)
            .bind(&request.longitude)
            .bind(&request.city)
            .bind(&request.state)
            .bind(&request.country)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(dishwasher_from_row).transpose()
    }

    async fn find_dishwasher(&self, user_id: Uuid) -> Result<Option<DishwasherProfile>> {
        let query = format!(
            "SELECT {} FROM dishwasher_profiles WHERE user_id = $1",
            DISHWASHER_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(dishwasher_from_row).transpose()
    }

    async fn update_dishwasher(
        &self,
        user_id: Uuid,
        request: &UpdateDishwasherProfileRequest,
    ) -> Result<Option<DishwasherProfile>> {
        let query = format!(
            r#"
            UPDATE dishwasher_profiles
            SET work_range_km = COALESCE($2, work_range_km),
                experience_years = COALESCE($3, experience_years),
                availability_schedule = COALESCE($4, availability_schedule),
                is_available = COALESCE($5, is_available),
                latitude = COALESCE($6, latitude),
                longitude = COALESCE($7, longitude),
                city = COALESCE($8, city),
                state = COALESCE($9, state),
                country = COALESCE($10, country),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING {}
            "#,
            DISHWASHER_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(user_id)
            .bind(request.work_range_km)
            .bind(request.experience_years)
            .bind(&request.availability_schedule)
            .bind(request.is_available)
            .bind(&request.latitude)
            .bind(&request.longitude)
            .bind(&request.city)
            .bind(&request.state)
            .bind(&request.country)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(dishwasher_from_row).transpose()
    }

    async fn set_rating_summary(&self, user_id: Uuid, summary: RatingSummary) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for table in ["host_profiles", "dishwasher_profiles"] {
            let query = format!(
                "UPDATE {} SET average_rating = $2, total_ratings = $3, updated_at = NOW() \
                 WHERE user_id = $1",
                table
            );
            sqlx::query(&query)
                .bind(user_id)
                .bind(summary.average_rating)
                .bind(summary.total_ratings)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
