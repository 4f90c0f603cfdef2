//! Host and dishwasher profile models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::text_enum;

text_enum! {
    KitchenSize {
        Small => "small",
        Medium => "medium",
        Large => "large",
    }
}

impl Default for KitchenSize {
    fn default() -> Self {
        KitchenSize::Medium
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HostProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub typical_dish_count: i32,
    pub kitchen_size: KitchenSize,
    pub has_dishwasher_machine: bool,
    pub average_rating: i32,
    pub total_ratings: i32,
    pub total_sessions_hosted: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DishwasherProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub work_range_km: i32,
    pub experience_years: i32,
    pub availability_schedule: Option<Value>,
    pub is_available: bool,
    pub total_dishes_done: i32,
    pub average_rating: i32,
    pub total_ratings: i32,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateHostProfileRequest {
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    #[serde(default)]
    pub typical_dish_count: i32,
    #[serde(default)]
    pub kitchen_size: KitchenSize,
    #[serde(default)]
    pub has_dishwasher_machine: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateHostProfileRequest {
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub typical_dish_count: Option<i32>,
    pub kitchen_size: Option<KitchenSize>,
    pub has_dishwasher_machine: Option<bool>,
}

fn default_work_range_km() -> i32 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDishwasherProfileRequest {
    #[serde(default = "default_work_range_km")]
    pub work_range_km: i32,
    #[serde(default)]
    pub experience_years: i32,
    pub availability_schedule: Option<Value>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDishwasherProfileRequest {
    pub work_range_km: Option<i32>,
    pub experience_years: Option<i32>,
    pub availability_schedule: Option<Value>,
    pub is_available: Option<bool>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}
