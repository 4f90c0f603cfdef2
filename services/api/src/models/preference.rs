//! Allergies, food specialties and dishwasher food preferences

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::text_enum;

text_enum! {
    AllergySeverity {
        Mild => "mild",
        Moderate => "moderate",
        Severe => "severe",
    }
}

impl Default for AllergySeverity {
    fn default() -> Self {
        AllergySeverity::Moderate
    }
}

text_enum! {
    /// How much a dishwasher enjoys a kind of food
    PreferenceLevel {
        Love => "love",
        Like => "like",
        Neutral => "neutral",
    }
}

impl Default for PreferenceLevel {
    fn default() -> Self {
        PreferenceLevel::Like
    }
}

/// Catalogue entry
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Allergy {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserAllergy {
    pub id: Uuid,
    pub user_id: Uuid,
    pub allergy: Allergy,
    pub severity: AllergySeverity,
    pub created_at: DateTime<Utc>,
}

/// Catalogue entry
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FoodSpecialty {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A specialty a host cooks
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HostSpecialty {
    pub id: Uuid,
    pub host_profile_id: Uuid,
    pub specialty: FoodSpecialty,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FoodPreference {
    pub id: Uuid,
    pub dishwasher_profile_id: Uuid,
    pub specialty: FoodSpecialty,
    pub preference_level: PreferenceLevel,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddAllergyRequest {
    pub allergy_id: Uuid,
    #[serde(default)]
    pub severity: AllergySeverity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddSpecialtyRequest {
    pub specialty_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddPreferenceRequest {
    pub specialty_id: Uuid,
    #[serde(default)]
    pub preference_level: PreferenceLevel,
}
