//! Allergies, host food specialties and dishwasher food preferences

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        preference::{
            AddAllergyRequest, AddPreferenceRequest, AddSpecialtyRequest, Allergy, FoodPreference,
            FoodSpecialty, HostSpecialty, UserAllergy,
        },
        profile::{DishwasherProfile, HostProfile},
    },
    repositories::{PreferenceRepository, ProfileRepository},
};

#[derive(Clone)]
pub struct PreferenceService {
    preferences: Arc<dyn PreferenceRepository>,
    profiles: Arc<dyn ProfileRepository>,
}

impl PreferenceService {
    pub fn new(
        preferences: Arc<dyn PreferenceRepository>,
        profiles: Arc<dyn ProfileRepository>,
    ) -> Self {
        Self {
            preferences,
            profiles,
        }
    }

    pub async fn allergies(&self) -> ApiResult<Vec<Allergy>> {
        Ok(self.preferences.list_allergies().await?)
    }

    pub async fn my_allergies(&self, user_id: Uuid) -> ApiResult<Vec<UserAllergy>> {
        Ok(self.preferences.list_user_allergies(user_id).await?)
    }

    /// Add an allergy, or change the severity of one already listed
    pub async fn add_allergy(
        &self,
        user_id: Uuid,
        request: AddAllergyRequest,
    ) -> ApiResult<UserAllergy> {
        if self
            .preferences
            .find_allergy(request.allergy_id)
            .await?
            .is_none()
        {
            return Err(ApiError::not_found("Allergy not found"));
        }

        let allergy = self
            .preferences
            .upsert_user_allergy(user_id, request.allergy_id, request.severity)
            .await?;

        info!(
            "User {} lists allergy {} as {}",
            user_id, allergy.allergy.name, allergy.severity
        );
        Ok(allergy)
    }

    /// Removing an allergy that is not listed is a no-op
    pub async fn remove_allergy(&self, user_id: Uuid, allergy_id: Uuid) -> ApiResult<()> {
        self.preferences
            .remove_user_allergy(user_id, allergy_id)
            .await?;
        Ok(())
    }

    pub async fn specialties(&self) -> ApiResult<Vec<FoodSpecialty>> {
        Ok(self.preferences.list_specialties().await?)
    }

    pub async fn host_specialties(&self, user_id: Uuid) -> ApiResult<Vec<HostSpecialty>> {
        let host = self.require_host(user_id).await?;
        Ok(self.preferences.list_host_specialties(host.id).await?)
    }

    pub async fn add_host_specialty(
        &self,
        user_id: Uuid,
        request: AddSpecialtyRequest,
    ) -> ApiResult<HostSpecialty> {
        let host = self.require_host(user_id).await?;
        self.require_specialty(request.specialty_id).await?;

        Ok(self
            .preferences
            .add_host_specialty(host.id, request.specialty_id)
            .await?)
    }

    pub async fn remove_host_specialty(&self, user_id: Uuid, specialty_id: Uuid) -> ApiResult<()> {
        let host = self.require_host(user_id).await?;
        self.preferences
            .remove_host_specialty(host.id, specialty_id)
            .await?;
        Ok(())
    }

    pub async fn dishwasher_preferences(&self, user_id: Uuid) -> ApiResult<Vec<FoodPreference>> {
        let dishwasher = self.require_dishwasher(user_id).await?;
        Ok(self
            .preferences
            .list_dishwasher_preferences(dishwasher.id)
            .await?)
    }

    /// Add a preference, or change the level of one already listed
    pub async fn add_dishwasher_preference(
        &self,
        user_id: Uuid,
        request: AddPreferenceRequest,
    ) -> ApiResult<FoodPreference> {
        let dishwasher = self.require_dishwasher(user_id).await?;
        self.require_specialty(request.specialty_id).await?;

        Ok(self
            .preferences
            .upsert_dishwasher_preference(
                dishwasher.id,
                request.specialty_id,
                request.preference_level,
            )
            .await?)
    }

    pub async fn remove_dishwasher_preference(
        &self,
        user_id: Uuid,
        specialty_id: Uuid,
    ) -> ApiResult<()> {
        let dishwasher = self.require_dishwasher(user_id).await?;
        self.preferences
            .remove_dishwasher_preference(dishwasher.id, specialty_id)
            .await?;
        Ok(())
    }

    async fn require_host(&self, user_id: Uuid) -> ApiResult<HostProfile> {
        self.profiles
            .find_host(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Host profile not found"))
    }

    async fn require_dishwasher(&self, user_id: Uuid) -> ApiResult<DishwasherProfile> {
        self.profiles
            .find_dishwasher(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Dishwasher profile not found"))
    }

    async fn require_specialty(&self, id: Uuid) -> ApiResult<FoodSpecialty> {
        self.preferences
            .find_specialty(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Food specialty not found"))
    }
}
