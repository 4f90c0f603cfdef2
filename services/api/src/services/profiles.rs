//! Account fields, host and dishwasher profiles, and public profiles

use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        profile::{
            CreateDishwasherProfileRequest, CreateHostProfileRequest, DishwasherProfile,
            HostProfile, UpdateDishwasherProfileRequest, UpdateHostProfileRequest,
        },
        rating::RatingSummary,
        session::{Session, SessionStatus},
        user::{PublicProfile, UpdateUserRequest, User, UserStatistics},
    },
    repositories::{
        PhotoRepository, ProfilePhotoRepository, ProfileRepository, RatingRepository,
        SessionRepository, UserRepository,
    },
    services::badges::calculate_badges,
    validation::validate_phone,
};

const RECENT_SESSIONS: usize = 6;
const RECENT_REVIEWS: usize = 10;
const SESSION_PHOTOS: i64 = 20;

fn validate_work_range(work_range_km: i32) -> ApiResult<()> {
    if work_range_km < 1 {
        return Err(ApiError::bad_request("Work range must be at least 1 km"));
    }
    Ok(())
}

fn validate_experience(experience_years: i32) -> ApiResult<()> {
    if experience_years < 0 {
        return Err(ApiError::bad_request("Experience cannot be negative"));
    }
    Ok(())
}

#[derive(Clone)]
pub struct ProfileService {
    users: Arc<dyn UserRepository>,
    profiles: Arc<dyn ProfileRepository>,
    sessions: Arc<dyn SessionRepository>,
    ratings: Arc<dyn RatingRepository>,
    photos: Arc<dyn PhotoRepository>,
    profile_photos: Arc<dyn ProfilePhotoRepository>,
}

impl ProfileService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        profiles: Arc<dyn ProfileRepository>,
        sessions: Arc<dyn SessionRepository>,
        ratings: Arc<dyn RatingRepository>,
        photos: Arc<dyn PhotoRepository>,
        profile_photos: Arc<dyn ProfilePhotoRepository>,
    ) -> Self {
        Self {
            users,
            profiles,
            sessions,
            ratings,
            photos,
            profile_photos,
        }
    }

    pub async fn me(&self, user_id: Uuid) -> ApiResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))
    }

    pub async fn update_me(&self, user_id: Uuid, request: UpdateUserRequest) -> ApiResult<User> {
        if let Some(phone) = &request.phone {
            validate_phone(phone).map_err(ApiError::BadRequest)?;
        }

        self.users
            .update_profile(user_id, &request)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))
    }

    pub async fn create_host_profile(
        &self,
        user_id: Uuid,
        request: CreateHostProfileRequest,
    ) -> ApiResult<HostProfile> {
        let profile = self
            .profiles
            .create_host(user_id, &request)
            .await?
            .ok_or_else(|| ApiError::bad_request("Host profile already exists"))?;

        info!("Host profile created for {}", user_id);
        Ok(profile)
    }

    pub async fn host_profile(&self, user_id: Uuid) -> ApiResult<HostProfile> {
        self.profiles
            .find_host(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Host profile not found"))
    }

    pub async fn update_host_profile(
        &self,
        user_id: Uuid,
        request: UpdateHostProfileRequest,
    ) -> ApiResult<HostProfile> {
        self.profiles
            .update_host(user_id, &request)
            .await?
            .ok_or_else(|| ApiError::not_found("Host profile not found"))
    }

    pub async fn create_dishwasher_profile(
        &self,
        user_id: Uuid,
        request: CreateDishwasherProfileRequest,
    ) -> ApiResult<DishwasherProfile> {
        validate_work_range(request.work_range_km)?;
        validate_experience(request.experience_years)?;

        let profile = self
            .profiles
            .create_dishwasher(user_id, &request)
            .await?
            .ok_or_else(|| ApiError::bad_request("Dishwasher profile already exists"))?;

        info!("Dishwasher profile created for {}", user_id);
        Ok(profile)
    }

    pub async fn dishwasher_profile(&self, user_id: Uuid) -> ApiResult<DishwasherProfile> {
        self.profiles
            .find_dishwasher(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Dishwasher profile not found"))
    }

    pub async fn update_dishwasher_profile(
        &self,
        user_id: Uuid,
        request: UpdateDishwasherProfileRequest,
    ) -> ApiResult<DishwasherProfile> {
        if let Some(work_range_km) = request.work_range_km {
            validate_work_range(work_range_km)?;
        }
        if let Some(experience_years) = request.experience_years {
            validate_experience(experience_years)?;
        }

        self.profiles
            .update_dishwasher(user_id, &request)
            .await?
            .ok_or_else(|| ApiError::not_found("Dishwasher profile not found"))
    }

    pub async fn public_profile(&self, user_id: Uuid) -> ApiResult<PublicProfile> {
        let user = self.me(user_id).await?;
        let host_profile = self.profiles.find_host(user_id).await?;
        let dishwasher_profile = self.profiles.find_dishwasher(user_id).await?;
        let hosted = self.sessions.list_by_host(user_id).await?;
        let washed = self.sessions.list_by_dishwasher(user_id).await?;
        let mut reviews = self.ratings.list_for_rated(user_id).await?;
        let profile_photos = self.profile_photos.list_for_user(user_id).await?;
        let session_photos = self
            .photos
            .list_visible_for_participant(user_id, SESSION_PHOTOS)
            .await?;

        let completed = |s: &&Session| s.status == SessionStatus::Completed;
        let statistics = UserStatistics {
            total_sessions_hosted: hosted.len() as u32,
            total_sessions_washed: washed.len() as u32,
            completed_sessions_hosted: hosted.iter().filter(completed).count() as u32,
            completed_sessions_washed: washed.iter().filter(completed).count() as u32,
            total_ratings: reviews.len() as u32,
            average_rating: RatingSummary::from_ratings(&reviews)
                .map(|summary| summary.mean())
                .unwrap_or(0.0),
        };

        let badges = calculate_badges(&statistics, user.email_verified, user.created_at, Utc::now());
        let recent_sessions = hosted
            .into_iter()
            .filter(|s| s.status == SessionStatus::Completed)
            .take(RECENT_SESSIONS)
            .collect();
        reviews.truncate(RECENT_REVIEWS);

        Ok(PublicProfile {
            user: user.into(),
            host_profile,
            dishwasher_profile,
            statistics,
            badges,
            recent_sessions,
            reviews,
            profile_photos,
            session_photos,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            photo::{FlagReason, NewPhotoFlag, NewProfilePhoto, NewSessionPhoto},
            profile::KitchenSize,
            rating::NewRating,
            session::NewSession,
        },
        repositories::memory::MemoryRepository,
    };

    fn service(store: &MemoryRepository) -> ProfileService {
        ProfileService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
        )
    }

    fn host_request() -> CreateHostProfileRequest {
        CreateHostProfileRequest {
            address_line1: "10 Rue de la Paix".to_string(),
            address_line2: None,
            city: "Paris".to_string(),
            state: "IDF".to_string(),
            postal_code: "75002".to_string(),
            country: "FR".to_string(),
            latitude: Some("48.8686".to_string()),
            longitude: Some("2.3316".to_string()),
            typical_dish_count: 20,
            kitchen_size: KitchenSize::Medium,
            has_dishwasher_machine: true,
        }
    }

    fn dishwasher_request(work_range_km: i32) -> CreateDishwasherProfileRequest {
        CreateDishwasherProfileRequest {
            work_range_km,
            experience_years: 1,
            availability_schedule: None,
            latitude: None,
            longitude: None,
            city: Some("Paris".to_string()),
            state: None,
            country: None,
        }
    }

    #[tokio::test]
    async fn test_update_me_validates_phone() {
        let store = MemoryRepository::new();
        let service = service(&store);
        let user = store.add_user("Hana").await;

        let err = service
            .update_me(
                user.id,
                UpdateUserRequest {
                    phone: Some("phone?".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let updated = service
            .update_me(
                user.id,
                UpdateUserRequest {
                    phone: Some("+33 1 23 45 67 89".to_string()),
                    bio: Some("Cooks for twelve".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.phone.as_deref(), Some("+33 1 23 45 67 89"));
        assert_eq!(service.me(user.id).await.unwrap().bio, updated.bio);

        let err = service.me(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_host_profile_lifecycle() {
        let store = MemoryRepository::new();
        let service = service(&store);
        let user = store.add_user("Hana").await;

        let err = service.host_profile(user.id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        service
            .create_host_profile(user.id, host_request())
            .await
            .unwrap();
        let err = service
            .create_host_profile(user.id, host_request())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Bad request: Host profile already exists");

        let updated = service
            .update_host_profile(
                user.id,
                UpdateHostProfileRequest {
                    kitchen_size: Some(KitchenSize::Large),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.kitchen_size, KitchenSize::Large);
        assert_eq!(updated.city, "Paris");
    }

    #[tokio::test]
    async fn test_dishwasher_profile_validation() {
        let store = MemoryRepository::new();
        let service = service(&store);
        let user = store.add_user("Dario").await;

        let err = service
            .create_dishwasher_profile(user.id, dishwasher_request(0))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let profile = service
            .create_dishwasher_profile(user.id, dishwasher_request(15))
            .await
            .unwrap();
        assert!(profile.is_available);

        let err = service
            .update_dishwasher_profile(
                user.id,
                UpdateDishwasherProfileRequest {
                    experience_years: Some(-1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let updated = service
            .update_dishwasher_profile(
                user.id,
                UpdateDishwasherProfileRequest {
                    is_available: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!updated.is_available);
        assert_eq!(updated.work_range_km, 15);
    }

    #[tokio::test]
    async fn test_public_profile_statistics() {
        let store = MemoryRepository::new();
        let service = service(&store);
        let host = store.add_user("Hana").await;
        let washer = store.add_user("Dario").await;
        let sessions: Arc<dyn SessionRepository> = Arc::new(store.clone());
        let ratings: Arc<dyn RatingRepository> = Arc::new(store.clone());

        for (i, status) in [
            SessionStatus::Completed,
            SessionStatus::Completed,
            SessionStatus::Cancelled,
        ]
        .into_iter()
        .enumerate()
        {
            let session = sessions
                .create(&NewSession {
                    host_id: host.id,
                    scheduled_date: Utc::now() - chrono::Duration::days(i as i64 + 1),
                    estimated_duration_minutes: 60,
                    dish_count: None,
                    meal_description: None,
                    special_instructions: None,
                })
                .await
                .unwrap();
            sessions
                .claim_open(session.id, washer.id, Utc::now())
                .await
                .unwrap();
            store.set_session_status(session.id, status).await;

            ratings
                .insert(&NewRating {
                    session_id: session.id,
                    rater_id: washer.id,
                    rated_id: host.id,
                    rating: 4 + (i as i32 % 2),
                    review_text: None,
                    punctuality_rating: None,
                    quality_rating: None,
                    friendliness_rating: None,
                    would_recommend: true,
                })
                .await
                .unwrap();
        }

        let profile = service.public_profile(host.id).await.unwrap();
        assert_eq!(profile.statistics.total_sessions_hosted, 3);
        assert_eq!(profile.statistics.completed_sessions_hosted, 2);
        assert_eq!(profile.statistics.total_sessions_washed, 0);
        assert_eq!(profile.statistics.total_ratings, 3);
        // 4, 5, 4 -> 4.33
        assert_eq!(profile.statistics.average_rating, 4.33);
        assert_eq!(profile.recent_sessions.len(), 2);
        assert_eq!(profile.reviews.len(), 3);
        assert!(profile.host_profile.is_none());

        let washer_profile = service.public_profile(washer.id).await.unwrap();
        assert_eq!(washer_profile.statistics.completed_sessions_washed, 2);
    }

    #[tokio::test]
    async fn test_public_profile_photos() {
        let store = MemoryRepository::new();
        let service = service(&store);
        let host = store.add_user("Hana").await;
        let washer = store.add_user("Dario").await;
        let stranger = store.add_user("Sam").await;
        let sessions: Arc<dyn SessionRepository> = Arc::new(store.clone());
        let photos: Arc<dyn PhotoRepository> = Arc::new(store.clone());
        let profile_photos: Arc<dyn ProfilePhotoRepository> = Arc::new(store.clone());

        let session = sessions
            .create(&NewSession {
                host_id: host.id,
                scheduled_date: Utc::now(),
                estimated_duration_minutes: 60,
                dish_count: None,
                meal_description: None,
                special_instructions: None,
            })
            .await
            .unwrap();
        sessions
            .claim_open(session.id, washer.id, Utc::now())
            .await
            .unwrap();

        let mut uploaded = Vec::new();
        for caption in ["before", "after"] {
            let photo = photos
                .create(&NewSessionPhoto {
                    session_id: session.id,
                    user_id: washer.id,
                    photo_url: format!("https://photos.test/{}.jpg", caption),
                    caption: Some(caption.to_string()),
                })
                .await
                .unwrap();
            uploaded.push(photo);
        }
        photos
            .record_flag(
                &NewPhotoFlag {
                    photo_id: uploaded[0].id,
                    reporter_id: stranger.id,
                    reason: FlagReason::Spam,
                    description: None,
                },
                1,
            )
            .await
            .unwrap()
            .unwrap();

        profile_photos
            .create(&NewProfilePhoto {
                user_id: host.id,
                photo_url: "https://photos.test/hana.jpg".to_string(),
                is_primary: true,
            })
            .await
            .unwrap();

        let profile = service.public_profile(host.id).await.unwrap();
        assert_eq!(
            profile.session_photos.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![uploaded[1].id]
        );
        assert_eq!(profile.profile_photos.len(), 1);
        assert!(profile.profile_photos[0].is_primary);

        let washer_profile = service.public_profile(washer.id).await.unwrap();
        assert_eq!(washer_profile.session_photos.len(), 1);
        assert!(washer_profile.profile_photos.is_empty());

        let stranger_profile = service.public_profile(stranger.id).await.unwrap();
        assert!(stranger_profile.session_photos.is_empty());
    }
}
