//! Application state shared across handlers

use sqlx::PgPool;

use crate::{
    middleware::JwtVerifier,
    services::{
        lifecycle::LifecycleService, matches::MatchService, messaging::MessagingService,
        notifications::NotificationService, photos::PhotoService, preferences::PreferenceService,
        profile_photos::ProfilePhotoService, profiles::ProfileService, ratings::RatingService,
    },
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt: JwtVerifier,
    pub lifecycle: LifecycleService,
    pub ratings: RatingService,
    pub notifications: NotificationService,
    pub messaging: MessagingService,
    pub matches: MatchService,
    pub profiles: ProfileService,
    pub photos: PhotoService,
    pub profile_photos: ProfilePhotoService,
    pub preferences: PreferenceService,
}
