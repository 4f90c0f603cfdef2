use anyhow::Result;
use aws_config::BehaviorVersion;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod config;
mod error;
mod middleware;
mod models;
mod realtime;
mod repositories;
mod routes;
mod services;
mod state;
mod storage;
mod validation;

use common::{
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
    pubsub::{RedisConfig, RedisPool},
};
use tokio::net::TcpListener;

use crate::{
    config::Settings,
    middleware::{JwtConfig, JwtVerifier},
    realtime::{EventPublisher, NoopPublisher, RedisPublisher},
    repositories::{
        PgMatchRepository, PgMessageRepository, PgNotificationRepository, PgPhotoRepository,
        PgPreferenceRepository, PgProfilePhotoRepository, PgProfileRepository,
        PgRatingRepository, PgSessionRepository, PgUserRepository,
    },
    services::{
        lifecycle::{LifecycleService, TransitionPolicy},
        matches::MatchService,
        messaging::MessagingService,
        notifications::{NotificationService, Notifier},
        photos::PhotoService,
        preferences::PreferenceService,
        profile_photos::ProfilePhotoService,
        profiles::ProfileService,
        ratings::RatingService,
    },
    state::AppState,
    storage::S3PhotoStorage,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting DishSwap API service");

    let settings = Settings::load()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool).await?;

    let publisher: Arc<dyn EventPublisher> = if settings.realtime.enabled {
        let redis = RedisPool::new(&RedisConfig::from_env()?).await?;
        if !redis.health_check().await? {
            anyhow::bail!("Failed to connect to Redis");
        }
        Arc::new(RedisPublisher::new(redis, settings.realtime.channel_prefix.clone()))
    } else {
        info!("Real-time push disabled");
        Arc::new(NoopPublisher)
    };

    let aws_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let storage = Arc::new(S3PhotoStorage::new(
        aws_sdk_s3::Client::new(&aws_config),
        settings.storage.bucket.clone(),
        settings.storage.public_base_url.clone(),
    ));

    let jwt = JwtVerifier::new(&JwtConfig::from_env()?)?;

    // Initialize repositories
    let users = Arc::new(PgUserRepository::new(pool.clone()));
    let sessions = Arc::new(PgSessionRepository::new(pool.clone()));
    let ratings = Arc::new(PgRatingRepository::new(pool.clone()));
    let profiles = Arc::new(PgProfileRepository::new(pool.clone()));
    let notifications = Arc::new(PgNotificationRepository::new(pool.clone()));
    let messages = Arc::new(PgMessageRepository::new(pool.clone()));
    let matches = Arc::new(PgMatchRepository::new(pool.clone()));
    let photos = Arc::new(PgPhotoRepository::new(pool.clone()));
    let profile_photos = Arc::new(PgProfilePhotoRepository::new(pool.clone()));
    let preferences = Arc::new(PgPreferenceRepository::new(pool.clone()));

    let notifier = Notifier::new(notifications.clone(), publisher);
    let policy = TransitionPolicy::from_strict(settings.lifecycle.strict_transitions);
    let lifecycle = LifecycleService::new(
        sessions.clone(),
        profiles.clone(),
        notifier.clone(),
        policy,
    );

    let app_state = AppState {
        db_pool: pool.clone(),
        jwt,
        ratings: RatingService::new(ratings.clone(), sessions.clone(), profiles.clone()),
        notifications: NotificationService::new(notifications),
        messaging: MessagingService::new(messages, sessions.clone(), notifier.clone()),
        matches: MatchService::new(matches, sessions.clone(), lifecycle.clone(), notifier.clone()),
        profiles: ProfileService::new(
            users,
            profiles.clone(),
            sessions.clone(),
            ratings,
            photos.clone(),
            profile_photos.clone(),
        ),
        photos: PhotoService::new(
            photos,
            sessions,
            storage.clone(),
            notifier,
            settings.moderation.auto_hide_threshold,
        ),
        profile_photos: ProfilePhotoService::new(profile_photos, storage),
        preferences: PreferenceService::new(preferences, profiles),
        lifecycle,
    };

    info!("API service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let address = settings.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("API service listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("API service stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
