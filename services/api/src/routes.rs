//! API service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::ApiResult,
    middleware::{AuthUser, auth_middleware},
    models::{
        ActionResponse,
        matches::{CreateMatchRequest, UpdateMatchStatusRequest},
        message::SendMessageRequest,
        notification::MarkAllReadResponse,
        photo::{
            FlagPhotoRequest, ModeratePhotoRequest, UploadPhotoRequest, UploadProfilePhotoRequest,
        },
        preference::{AddAllergyRequest, AddPreferenceRequest, AddSpecialtyRequest},
        profile::{
            CreateDishwasherProfileRequest, CreateHostProfileRequest,
            UpdateDishwasherProfileRequest, UpdateHostProfileRequest,
        },
        rating::CreateRatingRequest,
        session::{
            CreateSessionRequest, FindMatchesQuery, RecordDurationRequest, UpdateStatusRequest,
        },
        user::UpdateUserRequest,
    },
    state::AppState,
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/mine", get(my_sessions))
        .route("/sessions/hosting", get(hosting_sessions))
        .route("/sessions/washing", get(washing_sessions))
        .route("/sessions/matches", get(find_matches))
        .route("/sessions/:id/apply", post(apply_for_session))
        .route("/sessions/:id/confirm", post(confirm_session))
        .route("/sessions/:id/status", post(update_session_status))
        .route("/sessions/:id/duration", post(record_session_duration))
        .route("/sessions/:id/messages", get(session_messages))
        .route("/sessions/:id/photos", post(upload_photo))
        .route("/ratings", post(create_rating))
        .route("/notifications", get(my_notifications))
        .route("/notifications/read-all", post(mark_all_notifications_read))
        .route("/notifications/:id/read", post(mark_notification_read))
        .route("/messages", post(send_message))
        .route("/messages/:id/read", post(mark_message_read))
        .route("/conversations", get(conversations))
        .route("/conversations/:id", get(conversation))
        .route("/matches", post(create_match))
        .route("/matches/mine", get(my_matches))
        .route("/matches/:id/status", post(update_match_status))
        .route("/me", get(me).patch(update_me))
        .route(
            "/profiles/host",
            post(create_host_profile)
                .get(host_profile)
                .patch(update_host_profile),
        )
        .route(
            "/profiles/dishwasher",
            post(create_dishwasher_profile)
                .get(dishwasher_profile)
                .patch(update_dishwasher_profile),
        )
        .route("/me/photos", post(upload_profile_photo).get(my_profile_photos))
        .route("/me/photos/:id", delete(delete_profile_photo))
        .route("/me/photos/:id/primary", post(set_primary_profile_photo))
        .route("/allergies/mine", get(my_allergies).post(add_allergy))
        .route("/allergies/mine/:id", delete(remove_allergy))
        .route(
            "/specialties/host",
            get(host_specialties).post(add_host_specialty),
        )
        .route("/specialties/host/:id", delete(remove_host_specialty))
        .route(
            "/specialties/preferences",
            get(dishwasher_preferences).post(add_dishwasher_preference),
        )
        .route(
            "/specialties/preferences/:id",
            delete(remove_dishwasher_preference),
        )
        .route("/photos/:id/flag", post(flag_photo))
        .route("/admin/photos/flagged", get(flagged_photos))
        .route("/admin/photos/:id/moderate", post(moderate_photo))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/sessions/open", get(open_sessions))
        .route("/sessions/:id", get(get_session))
        .route("/sessions/:id/matches", get(session_matches))
        .route("/sessions/:id/photos", get(session_photos))
        .route("/users/:id/ratings", get(user_ratings))
        .route("/users/:id/profile", get(public_profile))
        .route("/allergies", get(allergies))
        .route("/specialties", get(specialties))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let database = common::database::health_check(&state.db_pool).await?;

    Ok(Json(json!({
        "status": if database { "ok" } else { "degraded" },
        "service": "dishswap-api"
    })))
}

// Sessions

pub async fn create_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateSessionRequest>,
) -> ApiResult<impl IntoResponse> {
    let session = state.lifecycle.create_session(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Get a session by ID; `null` when it does not exist
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.lifecycle.get_session(id).await?))
}

pub async fn open_sessions(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.lifecycle.open_sessions().await?))
}

pub async fn my_sessions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.lifecycle.my_sessions(user.id).await?))
}

pub async fn hosting_sessions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.lifecycle.hosted_sessions(user.id).await?))
}

pub async fn washing_sessions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.lifecycle.washing_sessions(user.id).await?))
}

pub async fn find_matches(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<FindMatchesQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.lifecycle.find_matches(user.id, &query).await?))
}

pub async fn apply_for_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.lifecycle.apply_for_session(&user, id).await?;
    Ok(Json(ActionResponse::ok()))
}

pub async fn confirm_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.lifecycle.confirm_session(user.id, id).await?;
    Ok(Json(ActionResponse::ok()))
}

pub async fn update_session_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .lifecycle
        .update_status(user.id, id, payload.status)
        .await?;
    Ok(Json(ActionResponse::ok()))
}

pub async fn record_session_duration(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordDurationRequest>,
) -> ApiResult<impl IntoResponse> {
    let session = state
        .lifecycle
        .record_actual_duration(user.id, id, payload.actual_duration_minutes)
        .await?;
    Ok(Json(session))
}

// Ratings

pub async fn create_rating(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateRatingRequest>,
) -> ApiResult<impl IntoResponse> {
    let rating = state.ratings.create_rating(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(rating)))
}

pub async fn user_ratings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.ratings.ratings_for_user(id).await?))
}

// Notifications

pub async fn my_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.notifications.my_notifications(user.id).await?))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.notifications.mark_as_read(user.id, id).await?;
    Ok(Json(ActionResponse::ok()))
}

pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let count = state.notifications.mark_all_as_read(user.id).await?;
    Ok(Json(MarkAllReadResponse {
        success: true,
        count,
    }))
}

// Messages

pub async fn send_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let message = state.messaging.send(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn session_messages(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.messaging.session_messages(user.id, id).await?))
}

pub async fn mark_message_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.messaging.mark_as_read(user.id, id).await?;
    Ok(Json(ActionResponse::ok()))
}

pub async fn conversations(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.messaging.conversations(user.id).await?))
}

/// Full thread with another user, oldest first
pub async fn conversation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(other_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.messaging.conversation(user.id, other_id).await?))
}

// Matches

pub async fn create_match(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateMatchRequest>,
) -> ApiResult<impl IntoResponse> {
    let created = state.matches.create(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn session_matches(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.matches.for_session(id).await?))
}

pub async fn my_matches(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.matches.mine(user.id).await?))
}

pub async fn update_match_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMatchStatusRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        state
            .matches
            .update_status(&user, id, payload.status)
            .await?,
    ))
}

// Users and profiles

pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.profiles.me(user.id).await?))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.profiles.update_me(user.id, payload).await?))
}

pub async fn create_host_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateHostProfileRequest>,
) -> ApiResult<impl IntoResponse> {
    let profile = state.profiles.create_host_profile(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn host_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.profiles.host_profile(user.id).await?))
}

pub async fn update_host_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateHostProfileRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        state.profiles.update_host_profile(user.id, payload).await?,
    ))
}

pub async fn create_dishwasher_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateDishwasherProfileRequest>,
) -> ApiResult<impl IntoResponse> {
    let profile = state
        .profiles
        .create_dishwasher_profile(user.id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn dishwasher_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.profiles.dishwasher_profile(user.id).await?))
}

pub async fn update_dishwasher_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateDishwasherProfileRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        state
            .profiles
            .update_dishwasher_profile(user.id, payload)
            .await?,
    ))
}

/// Public profile with statistics, badges and recent reviews
pub async fn public_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.profiles.public_profile(id).await?))
}

// Profile photos

pub async fn upload_profile_photo(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UploadProfilePhotoRequest>,
) -> ApiResult<impl IntoResponse> {
    let photo = state.profile_photos.upload(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(photo)))
}

pub async fn my_profile_photos(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.profile_photos.photos(user.id).await?))
}

pub async fn delete_profile_photo(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.profile_photos.delete(user.id, id).await?;
    Ok(Json(ActionResponse::ok()))
}

pub async fn set_primary_profile_photo(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.profile_photos.set_primary(user.id, id).await?))
}

// Allergies and food specialties

pub async fn allergies(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.preferences.allergies().await?))
}

pub async fn my_allergies(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.preferences.my_allergies(user.id).await?))
}

pub async fn add_allergy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<AddAllergyRequest>,
) -> ApiResult<impl IntoResponse> {
    let allergy = state.preferences.add_allergy(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(allergy)))
}

pub async fn remove_allergy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.preferences.remove_allergy(user.id, id).await?;
    Ok(Json(ActionResponse::ok()))
}

pub async fn specialties(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.preferences.specialties().await?))
}

pub async fn host_specialties(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.preferences.host_specialties(user.id).await?))
}

pub async fn add_host_specialty(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<AddSpecialtyRequest>,
) -> ApiResult<impl IntoResponse> {
    let specialty = state
        .preferences
        .add_host_specialty(user.id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(specialty)))
}

pub async fn remove_host_specialty(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.preferences.remove_host_specialty(user.id, id).await?;
    Ok(Json(ActionResponse::ok()))
}

pub async fn dishwasher_preferences(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.preferences.dishwasher_preferences(user.id).await?))
}

pub async fn add_dishwasher_preference(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<AddPreferenceRequest>,
) -> ApiResult<impl IntoResponse> {
    let preference = state
        .preferences
        .add_dishwasher_preference(user.id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(preference)))
}

pub async fn remove_dishwasher_preference(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state
        .preferences
        .remove_dishwasher_preference(user.id, id)
        .await?;
    Ok(Json(ActionResponse::ok()))
}

// Photos

pub async fn upload_photo(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UploadPhotoRequest>,
) -> ApiResult<impl IntoResponse> {
    let photo = state.photos.upload(user.id, id, payload).await?;
    Ok((StatusCode::CREATED, Json(photo)))
}

pub async fn session_photos(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.photos.session_photos(id).await?))
}

pub async fn flag_photo(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FlagPhotoRequest>,
) -> ApiResult<impl IntoResponse> {
    let flag = state.photos.flag(user.id, id, payload).await?;
    Ok((StatusCode::CREATED, Json(flag)))
}

pub async fn flagged_photos(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.photos.flagged_photos(&user).await?))
}

pub async fn moderate_photo(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ModeratePhotoRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        state.photos.moderate(&user, id, payload.action).await?,
    ))
}
