//! Session lifecycle: creation, applications, confirmation and status changes
//!
//! Every transition is a single guarded write in the store. When the write
//! does not happen, the session is read again only to pick the error.

use chrono::Utc;
use serde_json::json;
use std::{collections::HashMap, sync::Arc};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    models::{
        notification::{NewNotification, NotificationKind},
        session::{
            CreateSessionRequest, FindMatchesQuery, NewSession, Session, SessionStatus,
            StatusUpdate, TransitionGuard,
        },
    },
    realtime::{self, Channel, SESSION_UPDATE},
    repositories::{ProfileRepository, SessionRepository},
    services::notifications::Notifier,
    validation::{validate_actual_duration, validate_session_duration},
};

/// Which source states a participant status change may leave from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPolicy {
    /// Only the documented source states
    Strict,
    /// Any source state; in_progress and completed still need a dishwasher
    Permissive,
}

impl TransitionPolicy {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            TransitionPolicy::Strict
        } else {
            TransitionPolicy::Permissive
        }
    }

    pub fn guard(self, actor: Uuid, update: StatusUpdate) -> TransitionGuard {
        let allowed_from = match self {
            TransitionPolicy::Strict => update.strict_sources().to_vec(),
            TransitionPolicy::Permissive => SessionStatus::ALL.to_vec(),
        };

        TransitionGuard {
            actor,
            target: update.target(),
            allowed_from,
            requires_dishwasher: update.requires_dishwasher(),
        }
    }
}

#[derive(Clone)]
pub struct LifecycleService {
    sessions: Arc<dyn SessionRepository>,
    profiles: Arc<dyn ProfileRepository>,
    notifier: Notifier,
    policy: TransitionPolicy,
}

impl LifecycleService {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        profiles: Arc<dyn ProfileRepository>,
        notifier: Notifier,
        policy: TransitionPolicy,
    ) -> Self {
        Self {
            sessions,
            profiles,
            notifier,
            policy,
        }
    }

    pub async fn create_session(
        &self,
        host_id: Uuid,
        request: CreateSessionRequest,
    ) -> ApiResult<Session> {
        validate_session_duration(request.estimated_duration_minutes)
            .map_err(ApiError::BadRequest)?;
        if matches!(request.dish_count, Some(count) if count < 1) {
            return Err(ApiError::bad_request("Dish count must be at least 1"));
        }

        let session = self
            .sessions
            .create(&NewSession {
                host_id,
                scheduled_date: request.scheduled_date,
                estimated_duration_minutes: request.estimated_duration_minutes,
                dish_count: request.dish_count,
                meal_description: request.meal_description,
                special_instructions: request.special_instructions,
            })
            .await?;

        info!("Session {} created by host {}", session.id, host_id);
        Ok(session)
    }

    pub async fn get_session(&self, id: Uuid) -> ApiResult<Option<Session>> {
        Ok(self.sessions.find_by_id(id).await?)
    }

    pub async fn open_sessions(&self) -> ApiResult<Vec<Session>> {
        Ok(self.sessions.list_open().await?)
    }

    pub async fn hosted_sessions(&self, user_id: Uuid) -> ApiResult<Vec<Session>> {
        Ok(self.sessions.list_by_host(user_id).await?)
    }

    pub async fn washing_sessions(&self, user_id: Uuid) -> ApiResult<Vec<Session>> {
        Ok(self.sessions.list_by_dishwasher(user_id).await?)
    }

    pub async fn my_sessions(&self, user_id: Uuid) -> ApiResult<Vec<Session>> {
        Ok(self.sessions.list_for_participant(user_id).await?)
    }

    /// open -> matched for `dishwasher_id`
    async fn claim(&self, dishwasher_id: Uuid, session_id: Uuid) -> ApiResult<Session> {
        if let Some(session) = self
            .sessions
            .claim_open(session_id, dishwasher_id, Utc::now())
            .await?
        {
            info!(
                "Session {} matched with dishwasher {}",
                session.id, dishwasher_id
            );
            self.push_update(&session).await;
            return Ok(session);
        }

        let session = self.require_session(session_id).await?;
        if session.host_id == dishwasher_id && session.status == SessionStatus::Open {
            return Err(ApiError::bad_request("Cannot apply to your own session"));
        }
        Err(ApiError::bad_request("Session is not open for applications"))
    }

    pub async fn apply_for_session(
        &self,
        dishwasher: &AuthUser,
        session_id: Uuid,
    ) -> ApiResult<Session> {
        let session = self.claim(dishwasher.id, session_id).await?;

        let applicant = dishwasher.name.as_deref().unwrap_or("Someone");
        self.notifier
            .notify(
                NewNotification::new(
                    session.host_id,
                    NotificationKind::SessionApplication,
                    "New Application",
                    format!("{} applied for your dishwashing session", applicant),
                )
                .related_to(session.id),
            )
            .await;

        Ok(session)
    }

    pub async fn confirm_session(&self, host_id: Uuid, session_id: Uuid) -> ApiResult<Session> {
        let Some(session) = self
            .sessions
            .confirm_matched(session_id, host_id, Utc::now())
            .await?
        else {
            let session = self.require_session(session_id).await?;
            if session.host_id != host_id {
                return Err(ApiError::forbidden("Only host can confirm session"));
            }
            return Err(ApiError::bad_request("Session must be in matched status"));
        };

        info!("Session {} confirmed by host {}", session.id, host_id);

        if let Some(dishwasher_id) = session.dishwasher_id {
            self.notifier
                .notify(
                    NewNotification::new(
                        dishwasher_id,
                        NotificationKind::SessionConfirmed,
                        "Session Confirmed",
                        "Your dishwashing session has been confirmed!",
                    )
                    .related_to(session.id),
                )
                .await;
        }
        self.push_update(&session).await;

        Ok(session)
    }

    pub async fn update_status(
        &self,
        actor_id: Uuid,
        session_id: Uuid,
        update: StatusUpdate,
    ) -> ApiResult<Session> {
        let guard = self.policy.guard(actor_id, update);

        let Some(session) = self
            .sessions
            .transition(session_id, &guard, Utc::now())
            .await?
        else {
            let session = self.require_session(session_id).await?;
            if !session.is_participant(actor_id) {
                return Err(ApiError::forbidden("Not authorized to update this session"));
            }
            return Err(ApiError::bad_request(format!(
                "Cannot change session status from {} to {}",
                session.status, guard.target
            )));
        };

        info!(
            "Session {} moved to {} by {}",
            session.id, session.status, actor_id
        );

        if let Some(other) = session.counterpart_of(actor_id) {
            self.notifier
                .notify(
                    NewNotification::new(
                        other,
                        NotificationKind::SessionUpdate,
                        "Session Updated",
                        format!("Session status changed to {}", session.status),
                    )
                    .related_to(session.id),
                )
                .await;
        }
        self.push_update(&session).await;

        Ok(session)
    }

    /// Record how long the session took; participants only
    pub async fn record_actual_duration(
        &self,
        actor_id: Uuid,
        session_id: Uuid,
        minutes: i32,
    ) -> ApiResult<Session> {
        validate_actual_duration(minutes).map_err(ApiError::BadRequest)?;

        let Some(session) = self
            .sessions
            .record_actual_duration(session_id, actor_id, minutes, Utc::now())
            .await?
        else {
            self.require_session(session_id).await?;
            return Err(ApiError::forbidden("Not authorized to update this session"));
        };

        info!(
            "Session {} took {} minutes, recorded by {}",
            session.id, minutes, actor_id
        );
        Ok(session)
    }

    /// Open sessions a dishwasher could take, narrowed by the query
    pub async fn find_matches(
        &self,
        dishwasher_id: Uuid,
        query: &FindMatchesQuery,
    ) -> ApiResult<Vec<Session>> {
        if self.profiles.find_dishwasher(dishwasher_id).await?.is_none() {
            return Err(ApiError::bad_request("Dishwasher profile required to find matches"));
        }

        let cuisine = query
            .cuisine_type
            .as_deref()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty());

        let candidates: Vec<Session> = self
            .sessions
            .list_open()
            .await?
            .into_iter()
            .filter(|s| s.host_id != dishwasher_id)
            .filter(|s| query.date_from.is_none_or(|from| s.scheduled_date >= from))
            .filter(|s| query.date_to.is_none_or(|to| s.scheduled_date <= to))
            .filter(|s| match &cuisine {
                Some(cuisine) => s
                    .meal_description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(cuisine.as_str())),
                None => true,
            })
            .collect();

        let Some(min_rating) = query.min_rating else {
            return Ok(candidates);
        };
        let min_scaled = (min_rating * 100.0).round() as i32;

        let mut host_ratings: HashMap<Uuid, i32> = HashMap::new();
        let mut matches = Vec::with_capacity(candidates.len());
        for session in candidates {
            let rating = match host_ratings.get(&session.host_id) {
                Some(rating) => *rating,
                None => {
                    let rating = self
                        .profiles
                        .find_host(session.host_id)
                        .await?
                        .map(|profile| profile.average_rating)
                        .unwrap_or(0);
                    host_ratings.insert(session.host_id, rating);
                    rating
                }
            };
            if rating >= min_scaled {
                matches.push(session);
            }
        }

        Ok(matches)
    }

    async fn require_session(&self, id: Uuid) -> ApiResult<Session> {
        self.sessions
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Session not found"))
    }

    /// Push `session:update` on the session channel
    pub async fn push_update(&self, session: &Session) {
        realtime::emit(
            self.notifier.publisher(),
            Channel::Session(session.id),
            SESSION_UPDATE,
            json!({
                "session_id": session.id,
                "status": session.status,
                "dishwasher_id": session.dishwasher_id,
            }),
        )
        .await;
    }
}
