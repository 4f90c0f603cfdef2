//! Host-proposed pairings between open sessions and dishwashers

use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    models::{
        matches::{CreateMatchRequest, Match, MatchStatus, NewMatch},
        notification::{NewNotification, NotificationKind},
        session::SessionStatus,
    },
    repositories::{Acceptance, MatchRepository, SessionRepository},
    services::{lifecycle::LifecycleService, notifications::Notifier},
};

#[derive(Clone)]
pub struct MatchService {
    matches: Arc<dyn MatchRepository>,
    sessions: Arc<dyn SessionRepository>,
    lifecycle: LifecycleService,
    notifier: Notifier,
}

impl MatchService {
    pub fn new(
        matches: Arc<dyn MatchRepository>,
        sessions: Arc<dyn SessionRepository>,
        lifecycle: LifecycleService,
        notifier: Notifier,
    ) -> Self {
        Self {
            matches,
            sessions,
            lifecycle,
            notifier,
        }
    }

    pub async fn create(&self, host_id: Uuid, request: CreateMatchRequest) -> ApiResult<Match> {
        let session = self
            .sessions
            .find_by_id(request.session_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Session not found"))?;

        if session.host_id != host_id {
            return Err(ApiError::forbidden("Only host can propose matches"));
        }
        if session.status != SessionStatus::Open {
            return Err(ApiError::bad_request("Session is not open for applications"));
        }
        if request.dishwasher_id == host_id {
            return Err(ApiError::bad_request("Cannot match a host with their own session"));
        }

        let created = self
            .matches
            .create(&NewMatch {
                session_id: session.id,
                dishwasher_id: request.dishwasher_id,
                match_score: request.scaled_score(),
            })
            .await?;

        info!(
            "Match {} proposed for session {} to {}",
            created.id, session.id, created.dishwasher_id
        );
        Ok(created)
    }

    pub async fn for_session(&self, session_id: Uuid) -> ApiResult<Vec<Match>> {
        Ok(self.matches.list_for_session(session_id).await?)
    }

    pub async fn mine(&self, dishwasher_id: Uuid) -> ApiResult<Vec<Match>> {
        Ok(self.matches.list_for_dishwasher(dishwasher_id).await?)
    }

    /// Answer a match; accepting claims the session in the same transaction
    pub async fn update_status(
        &self,
        dishwasher: &AuthUser,
        match_id: Uuid,
        status: MatchStatus,
    ) -> ApiResult<Match> {
        let proposal = self
            .matches
            .find_by_id(match_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Match not found"))?;

        if proposal.dishwasher_id != dishwasher.id {
            return Err(ApiError::forbidden("Not authorized to update this match"));
        }
        if proposal.status != MatchStatus::Pending {
            return Err(ApiError::bad_request("Match has already been answered"));
        }
        let now = Utc::now();
        match status {
            MatchStatus::Declined => self
                .matches
                .decline(match_id, dishwasher.id, now)
                .await?
                .ok_or_else(|| ApiError::bad_request("Match has already been answered")),
            MatchStatus::Accepted => {
                let outcome = self.matches.accept(match_id, dishwasher.id, now).await?;
                let (accepted, session) = match outcome {
                    Acceptance::Accepted { accepted, session } => (accepted, session),
                    Acceptance::NotPending => {
                        return Err(ApiError::bad_request("Match has already been answered"));
                    }
                    Acceptance::SessionUnavailable => {
                        return Err(ApiError::bad_request(
                            "Session is not open for applications",
                        ));
                    }
                };

                info!(
                    "Match {} accepted; session {} matched with {}",
                    accepted.id, session.id, dishwasher.id
                );
                self.lifecycle.push_update(&session).await;

                let name = dishwasher.name.as_deref().unwrap_or("A dishwasher");
                self.notifier
                    .notify(
                        NewNotification::new(
                            session.host_id,
                            NotificationKind::MatchAccepted,
                            "Match Accepted!",
                            format!("{} accepted the match for your session", name),
                        )
                        .related_to(session.id),
                    )
                    .await;

                Ok(accepted)
            }
            _ => Err(ApiError::bad_request("Match can only be accepted or declined")),
        }
    }
}
