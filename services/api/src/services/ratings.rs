//! Ratings and the per-user rating aggregate

use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        rating::{CreateRatingRequest, Rating, RatingSummary},
        session::SessionStatus,
    },
    repositories::{ProfileRepository, RatingRepository, SessionRepository},
};

#[derive(Clone)]
pub struct RatingService {
    ratings: Arc<dyn RatingRepository>,
    sessions: Arc<dyn SessionRepository>,
    profiles: Arc<dyn ProfileRepository>,
}

impl RatingService {
    pub fn new(
        ratings: Arc<dyn RatingRepository>,
        sessions: Arc<dyn SessionRepository>,
        profiles: Arc<dyn ProfileRepository>,
    ) -> Self {
        Self {
            ratings,
            sessions,
            profiles,
        }
    }

    pub async fn create_rating(
        &self,
        rater_id: Uuid,
        request: CreateRatingRequest,
    ) -> ApiResult<Rating> {
        request.validate().map_err(ApiError::BadRequest)?;

        let session = self
            .sessions
            .find_by_id(request.session_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Session not found"))?;

        if !session.is_participant(rater_id) {
            return Err(ApiError::forbidden("Only session participants can rate"));
        }
        if session.counterpart_of(rater_id) != Some(request.rated_id) {
            return Err(ApiError::bad_request(
                "Rated user must be the other participant",
            ));
        }
        if session.status != SessionStatus::Completed {
            return Err(ApiError::bad_request("Only completed sessions can be rated"));
        }

        if self
            .ratings
            .find_by_session_and_rater(session.id, rater_id)
            .await?
            .is_some()
        {
            return Err(ApiError::bad_request("Already rated this session"));
        }

        let rated_id = request.rated_id;
        let rating = self
            .ratings
            .insert(&request.into_new_rating(rater_id))
            .await?
            .ok_or_else(|| ApiError::bad_request("Already rated this session"))?;

        info!(
            "User {} rated {} for session {}",
            rater_id, rated_id, session.id
        );

        if let Err(e) = self.refresh_summary(rated_id).await {
            error!("Failed to refresh rating summary for {}: {}", rated_id, e);
        }

        Ok(rating)
    }

    pub async fn ratings_for_user(&self, user_id: Uuid) -> ApiResult<Vec<Rating>> {
        Ok(self.ratings.list_for_rated(user_id).await?)
    }

    /// Recompute the aggregate from every rating the user has received
    async fn refresh_summary(&self, user_id: Uuid) -> anyhow::Result<()> {
        let ratings = self.ratings.list_for_rated(user_id).await?;
        if let Some(summary) = RatingSummary::from_ratings(&ratings) {
            self.profiles.set_rating_summary(user_id, summary).await?;
        }
        Ok(())
    }
}
