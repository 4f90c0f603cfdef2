//! Match suggestion models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::text_enum;

text_enum! {
    MatchStatus {
        Pending => "pending",
        Accepted => "accepted",
        Declined => "declined",
        Expired => "expired",
    }
}

/// A suggested pairing between an open session and a dishwasher
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Match {
    pub id: Uuid,
    pub session_id: Uuid,
    pub dishwasher_id: Uuid,
    /// Score times 100
    pub match_score: Option<i32>,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewMatch {
    pub session_id: Uuid,
    pub dishwasher_id: Uuid,
    pub match_score: Option<i32>,
}

/// Create match request payload
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMatchRequest {
    pub session_id: Uuid,
    pub dishwasher_id: Uuid,
    pub match_score: Option<f64>,
}

impl CreateMatchRequest {
    pub fn scaled_score(&self) -> Option<i32> {
        self.match_score.map(|score| (score * 100.0).round() as i32)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMatchStatusRequest {
    pub status: MatchStatus,
}
