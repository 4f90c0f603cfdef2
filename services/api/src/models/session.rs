//! Session models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::text_enum;

text_enum! {
    /// Lifecycle state of a dishwashing session
    SessionStatus {
        Open => "open",
        Matched => "matched",
        Confirmed => "confirmed",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

impl SessionStatus {
    pub const ALL: [SessionStatus; 6] = [
        SessionStatus::Open,
        SessionStatus::Matched,
        SessionStatus::Confirmed,
        SessionStatus::InProgress,
        SessionStatus::Completed,
        SessionStatus::Cancelled,
    ];
}

text_enum! {
    /// Status a participant may move a session to
    StatusUpdate {
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

impl StatusUpdate {
    pub fn target(self) -> SessionStatus {
        match self {
            StatusUpdate::InProgress => SessionStatus::InProgress,
            StatusUpdate::Completed => SessionStatus::Completed,
            StatusUpdate::Cancelled => SessionStatus::Cancelled,
        }
    }

    /// Source states accepted when transitions are strict
    pub fn strict_sources(self) -> &'static [SessionStatus] {
        match self {
            StatusUpdate::InProgress => &[SessionStatus::Confirmed],
            StatusUpdate::Completed => &[SessionStatus::InProgress],
            StatusUpdate::Cancelled => &[
                SessionStatus::Open,
                SessionStatus::Matched,
                SessionStatus::Confirmed,
            ],
        }
    }

    /// Whether the target state needs an assigned dishwasher
    pub fn requires_dishwasher(self) -> bool {
        !matches!(self, StatusUpdate::Cancelled)
    }
}

/// A dishwashing session listed by a host
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: Uuid,
    pub host_id: Uuid,
    pub dishwasher_id: Option<Uuid>,
    pub status: SessionStatus,
    pub scheduled_date: DateTime<Utc>,
    pub estimated_duration_minutes: i32,
    pub actual_duration_minutes: Option<i32>,
    pub dish_count: Option<i32>,
    pub meal_description: Option<String>,
    pub special_instructions: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.host_id == user_id || self.dishwasher_id == Some(user_id)
    }

    /// The other participant, if `user_id` takes part in the session
    pub fn counterpart_of(&self, user_id: Uuid) -> Option<Uuid> {
        if self.host_id == user_id {
            self.dishwasher_id
        } else if self.dishwasher_id == Some(user_id) {
            Some(self.host_id)
        } else {
            None
        }
    }
}

/// Validated fields of a session about to be inserted
#[derive(Debug, Clone)]
pub struct NewSession {
    pub host_id: Uuid,
    pub scheduled_date: DateTime<Utc>,
    pub estimated_duration_minutes: i32,
    pub dish_count: Option<i32>,
    pub meal_description: Option<String>,
    pub special_instructions: Option<String>,
}

/// Guard checked in the same statement that applies a participant status change
#[derive(Debug, Clone)]
pub struct TransitionGuard {
    pub actor: Uuid,
    pub target: SessionStatus,
    pub allowed_from: Vec<SessionStatus>,
    pub requires_dishwasher: bool,
}

fn default_duration_minutes() -> i32 {
    60
}

/// Create session request payload
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionRequest {
    pub scheduled_date: DateTime<Utc>,
    #[serde(default = "default_duration_minutes")]
    pub estimated_duration_minutes: i32,
    pub dish_count: Option<i32>,
    pub meal_description: Option<String>,
    pub special_instructions: Option<String>,
}

/// Update status request payload
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: StatusUpdate,
}

/// Record actual duration request payload
#[derive(Debug, Clone, Deserialize)]
pub struct RecordDurationRequest {
    pub actual_duration_minutes: i32,
}

/// Filters for open sessions a dishwasher might take
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FindMatchesQuery {
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub cuisine_type: Option<String>,
    pub min_rating: Option<f64>,
}
