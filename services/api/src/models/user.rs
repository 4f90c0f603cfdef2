//! User account and public profile models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    photo::{ProfilePhoto, SessionPhoto},
    profile::{DishwasherProfile, HostProfile},
    rating::Rating,
    session::Session,
    text_enum,
};

text_enum! {
    Role {
        User => "user",
        Admin => "admin",
    }
}

text_enum! {
    UserType {
        Dishwasher => "dishwasher",
        Host => "host",
        Both => "both",
    }
}

/// Account record provisioned by the identity provider
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub user_type: UserType,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Name shown to other users
    pub fn display_name(&self) -> Option<String> {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return Some(name.to_string());
        }

        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            (Some(first), None) => Some(first.to_string()),
            (None, Some(last)) => Some(last.to_string()),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub user_type: Option<UserType>,
}

/// Subset of the account visible to everyone
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub display_name: Option<String>,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub user_type: UserType,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name(),
            name: user.name,
            first_name: user.first_name,
            last_name: user.last_name,
            bio: user.bio,
            user_type: user.user_type,
            email_verified: user.email_verified,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct UserStatistics {
    pub total_sessions_hosted: u32,
    pub total_sessions_washed: u32,
    pub completed_sessions_hosted: u32,
    pub completed_sessions_washed: u32,
    pub total_ratings: u32,
    pub average_rating: f64,
}

impl UserStatistics {
    pub fn total_completed(&self) -> u32 {
        self.completed_sessions_hosted + self.completed_sessions_washed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeCategory {
    Achievement,
    Verification,
    Rating,
    Milestone,
}

/// Achievement shown on a public profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    pub category: BadgeCategory,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicProfile {
    pub user: PublicUser,
    pub host_profile: Option<HostProfile>,
    pub dishwasher_profile: Option<DishwasherProfile>,
    pub statistics: UserStatistics,
    pub badges: Vec<Badge>,
    pub recent_sessions: Vec<Session>,
    pub reviews: Vec<Rating>,
    /// Primary first
    pub profile_photos: Vec<ProfilePhoto>,
    /// Visible photos from the user's sessions, newest first
    pub session_photos: Vec<SessionPhoto>,
}
