//! Session photos, profile photos and moderation models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::text_enum;

text_enum! {
    ModerationStatus {
        Approved => "approved",
        PendingReview => "pending_review",
        Rejected => "rejected",
    }
}

text_enum! {
    FlagReason {
        Inappropriate => "inappropriate",
        Spam => "spam",
        Violence => "violence",
        Copyright => "copyright",
        Other => "other",
    }
}

text_enum! {
    FlagStatus {
        Pending => "pending",
        Dismissed => "dismissed",
        Upheld => "upheld",
    }
}

text_enum! {
    /// Admin decision on a flagged photo
    ModerationAction {
        Approve => "approve",
        Reject => "reject",
    }
}

impl ModerationAction {
    pub fn photo_status(self) -> ModerationStatus {
        match self {
            ModerationAction::Approve => ModerationStatus::Approved,
            ModerationAction::Reject => ModerationStatus::Rejected,
        }
    }

    /// Status given to the photo's pending flags
    pub fn flag_status(self) -> FlagStatus {
        match self {
            ModerationAction::Approve => FlagStatus::Dismissed,
            ModerationAction::Reject => FlagStatus::Upheld,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionPhoto {
    pub id: Uuid,
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub photo_url: String,
    pub caption: Option<String>,
    pub display_order: i32,
    pub moderation_status: ModerationStatus,
    pub flag_count: i32,
    pub is_hidden: bool,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSessionPhoto {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub photo_url: String,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PhotoFlag {
    pub id: Uuid,
    pub photo_id: Uuid,
    pub reporter_id: Uuid,
    pub reason: FlagReason,
    pub description: Option<String>,
    pub status: FlagStatus,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPhotoFlag {
    pub photo_id: Uuid,
    pub reporter_id: Uuid,
    pub reason: FlagReason,
    pub description: Option<String>,
}

/// A photo awaiting review together with its pending flags
#[derive(Debug, Clone, Serialize)]
pub struct FlaggedPhoto {
    #[serde(flatten)]
    pub photo: SessionPhoto,
    pub flags: Vec<PhotoFlag>,
}

/// Upload photo request payload; `photo_data` is base64
#[derive(Debug, Clone, Deserialize)]
pub struct UploadPhotoRequest {
    pub photo_data: String,
    pub caption: Option<String>,
}

/// A photo on a user's own profile
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProfilePhoto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub photo_url: String,
    pub is_primary: bool,
    pub display_order: i32,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProfilePhoto {
    pub user_id: Uuid,
    pub photo_url: String,
    pub is_primary: bool,
}

/// Upload profile photo request payload; `photo_data` is base64
#[derive(Debug, Clone, Deserialize)]
pub struct UploadProfilePhotoRequest {
    pub photo_data: String,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlagPhotoRequest {
    pub reason: FlagReason,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModeratePhotoRequest {
    pub action: ModerationAction,
}
