//! Chat message models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub session_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub message_text: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub session_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub message_text: String,
}

/// Send message request payload
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub session_id: Uuid,
    pub receiver_id: Uuid,
    pub message_text: String,
}

/// Latest exchange with one counterpart
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConversationSummary {
    pub other_user_id: Uuid,
    pub session_id: Uuid,
    pub last_message: Message,
    pub unread_count: i64,
}
