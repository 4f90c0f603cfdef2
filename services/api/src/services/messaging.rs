//! In-app chat between the two participants of a session

use serde_json::{Value, json};
use std::{collections::HashMap, sync::Arc};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    models::{
        message::{ConversationSummary, Message, NewMessage, SendMessageRequest},
        notification::{NewNotification, NotificationKind},
        session::Session,
    },
    realtime::{self, Channel, MESSAGE_NEW},
    repositories::{MessageRepository, SessionRepository},
    services::notifications::Notifier,
    validation::validate_message_text,
};

#[derive(Clone)]
pub struct MessagingService {
    messages: Arc<dyn MessageRepository>,
    sessions: Arc<dyn SessionRepository>,
    notifier: Notifier,
}

impl MessagingService {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        sessions: Arc<dyn SessionRepository>,
        notifier: Notifier,
    ) -> Self {
        Self {
            messages,
            sessions,
            notifier,
        }
    }

    pub async fn send(&self, sender: &AuthUser, request: SendMessageRequest) -> ApiResult<Message> {
        let message_text = validate_message_text(&request.message_text).map_err(ApiError::BadRequest)?;

        let session = self.participant_session(sender.id, request.session_id).await?;
        if session.counterpart_of(sender.id) != Some(request.receiver_id) {
            return Err(ApiError::bad_request(
                "Receiver must be the other participant",
            ));
        }

        let message = self
            .messages
            .create(&NewMessage {
                session_id: session.id,
                sender_id: sender.id,
                receiver_id: request.receiver_id,
                message_text,
            })
            .await?;

        info!("Message {} sent in session {}", message.id, session.id);

        let sender_name = sender.name.as_deref().unwrap_or("a user");
        self.notifier
            .notify(
                NewNotification::new(
                    message.receiver_id,
                    NotificationKind::NewMessage,
                    "New Message",
                    format!("You have a new message from {}", sender_name),
                )
                .related_to(session.id)
                .with_data(json!({ "session_id": session.id })),
            )
            .await;

        realtime::emit(
            self.notifier.publisher(),
            Channel::Session(session.id),
            MESSAGE_NEW,
            serde_json::to_value(&message).unwrap_or(Value::Null),
        )
        .await;

        Ok(message)
    }

    pub async fn session_messages(&self, user_id: Uuid, session_id: Uuid) -> ApiResult<Vec<Message>> {
        let session = self.participant_session(user_id, session_id).await?;
        Ok(self.messages.list_for_session(session.id).await?)
    }

    pub async fn mark_as_read(&self, user_id: Uuid, message_id: Uuid) -> ApiResult<()> {
        if self.messages.mark_read(message_id, user_id).await? {
            Ok(())
        } else {
            Err(ApiError::not_found("Message not found"))
        }
    }

    pub async fn conversation(&self, user_id: Uuid, other_id: Uuid) -> ApiResult<Vec<Message>> {
        Ok(self.messages.list_between(user_id, other_id).await?)
    }

    pub async fn conversations(&self, user_id: Uuid) -> ApiResult<Vec<ConversationSummary>> {
        let messages = self.messages.list_for_user(user_id).await?;
        Ok(summarize_conversations(user_id, &messages))
    }

    async fn participant_session(&self, user_id: Uuid, session_id: Uuid) -> ApiResult<Session> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Session not found"))?;

        if !session.is_participant(user_id) {
            return Err(ApiError::forbidden("Not a participant in this session"));
        }
        Ok(session)
    }
}

/// One summary per counterpart, newest conversation first
///
/// `messages` must be ordered newest first.
pub fn summarize_conversations(user_id: Uuid, messages: &[Message]) -> Vec<ConversationSummary> {
    let mut summaries: Vec<ConversationSummary> = Vec::new();
    let mut index: HashMap<Uuid, usize> = HashMap::new();

    for message in messages {
        let other = if message.sender_id == user_id {
            message.receiver_id
        } else {
            message.sender_id
        };
        let unread = i64::from(message.receiver_id == user_id && !message.is_read);

        match index.get(&other) {
            Some(&i) => summaries[i].unread_count += unread,
            None => {
                index.insert(other, summaries.len());
                summaries.push(ConversationSummary {
                    other_user_id: other,
                    session_id: message.session_id,
                    last_message: message.clone(),
                    unread_count: unread,
                });
            }
        }
    }

    summaries
}
