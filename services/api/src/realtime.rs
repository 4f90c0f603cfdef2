//! Best-effort real-time push
//!
//! Events are published on per-user and per-session channels. Delivery is
//! never required for an operation to succeed.

use anyhow::Result;
use async_trait::async_trait;
use common::pubsub::RedisPool;
use serde_json::{Value, json};
use tracing::{debug, warn};
use uuid::Uuid;

pub const NOTIFICATION_NEW: &str = "notification:new";
pub const MESSAGE_NEW: &str = "message:new";
pub const SESSION_UPDATE: &str = "session:update";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    User(Uuid),
    Session(Uuid),
}

impl Channel {
    pub fn name(&self, prefix: &str) -> String {
        match self {
            Channel::User(id) => format!("{}:user:{}", prefix, id),
            Channel::Session(id) => format!("{}:session:{}", prefix, id),
        }
    }
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, channel: Channel, event: &str, data: Value) -> Result<()>;
}

/// Publishes JSON envelopes `{"event": .., "data": ..}` over Redis
#[derive(Clone)]
pub struct RedisPublisher {
    redis: RedisPool,
    channel_prefix: String,
}

impl RedisPublisher {
    pub fn new(redis: RedisPool, channel_prefix: impl Into<String>) -> Self {
        Self {
            redis,
            channel_prefix: channel_prefix.into(),
        }
    }
}

#[async_trait]
impl EventPublisher for RedisPublisher {
    async fn publish(&self, channel: Channel, event: &str, data: Value) -> Result<()> {
        let channel = channel.name(&self.channel_prefix);
        let payload = json!({ "event": event, "data": data }).to_string();
        let receivers = self.redis.publish(&channel, &payload).await?;
        debug!("Published {} on {} to {} receivers", event, channel, receivers);
        Ok(())
    }
}

/// Used when real-time push is disabled
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish(&self, _channel: Channel, _event: &str, _data: Value) -> Result<()> {
        Ok(())
    }
}

/// Publish and log failures instead of returning them
pub async fn emit(publisher: &dyn EventPublisher, channel: Channel, event: &str, data: Value) {
    if let Err(e) = publisher.publish(channel, event, data).await {
        warn!("Failed to push {} event: {}", event, e);
    }
}
