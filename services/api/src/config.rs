//! Service settings
//!
//! Defaults are overridden by `DISHSWAP_*` environment variables, with `__`
//! separating nested keys (`DISHSWAP_SERVER__PORT=8080`).

use anyhow::Result;
use ::config::{Config, Environment};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub lifecycle: LifecycleSettings,
    pub moderation: ModerationSettings,
    pub storage: StorageSettings,
    pub realtime: RealtimeSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LifecycleSettings {
    /// Restrict participant status changes to the documented source states
    pub strict_transitions: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModerationSettings {
    /// Flag count at which a photo is hidden pending review
    pub auto_hide_threshold: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    pub bucket: String,
    pub public_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeSettings {
    pub enabled: bool,
    pub channel_prefix: String,
}

impl Settings {
    /// Load settings from defaults and the environment
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3001)?
            .set_default("lifecycle.strict_transitions", true)?
            .set_default("moderation.auto_hide_threshold", 3)?
            .set_default("storage.bucket", "dishswap-photos")?
            .set_default(
                "storage.public_base_url",
                "https://dishswap-photos.s3.amazonaws.com",
            )?
            .set_default("realtime.enabled", true)?
            .set_default("realtime.channel_prefix", "dishswap")?
            .add_source(
                Environment::with_prefix("DISHSWAP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?;

        if settings.moderation.auto_hide_threshold < 1 {
            anyhow::bail!("moderation.auto_hide_threshold must be at least 1");
        }

        Ok(settings)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
