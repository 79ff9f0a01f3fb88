//! Broadcast and registry configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastConfig {
    /// Pub/sub channel carrying verified events
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Key prefix for the connection registry
    #[serde(default = "default_registry_prefix")]
    pub registry_prefix: String,

    /// Deadline for one broadcast pass in milliseconds
    #[serde(default = "default_pass_timeout_ms")]
    pub pass_timeout_ms: u64,

    /// Outbound queue depth per live connection
    #[serde(default = "default_send_buffer")]
    pub send_buffer: usize,

    /// Lifetime of a registry entry without a refresh, in seconds
    #[serde(default = "default_registry_ttl_secs")]
    pub registry_ttl_secs: u64,
}

impl BroadcastConfig {
    pub fn pass_timeout(&self) -> Duration {
        Duration::from_millis(self.pass_timeout_ms)
    }

    pub fn registry_ttl(&self) -> Duration {
        Duration::from_secs(self.registry_ttl_secs)
    }

    /// Open sockets re-register three times per TTL.
    pub fn registry_refresh_interval(&self) -> Duration {
        (self.registry_ttl() / 3).max(Duration::from_secs(1))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.channel.trim().is_empty() {
            return Err(ValidationError::InvalidBroadcastSetting("channel"));
        }
        if self.registry_prefix.trim().is_empty() {
            return Err(ValidationError::InvalidBroadcastSetting("registry_prefix"));
        }
        if self.pass_timeout_ms == 0 {
            return Err(ValidationError::InvalidBroadcastSetting("pass_timeout_ms"));
        }
        if self.send_buffer == 0 {
            return Err(ValidationError::InvalidBroadcastSetting("send_buffer"));
        }
        if self.registry_ttl_secs < 3 {
            return Err(ValidationError::InvalidBroadcastSetting("registry_ttl_secs"));
        }
        Ok(())
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            channel: default_channel(),
            registry_prefix: default_registry_prefix(),
            pass_timeout_ms: default_pass_timeout_ms(),
            send_buffer: default_send_buffer(),
            registry_ttl_secs: default_registry_ttl_secs(),
        }
    }
}

fn default_channel() -> String {
    "payment-events".to_string()
}

fn default_registry_prefix() -> String {
    "payment-fanout".to_string()
}

fn default_pass_timeout_ms() -> u64 {
    5_000
}

fn default_send_buffer() -> usize {
    64
}

fn default_registry_ttl_secs() -> u64 {
    120
}
