use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::kernel::decision::DEFAULT_LOCK_THRESHOLD;
use crate::kernel::fusion::WeightPolicy;

pub const DEFAULT_CONTEXT_CAPACITY: usize = 30;
pub const DEFAULT_CHANNEL: &str = "locus_data";

/// Top-level configuration. Every field has a default so a partial JSON
/// file (or none at all) is enough to start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocusConfig {
    pub endpoint: EndpointConfig,
    pub reconnect: ReconnectPolicy,
    pub context_capacity: usize,
    pub lock_threshold: f64,
    pub fusion: WeightPolicy,
    pub render: RenderConfig,
}

impl Default for LocusConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            reconnect: ReconnectPolicy::default(),
            context_capacity: DEFAULT_CONTEXT_CAPACITY,
            lock_threshold: DEFAULT_LOCK_THRESHOLD,
            fusion: WeightPolicy::default(),
            render: RenderConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub host: String,
    pub port: u16,
    /// Named event stream carrying sensor packets.
    pub channel: String,
    pub connect_timeout_ms: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            channel: DEFAULT_CHANNEL.to_string(),
            connect_timeout_ms: 2_000,
        }
    }
}

impl EndpointConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Exponential backoff between reconnect attempts.
/// `max_attempts = None` retries forever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    pub enabled: bool,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub multiplier: f64,
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_backoff_ms: 250,
            max_backoff_ms: 5_000,
            multiplier: 2.0,
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before retry number `attempt` (1-based). Saturates at `max_backoff_ms`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(63) as i32;
        let raw = self.initial_backoff_ms as f64 * self.multiplier.powi(exp);
        let capped = raw.min(self.max_backoff_ms as f64);
        Duration::from_millis(capped as u64)
    }

    pub fn allows(&self, attempt: u32) -> bool {
        self.enabled && self.max_attempts.map_or(true, |max| attempt <= max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub frame_rate_hz: u32,
    pub walk_amplitude: f32,
    /// Radians added per render tick while spinning.
    pub spin_increment: f32,
    /// Animate only locked decisions; unlocked ones render as idle.
    pub require_lock: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: 60,
            walk_amplitude: 2.0,
            spin_increment: 0.1,
            require_lock: false,
        }
    }
}

impl RenderConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate_hz.max(1) as f64)
    }
}

impl LocusConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: LocusConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// LOCUS_HOST / LOCUS_PORT / LOCUS_CHANNEL take precedence over the file.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(host) = std::env::var("LOCUS_HOST") {
            self.endpoint.host = host;
        }
        if let Ok(port) = std::env::var("LOCUS_PORT") {
            self.endpoint.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("LOCUS_PORT is not a port: {}", port)))?;
        }
        if let Ok(channel) = std::env::var("LOCUS_CHANNEL") {
            self.endpoint.channel = channel;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.lock_threshold > 0.0 && self.lock_threshold <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "lock_threshold must be in (0, 1], got {}",
                self.lock_threshold
            )));
        }
        if self.render.frame_rate_hz == 0 {
            return Err(ConfigError::Invalid("render.frame_rate_hz must be > 0".into()));
        }
        if self.reconnect.initial_backoff_ms > self.reconnect.max_backoff_ms {
            return Err(ConfigError::Invalid(format!(
                "reconnect.initial_backoff_ms ({}) exceeds max_backoff_ms ({})",
                self.reconnect.initial_backoff_ms, self.reconnect.max_backoff_ms
            )));
        }
        if !(self.reconnect.multiplier >= 1.0) || !self.reconnect.multiplier.is_finite() {
            return Err(ConfigError::Invalid("reconnect.multiplier must be finite and >= 1.0".into()));
        }
        if self.endpoint.channel.is_empty() {
            return Err(ConfigError::Invalid("endpoint.channel must not be empty".into()));
        }
        self.fusion.validate()?;
        Ok(())
    }
}
