use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Positional change (degrees, L1) below which a fix is treated as GPS jitter.
pub const MOVE_THRESHOLD: f64 = 0.000_05;
pub const HEARTBEAT_INTERVAL_MS: u64 = 30_000;
pub const RECONNECT_BASE_MS: u64 = 1_000;
pub const RECONNECT_MAX_MS: u64 = 30_000;
pub const CONNECT_TIMEOUT_MS: u64 = 10_000;
pub const CHANNEL_CAPACITY: usize = 64;

/// Shared configuration for the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub move_threshold: f64,
    pub heartbeat_interval_ms: u64,
    pub reconnect_base_ms: u64,
    pub reconnect_max_ms: u64,
    /// Upper bound on the websocket handshake; expiry counts as a close.
    pub connect_timeout_ms: u64,
    pub channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            move_threshold: MOVE_THRESHOLD,
            heartbeat_interval_ms: HEARTBEAT_INTERVAL_MS,
            reconnect_base_ms: RECONNECT_BASE_MS,
            reconnect_max_ms: RECONNECT_MAX_MS,
            connect_timeout_ms: CONNECT_TIMEOUT_MS,
            channel_capacity: CHANNEL_CAPACITY,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> PipelineResult<()> {
        if !self.move_threshold.is_finite() || self.move_threshold < 0.0 {
            return Err(PipelineError::Config(format!(
                "move_threshold must be a non-negative number, got {}",
                self.move_threshold
            )));
        }
        if self.heartbeat_interval_ms == 0 {
            return Err(PipelineError::Config(
                "heartbeat_interval_ms must be positive".into(),
            ));
        }
        if self.reconnect_base_ms == 0 || self.reconnect_base_ms > self.reconnect_max_ms {
            return Err(PipelineError::Config(format!(
                "reconnect delays must satisfy 0 < base ({}) <= max ({})",
                self.reconnect_base_ms, self.reconnect_max_ms
            )));
        }
        if self.connect_timeout_ms == 0 {
            return Err(PipelineError::Config(
                "connect_timeout_ms must be positive".into(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(PipelineError::Config(
                "channel_capacity must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Wall-clock epoch milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

/// Common error type for pipeline execution.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("invalid config: {0}")]
    Config(String),
    #[error("host channel closed")]
    ChannelClosed,
}

pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(30));
    }

    #[test]
    fn config_rejects_inverted_backoff_bounds() {
        let config = PipelineConfig {
            reconnect_base_ms: 5_000,
            reconnect_max_ms: 1_000,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn config_rejects_zero_connect_timeout() {
        let config = PipelineConfig {
            connect_timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
        assert_eq!(PipelineConfig::default().connect_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn config_rejects_nan_threshold() {
        let config = PipelineConfig {
            move_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"reconnect_base_ms": 10}"#).unwrap();
        assert_eq!(config.reconnect_base_ms, 10);
        assert_eq!(config.reconnect_max_ms, RECONNECT_MAX_MS);
        assert_eq!(config.move_threshold, MOVE_THRESHOLD);
    }
}
