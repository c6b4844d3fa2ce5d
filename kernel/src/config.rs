// Service Configuration
//
// Reader tuning and process-level settings, loaded from JSON.
// Every field has a default so a partial file is valid.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Errors produced while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

const MIN_POLL_INTERVAL_MS: u64 = 1;

/// How reader channels wait for new records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Upper bound between two length checks, in milliseconds.
    pub poll_interval_ms: u64,

    /// Also wake as soon as an append publishes a new length.
    pub wake_on_append: bool,
}

impl ChannelConfig {
    /// Fixed-interval polling only.
    pub fn polling(poll_interval: Duration) -> Self {
        Self {
            poll_interval_ms: u64::try_from(poll_interval.as_millis()).unwrap_or(u64::MAX),
            wake_on_append: false,
        }
    }

    /// Never zero: an idle reader would otherwise spin.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "channels.poll_interval_ms must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
            wake_on_append: true,
        }
    }
}

/// Top-level configuration for `tally serve`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Socket address to listen on.
    pub listen: String,

    /// Default tracing filter; `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text.
    pub json_logs: bool,

    pub channels: ChannelConfig,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8000".into(),
            log_level: "info".into(),
            json_logs: false,
            channels: ChannelConfig::default(),
        }
    }
}

impl ServeConfig {
    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(data)?;
        config.channels.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_uses_defaults() {
        let config = ServeConfig::from_json(r#"{ "channels": { "poll_interval_ms": 250 } }"#)
            .unwrap();

        assert_eq!(config.listen, "127.0.0.1:8000");
        assert_eq!(config.channels.poll_interval(), Duration::from_millis(250));
        assert!(config.channels.wake_on_append);
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(ServeConfig::from_json("{}").unwrap(), ServeConfig::default());
    }

    #[test]
    fn malformed_config_is_rejected() {
        let err = ServeConfig::from_json(r#"{ "listen": 8000 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let err = ServeConfig::from_json(
            r#"{ "channels": { "poll_interval_ms": 0, "wake_on_append": false } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn poll_interval_is_never_zero() {
        let config = ChannelConfig {
            poll_interval_ms: 0,
            wake_on_append: false,
        };
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
        assert_eq!(
            ChannelConfig::polling(Duration::ZERO).poll_interval(),
            Duration::from_millis(1)
        );
    }

    #[test]
    fn huge_polling_interval_saturates() {
        let config = ChannelConfig::polling(Duration::MAX);
        assert_eq!(config.poll_interval_ms, u64::MAX);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ServeConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
