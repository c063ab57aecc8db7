//! Coordinator configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Address the transport listens on
    #[serde(rename = "listen-uri", default = "default_listen_uri")]
    pub listen_uri: String,

    /// Transport platform; "auto" resolves from the listen uri scheme
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Buffer size of the request queue feeding the event loop
    #[serde(rename = "channel-buffer", default = "default_channel_buffer")]
    pub channel_buffer: usize,

    /// Upper bound on one wait for the next message, in milliseconds.
    /// Bounds shutdown latency when the transport goes quiet.
    #[serde(rename = "await-timeout-ms", default = "default_await_timeout_ms")]
    pub await_timeout_ms: u64,
}

fn default_listen_uri() -> String {
    "tcp://localhost:9998".to_string()
}

fn default_platform() -> String {
    "auto".to_string()
}

fn default_channel_buffer() -> usize {
    1000
}

fn default_await_timeout_ms() -> u64 {
    1000
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            listen_uri: default_listen_uri(),
            platform: default_platform(),
            channel_buffer: default_channel_buffer(),
            await_timeout_ms: default_await_timeout_ms(),
        }
    }
}

impl CoordinatorConfig {
    /// Get the await bound as a Duration
    pub fn await_timeout(&self) -> Duration {
        Duration::from_millis(self.await_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.listen_uri, "tcp://localhost:9998");
        assert_eq!(config.platform, "auto");
        assert_eq!(config.channel_buffer, 1000);
        assert_eq!(config.await_timeout_ms, 1000);
    }

    #[test]
    fn test_await_timeout_duration() {
        let config = CoordinatorConfig {
            await_timeout_ms: 250,
            ..Default::default()
        };
        assert_eq!(config.await_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: CoordinatorConfig = serde_yaml::from_str("listen-uri: tcp://0.0.0.0:7000\n").unwrap();
        assert_eq!(config.listen_uri, "tcp://0.0.0.0:7000");
        assert_eq!(config.platform, "auto");
        assert_eq!(config.channel_buffer, 1000);
    }
}
