//! Configuration types for Sleet.
//!
//! `ServerConfig` is the shape of `sleet.toml`. Every field has a default so
//! a partial (or missing) file still parses; required settings are checked
//! when the config is resolved at startup.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Hex-encoded Ed25519 public key used to verify inbound requests.
    #[serde(default)]
    pub public_key: Option<String>,

    /// Application id, used to address follow-up webhooks.
    #[serde(default)]
    pub application_id: Option<String>,

    /// Bot token, sent as `Authorization: Bot <token>` on follow-ups when set.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Base URL of the platform's REST API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Log inbound interaction and outbound response payloads at debug level.
    #[serde(default)]
    pub debug: bool,

    /// How long graceful shutdown waits for in-flight follow-ups.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,

    #[serde(default)]
    pub auto_defer: AutoDeferConfig,
}

fn default_api_base_url() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_shutdown_grace_secs() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            public_key: None,
            application_id: None,
            bot_token: None,
            api_base_url: default_api_base_url(),
            host: default_host(),
            port: default_port(),
            debug: false,
            shutdown_grace_secs: default_shutdown_grace_secs(),
            auto_defer: AutoDeferConfig::default(),
        }
    }
}

/// Process-wide automatic defer policy.
///
/// When enabled, command and component handlers that have not finished
/// within `timeout_ms` are answered with a defer and keep running in the
/// background; their result is delivered as a follow-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoDeferConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_defer_timeout_ms")]
    pub timeout_ms: u64,

    /// Whether the synthesized defer is ephemeral.
    #[serde(default)]
    pub ephemeral: bool,
}

fn default_defer_timeout_ms() -> u64 {
    1_000
}

impl AutoDeferConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for AutoDeferConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_ms: default_defer_timeout_ms(),
            ephemeral: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default_values() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.api_base_url, "https://discord.com/api/v10");
        assert!(config.public_key.is_none());
        assert!(!config.auto_defer.enabled);
        assert_eq!(config.auto_defer.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_server_config_deserialize_empty() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.shutdown_grace_secs, 10);
        assert_eq!(config.auto_defer, AutoDeferConfig::default());
    }

    #[test]
    fn test_server_config_deserialize_with_values() {
        let toml_str = r#"
public_key = "abcd"
application_id = "1234"
port = 9000
debug = true

[auto_defer]
enabled = true
timeout_ms = 2500
ephemeral = true
"#;
        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.public_key.as_deref(), Some("abcd"));
        assert_eq!(config.application_id.as_deref(), Some("1234"));
        assert_eq!(config.port, 9000);
        assert!(config.debug);
        assert!(config.auto_defer.enabled);
        assert!(config.auto_defer.ephemeral);
        assert_eq!(config.auto_defer.timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn test_auto_defer_partial_table_keeps_defaults() {
        let config: ServerConfig = toml::from_str("[auto_defer]\nenabled = true\n").unwrap();
        assert!(config.auto_defer.enabled);
        assert_eq!(config.auto_defer.timeout_ms, 1_000);
    }
}
