//! Server configuration loader for Sleet.
//!
//! Reads `sleet.toml` and deserializes it into [`ServerConfig`], applies
//! command-line / environment overrides, then resolves the result into
//! validated [`Settings`].
//!
//! - A missing file yields the defaults.
//! - A file that exists but cannot be read or parsed is an error; the server
//!   does not start on a config it only half understands.

use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;

use sleet_types::config::{AutoDeferConfig, ServerConfig};
use sleet_types::error::ConfigError;

use crate::crypto::signature::Ed25519Verifier;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "sleet.toml";

/// Load configuration from `path`.
pub async fn load_server_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(ServerConfig::default());
        }
        Err(err) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                message: err.to_string(),
            });
        }
    };

    toml::from_str::<ServerConfig>(&content).map_err(|e| ConfigError::Parse(e.to_string()))
}

/// Values supplied on the command line or through the environment.
///
/// Each `Some` replaces the corresponding file value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub public_key: Option<String>,
    pub application_id: Option<String>,
    pub bot_token: Option<String>,
    pub api_base_url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Force auto-defer on regardless of the file.
    pub auto_defer: bool,
}

impl ConfigOverrides {
    pub fn apply(self, config: &mut ServerConfig) {
        if let Some(public_key) = self.public_key {
            config.public_key = Some(public_key);
        }
        if let Some(application_id) = self.application_id {
            config.application_id = Some(application_id);
        }
        if let Some(bot_token) = self.bot_token {
            config.bot_token = Some(bot_token);
        }
        if let Some(api_base_url) = self.api_base_url {
            config.api_base_url = api_base_url;
        }
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.auto_defer {
            config.auto_defer.enabled = true;
        }
    }
}

/// Fully resolved, validated settings.
#[derive(Debug)]
pub struct Settings {
    pub public_key: String,
    pub verifier: Ed25519Verifier,
    pub application_id: String,
    pub bot_token: Option<SecretString>,
    pub api_base_url: String,
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub shutdown_grace: Duration,
    pub auto_defer: AutoDeferConfig,
}

impl Settings {
    /// Check required keys and parse the public key.
    pub fn resolve(config: ServerConfig) -> Result<Self, ConfigError> {
        let public_key = non_empty(config.public_key).ok_or(ConfigError::Missing("public_key"))?;
        let application_id =
            non_empty(config.application_id).ok_or(ConfigError::Missing("application_id"))?;
        let verifier = Ed25519Verifier::from_hex(&public_key)?;

        Ok(Self {
            public_key,
            verifier,
            application_id,
            bot_token: non_empty(config.bot_token).map(SecretString::from),
            api_base_url: config.api_base_url,
            host: config.host,
            port: config.port,
            debug: config.debug,
            shutdown_grace: Duration::from_secs(config.shutdown_grace_secs),
            auto_defer: config.auto_defer,
        })
    }

    /// `host:port` to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // Public key of the all-sevens test signing key.
    fn public_key() -> String {
        use ed25519_dalek::SigningKey;
        hex::encode(SigningKey::from_bytes(&[7u8; 32]).verifying_key().to_bytes())
    }

    #[tokio::test]
    async fn load_server_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_server_config(&tmp.path().join(DEFAULT_CONFIG_FILE))
            .await
            .unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.public_key.is_none());
    }

    #[tokio::test]
    async fn load_server_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(DEFAULT_CONFIG_FILE);
        tokio::fs::write(
            &path,
            r#"
application_id = "1234"
port = 9001
shutdown_grace_secs = 3

[auto_defer]
enabled = true
timeout_ms = 750
"#,
        )
        .await
        .unwrap();

        let config = load_server_config(&path).await.unwrap();
        assert_eq!(config.application_id.as_deref(), Some("1234"));
        assert_eq!(config.port, 9001);
        assert_eq!(config.shutdown_grace_secs, 3);
        assert!(config.auto_defer.enabled);
        assert_eq!(config.auto_defer.timeout_ms, 750);
    }

    #[tokio::test]
    async fn load_server_config_invalid_toml_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(DEFAULT_CONFIG_FILE);
        tokio::fs::write(&path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let err = load_server_config(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = ServerConfig {
            host: "0.0.0.0".to_string(),
            ..ServerConfig::default()
        };
        ConfigOverrides {
            application_id: Some("42".to_string()),
            port: Some(3000),
            auto_defer: true,
            ..ConfigOverrides::default()
        }
        .apply(&mut config);

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.application_id.as_deref(), Some("42"));
        assert!(config.auto_defer.enabled);
    }

    #[test]
    fn resolve_requires_public_key_and_application_id() {
        let err = Settings::resolve(ServerConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("public_key")));

        let config = ServerConfig {
            public_key: Some(public_key()),
            application_id: Some("   ".to_string()),
            ..ServerConfig::default()
        };
        let err = Settings::resolve(config).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("application_id")));
    }

    #[test]
    fn resolve_rejects_invalid_public_key() {
        let config = ServerConfig {
            public_key: Some("not-a-key".to_string()),
            application_id: Some("1".to_string()),
            ..ServerConfig::default()
        };
        assert!(matches!(
            Settings::resolve(config),
            Err(ConfigError::InvalidPublicKey(_))
        ));
    }

    #[test]
    fn resolve_builds_settings() {
        let config = ServerConfig {
            public_key: Some(public_key()),
            application_id: Some("1".to_string()),
            bot_token: Some(String::new()),
            port: 9999,
            shutdown_grace_secs: 4,
            ..ServerConfig::default()
        };
        let settings = Settings::resolve(config).unwrap();
        assert_eq!(settings.bind_addr(), "127.0.0.1:9999");
        assert_eq!(settings.shutdown_grace, Duration::from_secs(4));
        assert!(settings.bot_token.is_none());
    }
}
