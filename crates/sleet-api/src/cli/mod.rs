//! CLI command definitions for the `sleet` binary.
//!
//! Uses clap derive macros. Every configuration value can come from the
//! config file, an environment variable, or a flag (flag wins).

pub mod check;
pub mod serve;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use sleet_infra::config::{ConfigOverrides, DEFAULT_CONFIG_FILE, Settings, load_server_config};
use sleet_observe::tracing_setup::LogFormat;

/// Serve signed chat-platform interactions over HTTP.
#[derive(Parser)]
#[command(name = "sleet", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Suppress all log output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug logs from sleet, -vv for everything at debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format: pretty or json.
    #[arg(long, global = true, env = "SLEET_LOG_FORMAT", default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interaction webhook server.
    Serve(ServeArgs),

    /// Load and validate configuration without starting the server.
    CheckConfig {
        #[command(flatten)]
        config: ConfigArgs,

        /// Output machine-readable JSON instead of styled text.
        #[arg(long)]
        json: bool,
    },
}

/// Where configuration comes from.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to the TOML config file.
    #[arg(long, env = "SLEET_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Hex-encoded Ed25519 public key of the application.
    #[arg(long, env = "SLEET_PUBLIC_KEY")]
    pub public_key: Option<String>,

    /// Application id used to address follow-up webhooks.
    #[arg(long, env = "SLEET_APPLICATION_ID")]
    pub application_id: Option<String>,

    /// Bot token for follow-up calls.
    #[arg(long, env = "SLEET_BOT_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,

    /// Base URL of the platform REST API.
    #[arg(long, env = "SLEET_API_BASE_URL")]
    pub api_base_url: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Address to bind.
    #[arg(long, env = "SLEET_HOST")]
    pub host: Option<String>,

    /// Port to bind.
    #[arg(long, env = "SLEET_PORT")]
    pub port: Option<u16>,

    /// Enable automatic deferral of slow command and component handlers.
    #[arg(long)]
    pub auto_defer: bool,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long)]
    pub otel: bool,
}

impl ConfigArgs {
    /// Load the file, apply env/flag overrides, and validate.
    pub async fn resolve(&self, mut overrides: ConfigOverrides) -> anyhow::Result<Settings> {
        let mut config = load_server_config(&self.config).await?;

        overrides.public_key = self.public_key.clone();
        overrides.application_id = self.application_id.clone();
        overrides.bot_token = self.bot_token.clone();
        overrides.api_base_url = self.api_base_url.clone();
        overrides.apply(&mut config);

        Ok(Settings::resolve(config)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_flags() {
        let cli = Cli::try_parse_from([
            "sleet",
            "-v",
            "serve",
            "--port",
            "9000",
            "--auto-defer",
            "--config",
            "custom.toml",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        assert_eq!(cli.log_format, LogFormat::Pretty);
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.port, Some(9000));
                assert!(args.auto_defer);
                assert_eq!(args.config.config, PathBuf::from("custom.toml"));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_parse_log_format() {
        let cli = Cli::try_parse_from(["sleet", "check-config", "--log-format", "json"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(Cli::try_parse_from(["sleet", "--log-format", "xml", "check-config"]).is_err());
    }

    #[tokio::test]
    async fn test_resolve_applies_flags_over_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("sleet.toml");
        tokio::fs::write(&path, "application_id = \"from-file\"\nport = 7000\n")
            .await
            .unwrap();

        let public_key = {
            use ed25519_dalek::SigningKey;
            hex::encode(SigningKey::from_bytes(&[3u8; 32]).verifying_key().to_bytes())
        };
        let args = ConfigArgs {
            config: path,
            public_key: Some(public_key),
            application_id: Some("from-flag".to_string()),
            bot_token: None,
            api_base_url: None,
        };

        let settings = args
            .resolve(ConfigOverrides {
                port: Some(7001),
                ..ConfigOverrides::default()
            })
            .await
            .unwrap();
        assert_eq!(settings.application_id, "from-flag");
        assert_eq!(settings.port, 7001);
    }

    #[tokio::test]
    async fn test_resolve_reports_missing_key() {
        let tmp = tempfile::TempDir::new().unwrap();
        let args = ConfigArgs {
            config: tmp.path().join("absent.toml"),
            public_key: None,
            application_id: None,
            bot_token: None,
            api_base_url: None,
        };
        let err = args.resolve(ConfigOverrides::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "missing required setting 'public_key'");
    }
}
