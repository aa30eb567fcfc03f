//! Sleet CLI and interaction webhook server entry point.
//!
//! Binary name: `sleet`
//!
//! Parses CLI arguments, initializes tracing, then dispatches to the
//! requested command.

mod builtin;
mod cli;
mod http;
mod state;

use clap::Parser;

use cli::{Cli, Commands};
use sleet_observe::tracing_setup::{TracingConfig, verbosity_filter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbosity flags when set.
    let tracing_config = TracingConfig {
        default_filter: verbosity_filter(cli.quiet, cli.verbose),
        format: cli.log_format,
        otel: matches!(&cli.command, Commands::Serve(args) if args.otel),
    };
    sleet_observe::tracing_setup::init_tracing(&tracing_config)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = match cli.command {
        Commands::Serve(args) => cli::serve::run(args).await,
        Commands::CheckConfig { config, json } => cli::check::run(config, json).await,
    };

    sleet_observe::tracing_setup::shutdown_tracing();
    result
}
