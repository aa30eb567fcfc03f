//! `sleet serve` -- run the interaction webhook server.

use anyhow::Result;
use tracing::{error, info, warn};

use sleet_infra::config::ConfigOverrides;

use crate::cli::ServeArgs;
use crate::http::router::build_router;
use crate::state::AppState;

/// Bind, serve until Ctrl+C / SIGTERM, then drain in-flight follow-ups.
pub async fn run(args: ServeArgs) -> Result<()> {
    let settings = args
        .config
        .resolve(ConfigOverrides {
            host: args.host.clone(),
            port: args.port,
            auto_defer: args.auto_defer,
            ..ConfigOverrides::default()
        })
        .await?;

    let state = AppState::from_settings(&settings)?;
    let listener = tokio::net::TcpListener::bind(settings.bind_addr()).await?;

    info!(
        addr = %listener.local_addr()?,
        auto_defer = settings.auto_defer.enabled,
        defer_timeout_ms = settings.auto_defer.timeout_ms,
        commands = ?state.engine.registry().command_names(),
        "sleet listening"
    );

    let router = build_router(state.clone());
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if !state.engine.deferrer().shutdown(settings.shutdown_grace).await {
        warn!(
            remaining = state.engine.deferrer().in_flight(),
            "follow-ups still running after shutdown grace period"
        );
    }

    info!("server stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
