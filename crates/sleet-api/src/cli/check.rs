//! `sleet check-config` -- validate configuration and print a summary.

use anyhow::Result;
use console::style;

use sleet_core::registry::CallbackRegistry;
use sleet_infra::config::ConfigOverrides;

use crate::builtin::register_builtin;
use crate::cli::ConfigArgs;

/// Resolve settings exactly as `serve` would, without binding anything.
pub async fn run(args: ConfigArgs, json: bool) -> Result<()> {
    let settings = args.resolve(ConfigOverrides::default()).await?;

    let registry = CallbackRegistry::new();
    register_builtin(&registry)?;
    let commands = registry.command_names();

    if json {
        let summary = serde_json::json!({
            "config_file": args.config.display().to_string(),
            "application_id": settings.application_id,
            "public_key": settings.public_key,
            "bot_token": settings.bot_token.is_some(),
            "api_base_url": settings.api_base_url,
            "bind": settings.bind_addr(),
            "debug": settings.debug,
            "shutdown_grace_secs": settings.shutdown_grace.as_secs(),
            "auto_defer": {
                "enabled": settings.auto_defer.enabled,
                "timeout_ms": settings.auto_defer.timeout_ms,
                "ephemeral": settings.auto_defer.ephemeral,
            },
            "handlers": registry.len(),
            "commands": commands,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let yes_no = |on: bool| {
        if on {
            style("yes").green().to_string()
        } else {
            style("no").dim().to_string()
        }
    };

    println!();
    println!(
        "  {} Configuration OK ({})",
        style("✓").green().bold(),
        style(args.config.display()).cyan()
    );
    println!();
    println!("  Application id   {}", settings.application_id);
    println!("  Public key       {}", settings.public_key);
    println!("  Bot token        {}", yes_no(settings.bot_token.is_some()));
    println!("  API base URL     {}", settings.api_base_url);
    println!("  Bind             {}", style(settings.bind_addr()).cyan());
    println!("  Payload logging  {}", yes_no(settings.debug));
    println!(
        "  Auto-defer       {} ({} ms, ephemeral: {})",
        yes_no(settings.auto_defer.enabled),
        settings.auto_defer.timeout_ms,
        yes_no(settings.auto_defer.ephemeral)
    );
    println!("  Shutdown grace   {}s", settings.shutdown_grace.as_secs());
    println!(
        "  Handlers         {} ({})",
        registry.len(),
        commands
            .iter()
            .map(|c| format!("/{c}"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!();

    Ok(())
}
