// donorwatch: blood donation notification alerts
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use donorwatch::cli::{Cli, Commands};
use donorwatch::commands::{
    handle_config_action, handle_fetch_command, handle_mark_read_command,
    handle_test_alert_command, handle_watch_command,
};
use donorwatch::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise info, or debug with --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => Config::default_path()?,
    };

    // Config subcommands manage the file itself, so they skip the overrides
    let command = match cli.command {
        Commands::Config { action } => {
            handle_config_action(action, &config_path, cli.json);
            return Ok(());
        }
        command => command,
    };

    let mut config = match Config::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load configuration: {e:#}");
            std::process::exit(1);
        }
    };

    // CLI overrides take precedence
    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.trim_end_matches('/').to_string();
    }
    if cli.demo {
        config.alerts.demo_session = true;
    }

    match command {
        Commands::Watch {
            user,
            role,
            interval_ms,
        } => {
            handle_watch_command(&config, user, role, interval_ms).await?;
        }
        Commands::Fetch { user, all } => {
            handle_fetch_command(&config, user, all, cli.json).await?;
        }
        Commands::MarkRead { id } => {
            if !handle_mark_read_command(&config, &id, cli.json).await {
                std::process::exit(1);
            }
        }
        Commands::TestAlert {
            kind,
            urgency,
            escalation,
        } => {
            handle_test_alert_command(&config, kind, urgency, escalation, cli.json)?;
        }
        Commands::Config { .. } => unreachable!("handled before configuration is loaded"),
    }
    Ok(())
}
