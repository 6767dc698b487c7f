use crate::alerts::Presenter;
use crate::api::NotificationClient;
use crate::config::Config;
use crate::models::UserRole;
use crate::poller::Poller;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

/// Poll until Ctrl-C, then stop the poller and let in-flight cycles drain.
pub async fn handle_watch_command(
    config: &Config,
    user: Option<String>,
    role: Option<UserRole>,
    interval_ms: Option<u64>,
) -> Result<()> {
    let user_id = user.unwrap_or_else(|| config.user.user_id.clone());
    let role = role.unwrap_or(config.user.role);
    let interval = interval_ms
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.poller.interval());

    let source = Arc::new(NotificationClient::from_config(
        &config.api,
        config.alerts.demo_session,
    ));
    let presenter = Arc::new(Presenter::from_config(&config.alerts));
    let poller = Poller::new(source, presenter).with_lookback(config.poller.watermark_lookback());

    let Some(handle) = poller.start(&user_id, role, interval) else {
        anyhow::bail!("No user id to watch. Pass --user or run `donorwatch config set user.user_id <ID>`");
    };

    eprintln!(
        "Watching notifications for {} ({}) every {}s. Press Ctrl-C to stop.",
        user_id.trim(),
        role,
        interval.as_secs_f64()
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    tracing::debug!(watermark = %handle.watermark(), "Interrupted, stopping poller");
    handle.stop();
    Ok(())
}
