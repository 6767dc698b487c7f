use crate::api::{NotificationClient, NotificationSource};
use crate::config::Config;
use crate::output::OutputFormat;
use anyhow::Result;

pub async fn handle_fetch_command(
    config: &Config,
    user: Option<String>,
    all: bool,
    json_output: bool,
) -> Result<()> {
    let user_id = user.unwrap_or_else(|| config.user.user_id.clone());
    if user_id.trim().is_empty() {
        anyhow::bail!("No user id to fetch for. Pass --user or run `donorwatch config set user.user_id <ID>`");
    }

    let client = NotificationClient::from_config(&config.api, config.alerts.demo_session);
    let mut notifications = client.fetch_notifications(user_id.trim()).await;
    if !all {
        notifications.retain(|n| !n.read);
    }
    notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    if json_output {
        println!("{}", notifications.to_json()?);
    } else {
        println!("{}", notifications.to_table());
    }
    Ok(())
}
