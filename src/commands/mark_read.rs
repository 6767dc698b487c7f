use crate::api::{NotificationClient, NotificationSource};
use crate::config::Config;

/// Returns whether the backend (or a demo session) acknowledged the read.
pub async fn handle_mark_read_command(config: &Config, id: &str, json_output: bool) -> bool {
    let client = NotificationClient::from_config(&config.api, config.alerts.demo_session);
    let success = client.mark_as_read(id).await;

    if json_output {
        println!("{}", serde_json::json!({ "id": id, "success": success }));
    } else if success {
        println!("Marked {} as read", id);
    } else {
        eprintln!("Could not mark {} as read", id);
    }
    success
}
