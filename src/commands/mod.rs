// Command handlers module
pub mod config;
pub mod fetch;
pub mod mark_read;
pub mod test_alert;
pub mod watch;

// Re-export command handlers for easy access
pub use config::handle_config_action;
pub use fetch::handle_fetch_command;
pub use mark_read::handle_mark_read_command;
pub use test_alert::handle_test_alert_command;
pub use watch::handle_watch_command;
