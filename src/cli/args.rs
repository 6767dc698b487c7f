use crate::models::{Urgency, UserRole};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "donorwatch")]
#[command(about = "Blood donation notification alerts for the desktop")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON output format
    #[arg(long, global = true)]
    pub json: bool,

    /// Treat this as a demo session (mark-as-read always succeeds)
    #[arg(long, global = true)]
    pub demo: bool,

    /// Override the notification API base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Initialize fresh configuration
    Init,
    /// Set configuration value
    Set {
        /// Configuration key (e.g., poller.interval_ms)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AlertKindArg {
    BloodRequest,
    Accepted,
    Emergency,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll for new notifications and raise alerts until interrupted
    Watch {
        /// User to poll for (defaults to user.user_id)
        #[arg(long)]
        user: Option<String>,

        /// Viewer role (donor, patient, clinic)
        #[arg(long)]
        role: Option<UserRole>,

        /// Polling interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Fetch notifications once and list them
    Fetch {
        /// User to fetch for (defaults to user.user_id)
        #[arg(long)]
        user: Option<String>,

        /// Include notifications already marked read
        #[arg(long)]
        all: bool,
    },

    /// Mark a notification as read
    #[command(name = "mark-read")]
    MarkRead {
        /// Notification id
        id: String,
    },

    /// Raise a synthetic alert to check desktop, sound and toast output
    #[command(name = "test-alert")]
    TestAlert {
        /// Alert kind
        #[arg(long, value_enum, default_value = "blood-request")]
        kind: AlertKindArg,

        /// Urgency (low, medium, high, critical)
        #[arg(long, default_value = "high")]
        urgency: Urgency,

        /// Present the emergency as an escalation
        #[arg(long)]
        escalation: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}
