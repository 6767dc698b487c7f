use crate::alerts::presenter::Permission;
use crate::models::UserRole;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub poller: PollerConfig,
    pub alerts: AlertsConfig,
    pub user: UserConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub fetch_timeout_ms: u64,
    pub mark_read_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    pub interval_ms: u64,
    pub watermark_lookback_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    pub notifications_enabled: bool,
    pub demo_session: bool,
    pub sound_enabled: bool,
    pub permission: Permission,
    pub general_auto_close_ms: u64,
    pub emergency_auto_close_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    pub user_id: String,
    pub role: UserRole,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:5000/api".to_string(),
                fetch_timeout_ms: 3000,
                mark_read_timeout_ms: 2000,
            },
            poller: PollerConfig {
                interval_ms: 30_000,
                watermark_lookback_secs: 60,
            },
            alerts: AlertsConfig {
                notifications_enabled: true,
                demo_session: false,
                sound_enabled: true,
                permission: Permission::Default,
                general_auto_close_ms: 8_000,
                emergency_auto_close_ms: 120_000,
            },
            user: UserConfig {
                user_id: String::new(),
                role: UserRole::Donor,
            },
        }
    }
}

impl ApiConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn mark_read_timeout(&self) -> Duration {
        Duration::from_millis(self.mark_read_timeout_ms)
    }
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn watermark_lookback(&self) -> Duration {
        Duration::from_secs(self.watermark_lookback_secs)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from an explicit path, writing defaults there if it does not exist yet.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create config directory: {}", parent.display())
                })?;
            }
        }

        let contents = self.to_commented_toml()?;

        fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Generate TOML configuration with comments explaining every option
    pub fn to_commented_toml(&self) -> Result<String> {
        let mut output = String::new();

        output.push_str("# donorwatch Configuration File\n");
        output.push_str("# Blood-donation notification agent - Configuration Options\n");
        output.push_str("#\n");
        output.push_str("# All settings have sensible defaults and several can be overridden via CLI flags.\n");
        output.push_str("\n");

        output.push_str("# =============================================================================\n");
        output.push_str("# API SETTINGS\n");
        output.push_str("# =============================================================================\n");
        output.push_str("\n");
        output.push_str("[api]\n");
        output.push_str("# Base URL of the coordination backend\n");
        output.push_str("# Notifications are read from {base_url}/notifications/{user_id}\n");
        output.push_str(&format!("base_url = {}\n", toml_string(&self.api.base_url)));
        output.push_str("\n");
        output.push_str("# How long to wait for the notification list before giving up (milliseconds)\n");
        output.push_str("# A timed-out fetch is treated exactly like an empty list\n");
        output.push_str(&format!("fetch_timeout_ms = {}\n", self.api.fetch_timeout_ms));
        output.push_str("\n");
        output.push_str("# How long to wait for a mark-as-read acknowledgment (milliseconds)\n");
        output.push_str(&format!("mark_read_timeout_ms = {}\n", self.api.mark_read_timeout_ms));
        output.push_str("\n");

        output.push_str("# =============================================================================\n");
        output.push_str("# POLLER SETTINGS\n");
        output.push_str("# =============================================================================\n");
        output.push_str("\n");
        output.push_str("[poller]\n");
        output.push_str("# Delay between polling cycles (milliseconds)\n");
        output.push_str("# Default: 30000 (30 seconds)\n");
        output.push_str(&format!("interval_ms = {}\n", self.poller.interval_ms));
        output.push_str("\n");
        output.push_str("# On start, notifications created within this many seconds are still alerted\n");
        output.push_str("# Older notifications are considered already seen\n");
        output.push_str(&format!(
            "watermark_lookback_secs = {}\n",
            self.poller.watermark_lookback_secs
        ));
        output.push_str("\n");

        output.push_str("# =============================================================================\n");
        output.push_str("# ALERT SETTINGS\n");
        output.push_str("# =============================================================================\n");
        output.push_str("\n");
        output.push_str("[alerts]\n");
        output.push_str("# Master switch for alerts. Both this and a granted permission are required\n");
        output.push_str(&format!(
            "notifications_enabled = {}\n",
            self.alerts.notifications_enabled
        ));
        output.push_str("\n");
        output.push_str("# Demo sessions always report mark-as-read as successful\n");
        output.push_str(&format!("demo_session = {}\n", self.alerts.demo_session));
        output.push_str("\n");
        output.push_str("# Play a synthesized tone pattern with each alert\n");
        output.push_str("# Critical: 3 tones, High: 2 tones, Medium/Low: 1 tone\n");
        output.push_str(&format!("sound_enabled = {}\n", self.alerts.sound_enabled));
        output.push_str("\n");
        output.push_str("# Desktop notification permission:\n");
        output.push_str("#   \"default\" - Ask on the first alert (check the notification service)\n");
        output.push_str("#   \"granted\" - Always show desktop notifications\n");
        output.push_str("#   \"denied\"  - Never show desktop notifications (toasts only)\n");
        output.push_str(&format!("permission = \"{}\"\n", self.alerts.permission));
        output.push_str("\n");
        output.push_str("# Auto-close delay for non-critical desktop notifications (milliseconds)\n");
        output.push_str("# Critical alerts always stay until dismissed\n");
        output.push_str(&format!(
            "general_auto_close_ms = {}\n",
            self.alerts.general_auto_close_ms
        ));
        output.push_str(&format!(
            "emergency_auto_close_ms = {}\n",
            self.alerts.emergency_auto_close_ms
        ));
        output.push_str("\n");

        output.push_str("# =============================================================================\n");
        output.push_str("# USER SETTINGS\n");
        output.push_str("# =============================================================================\n");
        output.push_str("\n");
        output.push_str("[user]\n");
        output.push_str("# Account whose notifications are polled. Empty disables polling\n");
        output.push_str(&format!("user_id = {}\n", toml_string(&self.user.user_id)));
        output.push_str("\n");
        output.push_str("# Viewer role: \"donor\", \"patient\" or \"clinic\"\n");
        output.push_str("# Donors are alerted on blood requests, patients and clinics on acceptances\n");
        output.push_str(&format!("role = \"{}\"\n", self.user.role));
        output.push_str("\n");

        output.push_str("# =============================================================================\n");
        output.push_str("# USAGE NOTES\n");
        output.push_str("# =============================================================================\n");
        output.push_str("#\n");
        output.push_str("# Command-line flags override these configuration values:\n");
        output.push_str("#   --base-url URL         Override api.base_url\n");
        output.push_str("#   --demo                 Force a demo session\n");
        output.push_str("#   --config /path/file    Use different config file\n");
        output.push_str("#\n");
        output.push_str("# To reset to defaults: donorwatch config init\n");
        output.push_str("# To modify values:     donorwatch config set user.role clinic\n");
        output.push_str("# To view current:      donorwatch config show\n");

        Ok(output)
    }

    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(home.join(".config").join("donorwatch").join("config.toml"))
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api.base_url" => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    anyhow::bail!("Invalid base_url: {}. Must start with http:// or https://", value);
                }
                self.api.base_url = value.trim_end_matches('/').to_string();
            }
            "api.fetch_timeout_ms" => {
                self.api.fetch_timeout_ms = parse_positive(value, "timeout")?;
            }
            "api.mark_read_timeout_ms" => {
                self.api.mark_read_timeout_ms = parse_positive(value, "timeout")?;
            }
            "poller.interval_ms" => {
                self.poller.interval_ms = parse_positive(value, "interval")?;
            }
            "poller.watermark_lookback_secs" => {
                self.poller.watermark_lookback_secs = value
                    .parse()
                    .with_context(|| format!("Invalid lookback value: {}", value))?;
            }
            "alerts.notifications_enabled" => {
                self.alerts.notifications_enabled = parse_bool(value)?;
            }
            "alerts.demo_session" => self.alerts.demo_session = parse_bool(value)?,
            "alerts.sound_enabled" => self.alerts.sound_enabled = parse_bool(value)?,
            "alerts.permission" => {
                self.alerts.permission = value.parse().map_err(anyhow::Error::msg)?;
            }
            "alerts.general_auto_close_ms" => {
                self.alerts.general_auto_close_ms = parse_positive(value, "delay")?;
            }
            "alerts.emergency_auto_close_ms" => {
                self.alerts.emergency_auto_close_ms = parse_positive(value, "delay")?;
            }
            "user.user_id" => self.user.user_id = value.trim().to_string(),
            "user.role" => self.user.role = value.parse().map_err(anyhow::Error::msg)?,
            _ => anyhow::bail!("Unknown configuration key: {}", key),
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    value
        .parse()
        .with_context(|| format!("Invalid boolean value: {}", value))
}

fn parse_positive(value: &str, what: &str) -> Result<u64> {
    let parsed: u64 = value
        .parse()
        .with_context(|| format!("Invalid {} value: {}", what, value))?;
    if parsed == 0 {
        anyhow::bail!("The {} must be greater than 0", what);
    }
    Ok(parsed)
}

fn toml_string(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}
