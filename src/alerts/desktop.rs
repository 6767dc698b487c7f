use crate::error::{AlertError, AlertResult};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// A desktop notification ready to show.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesktopAlert {
    pub title: String,
    pub body: String,
    /// Alerts sharing a tag replace each other instead of stacking.
    pub tag: String,
    /// Stays on screen until the user dismisses it.
    pub require_interaction: bool,
    /// Notify again even when replacing an alert with the same tag.
    pub renotify: bool,
    #[serde(skip)]
    pub auto_close: Option<Duration>,
}

pub trait DesktopNotifier: Send + Sync {
    fn show(&self, alert: &DesktopAlert) -> AlertResult<()>;
}

/// Desktop notifications through the platform notification service.
pub struct NotifyRustDesktop {
    appname: String,
    // tag -> server-side notification id, so a repeat replaces the original
    shown: Mutex<HashMap<String, u32>>,
}

impl NotifyRustDesktop {
    pub fn new() -> Self {
        Self {
            appname: "donorwatch".to_string(),
            shown: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_available() -> bool {
        // Check if the system supports desktop notifications
        #[cfg(target_os = "linux")]
        {
            // Check if we're in a desktop environment
            std::env::var("DISPLAY").is_ok() || std::env::var("WAYLAND_DISPLAY").is_ok()
        }

        #[cfg(any(target_os = "macos", target_os = "windows"))]
        {
            true
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        {
            false
        }
    }

    fn build(&self, alert: &DesktopAlert) -> notify_rust::Notification {
        let (timeout, urgency) = match (alert.require_interaction, alert.auto_close) {
            (true, _) | (false, None) => (notify_rust::Timeout::Never, notify_rust::Urgency::Critical),
            (false, Some(delay)) => (
                notify_rust::Timeout::Milliseconds(delay.as_millis().min(u32::MAX as u128) as u32),
                notify_rust::Urgency::Normal,
            ),
        };

        let icon = if alert.require_interaction {
            "dialog-warning"
        } else {
            "dialog-information"
        };

        let mut notification = notify_rust::Notification::new();
        notification
            .summary(&alert.title)
            .body(&alert.body)
            .timeout(timeout)
            .urgency(urgency)
            .icon(icon)
            .appname(&self.appname);

        if alert.require_interaction {
            notification.action("view", "View Details");
            notification.action("dismiss", "Dismiss");
        }

        notification
    }
}

impl Default for NotifyRustDesktop {
    fn default() -> Self {
        Self::new()
    }
}

impl DesktopNotifier for NotifyRustDesktop {
    #[cfg(all(unix, not(target_os = "macos")))]
    fn show(&self, alert: &DesktopAlert) -> AlertResult<()> {
        let mut notification = self.build(alert);

        let mut shown = self.shown.lock().unwrap_or_else(|e| e.into_inner());
        if !alert.renotify {
            if let Some(&id) = shown.get(&alert.tag) {
                notification.id(id);
            }
        }

        let handle = notification
            .show()
            .map_err(|e| AlertError::Desktop(e.to_string()))?;
        shown.insert(alert.tag.clone(), handle.id());
        Ok(())
    }

    #[cfg(not(all(unix, not(target_os = "macos"))))]
    fn show(&self, alert: &DesktopAlert) -> AlertResult<()> {
        // No replace-by-id outside XDG; remember the tag for bookkeeping only
        self.shown
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(alert.tag.clone(), 0);
        self.build(alert)
            .show()
            .map(|_| ())
            .map_err(|e| AlertError::Desktop(e.to_string()))
    }
}
