use crate::error::AlertResult;
use crate::models::Urgency;
use chrono::{Local, TimeDelta};
use crossterm::style::{Attribute, Color, Stylize};
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastSeverity {
    Error,
    Warning,
    Info,
}

impl ToastSeverity {
    pub fn to_color(&self) -> Color {
        match self {
            ToastSeverity::Error => Color::Red,
            ToastSeverity::Warning => Color::Yellow,
            ToastSeverity::Info => Color::Cyan,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ToastSeverity::Error => "ERROR",
            ToastSeverity::Warning => "WARN",
            ToastSeverity::Info => "INFO",
        }
    }
}

/// Transient in-app message shown alongside the desktop notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toast {
    pub severity: ToastSeverity,
    pub title: String,
    pub message: String,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

impl Toast {
    /// Severity and lifetime scale with urgency; Critical is the longest and loudest.
    pub fn for_urgency(urgency: Urgency, title: impl Into<String>, message: impl Into<String>) -> Self {
        let (severity, seconds) = match urgency {
            Urgency::Critical => (ToastSeverity::Error, 15),
            Urgency::High => (ToastSeverity::Warning, 10),
            Urgency::Medium => (ToastSeverity::Info, 7),
            Urgency::Low => (ToastSeverity::Info, 5),
        };

        Self {
            severity,
            title: title.into(),
            message: message.into(),
            duration: Duration::from_secs(seconds),
        }
    }
}

pub trait Toaster: Send + Sync {
    fn show(&self, toast: &Toast) -> AlertResult<()>;
}

/// Writes toasts to stderr, colored by severity when `colored` is set.
#[derive(Debug)]
pub struct TerminalToaster {
    colored: bool,
}

impl TerminalToaster {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    pub fn render(&self, toast: &Toast) -> String {
        let until = Local::now()
            + TimeDelta::from_std(toast.duration).unwrap_or_else(|_| TimeDelta::zero());
        let label = format!("[{}]", toast.severity.label());
        let expiry = format!("(until {})", until.format("%H:%M:%S"));

        if self.colored {
            format!(
                "{} {} {} {}",
                label.with(toast.severity.to_color()).attribute(Attribute::Bold),
                toast.title.clone().attribute(Attribute::Bold),
                toast.message,
                expiry.dark_grey()
            )
        } else {
            format!("{} {} {} {}", label, toast.title, toast.message, expiry)
        }
    }
}

impl Default for TerminalToaster {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Toaster for TerminalToaster {
    fn show(&self, toast: &Toast) -> AlertResult<()> {
        let line = self.render(toast);
        let mut stderr = std::io::stderr().lock();
        // A closed stderr is not worth failing an alert over
        let _ = writeln!(stderr, "{}", line);
        Ok(())
    }
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}
