use crate::models::Notification;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Trait for items that can be displayed as tables or JSON
pub trait OutputFormat {
    fn to_table(&self) -> String;
    fn to_json(&self) -> Result<String, serde_json::Error>;
}

/// Row for the pending notifications table
#[derive(Tabled, Serialize, Debug)]
pub struct NotificationRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Type")]
    pub kind: String,
    #[tabled(rename = "Urgency")]
    pub urgency: String,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Blood Type")]
    pub blood_type: String,
    #[tabled(rename = "Hospital")]
    pub hospital: String,
    #[tabled(rename = "Age")]
    pub age: String,
    #[tabled(rename = "Read")]
    pub read: String,
}

impl NotificationRow {
    pub fn from_notification(notification: &Notification, now: DateTime<Utc>) -> Self {
        Self {
            id: notification.id.clone(),
            kind: notification.kind.to_string(),
            urgency: notification.urgency.to_string(),
            title: truncate(&notification.title, 48),
            blood_type: notification.blood_type.clone().unwrap_or_else(|| "-".to_string()),
            hospital: notification
                .hospital_name
                .clone()
                .unwrap_or_else(|| "-".to_string()),
            age: format_age(now - notification.created_at),
            read: if notification.read { "yes" } else { "no" }.to_string(),
        }
    }
}

impl OutputFormat for Vec<Notification> {
    fn to_table(&self) -> String {
        if self.is_empty() {
            return "No notifications found.".to_string();
        }

        let now = Utc::now();
        let rows: Vec<NotificationRow> = self
            .iter()
            .map(|n| NotificationRow::from_notification(n, now))
            .collect();

        Table::new(rows).with(Style::rounded()).to_string()
    }

    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn format_age(age: chrono::TimeDelta) -> String {
    let seconds = age.num_seconds();
    if seconds < 0 {
        "just now".to_string()
    } else if seconds < 60 {
        format!("{}s ago", seconds)
    } else if seconds < 3600 {
        format!("{}m ago", seconds / 60)
    } else if seconds < 86_400 {
        format!("{}h ago", seconds / 3600)
    } else {
        format!("{}d ago", seconds / 86_400)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NotificationType, Urgency};
    use chrono::TimeDelta;

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(TimeDelta::seconds(-5)), "just now");
        assert_eq!(format_age(TimeDelta::seconds(42)), "42s ago");
        assert_eq!(format_age(TimeDelta::seconds(125)), "2m ago");
        assert_eq!(format_age(TimeDelta::hours(3)), "3h ago");
        assert_eq!(format_age(TimeDelta::days(2)), "2d ago");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long title indeed", 10), "a very ...");
    }

    #[test]
    fn test_notification_row_creation() {
        let now = Utc::now();
        let mut notification = Notification::new(
            "n-7",
            NotificationType::BloodRequest,
            "Blood Request at City Hospital",
            "O+ needed",
            now - TimeDelta::minutes(5),
        )
        .with_urgency(Urgency::High);
        notification.blood_type = Some("O+".to_string());

        let row = NotificationRow::from_notification(&notification, now);
        assert_eq!(row.id, "n-7");
        assert_eq!(row.kind, "blood_request");
        assert_eq!(row.urgency, "High");
        assert_eq!(row.blood_type, "O+");
        assert_eq!(row.hospital, "-");
        assert_eq!(row.age, "5m ago");
        assert_eq!(row.read, "no");
    }

    #[test]
    fn test_empty_table() {
        let empty: Vec<Notification> = vec![];
        assert_eq!(empty.to_table(), "No notifications found.");
    }

    #[test]
    fn test_json_output_uses_wire_names() {
        let notifications = vec![Notification::new(
            "n-1",
            NotificationType::EmergencyBroadcast,
            "Emergency",
            "All types needed",
            Utc::now(),
        )];
        let json = notifications.to_json().unwrap();
        assert!(json.contains("\"type\": \"emergency_broadcast\""));
        assert!(json.contains("createdAt"));
    }
}
