use crate::alerts::presenter::build_presentation;
use crate::alerts::{Presenter, classify};
use crate::cli::AlertKindArg;
use crate::config::Config;
use crate::models::{Notification, NotificationType, Urgency, UserRole};
use anyhow::{Context, Result};
use chrono::Utc;

/// A notification of the requested kind, with the viewer role that alerts on it.
pub fn synthetic_notification(
    kind: AlertKindArg,
    urgency: Urgency,
    escalation: bool,
) -> (Notification, UserRole) {
    let now = Utc::now();
    let id = format!("test-{}", now.timestamp_millis());

    match kind {
        AlertKindArg::BloodRequest => {
            let mut n = Notification::new(
                id,
                NotificationType::BloodRequest,
                "Blood Request Near You at City Hospital",
                "O+ needed at City Hospital",
                now,
            )
            .with_urgency(urgency);
            n.distance = Some("2.5 km".to_string());
            n.units_needed = Some(2);
            (n, UserRole::Donor)
        }
        AlertKindArg::Accepted => {
            let mut n = Notification::new(
                id,
                NotificationType::RequestAccepted,
                "Request accepted",
                "Jane Doe has accepted your A- request at General Hospital",
                now,
            )
            .with_urgency(urgency);
            n.donor_contact = Some("555-0100".to_string());
            (n, UserRole::Patient)
        }
        AlertKindArg::Emergency => {
            let kind = if escalation {
                NotificationType::EmergencyEscalation
            } else {
                NotificationType::EmergencyBroadcast
            };
            let mut n = Notification::new(
                id,
                kind,
                "Emergency blood drive",
                "Multiple casualties in Downtown",
                now,
            )
            .with_urgency(urgency);
            n.blood_type = Some("O-".to_string());
            n.hospital_name = Some("Civil Hospital".to_string());
            n.units_needed = Some(10);
            n.emergency_level = escalation.then_some(1);
            (n, UserRole::Clinic)
        }
    }
}

pub fn handle_test_alert_command(
    config: &Config,
    kind: AlertKindArg,
    urgency: Urgency,
    escalation: bool,
    json_output: bool,
) -> Result<()> {
    let (notification, role) = synthetic_notification(kind, urgency, escalation);
    let alert = classify(&notification, role).context("Synthetic notification did not classify")?;

    let presenter = Presenter::from_config(&config.alerts);
    let outcome = presenter.present(&alert);

    if json_output {
        let presentation = build_presentation(&alert, presenter.settings());
        let report = serde_json::json!({
            "outcome": outcome,
            "permission": presenter.permission().to_string(),
            "presentation": presentation,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Test alert ({}, {}): {:?} (permission {})",
            alert.kind.alert_id(),
            urgency,
            outcome,
            presenter.permission()
        );
    }
    Ok(())
}
