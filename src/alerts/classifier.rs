use crate::alerts::extract::{
    extract_after_at, extract_blood_type, extract_donor_name, extract_location,
    extract_request_hospital,
};
use crate::models::{Notification, NotificationType, Urgency, UserRole};

pub const UNKNOWN_BLOOD_TYPE: &str = "Unknown";
pub const DEFAULT_DONOR_NAME: &str = "A donor";
pub const DEFAULT_ACCEPTED_HOSPITAL: &str = "the hospital";
pub const DEFAULT_REQUEST_HOSPITAL: &str = "a nearby hospital";
pub const ANY_BLOOD_TYPE: &str = "All types";
pub const DEFAULT_EMERGENCY_HOSPITAL: &str = "Multiple hospitals";

/// What to alert about, with the fields each presentation needs already resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertKind {
    BloodRequest {
        hospital: String,
        blood_type: String,
        distance: Option<String>,
        units_needed: Option<u32>,
    },
    RequestAccepted {
        donor_name: String,
        blood_type: String,
        hospital: String,
        donor_contact: Option<String>,
        donor_message: Option<String>,
    },
    Emergency {
        blood_type: String,
        hospital: String,
        units_needed: Option<u32>,
        location: Option<String>,
        level: u8,
    },
}

impl AlertKind {
    pub fn alert_id(&self) -> &'static str {
        match self {
            AlertKind::BloodRequest { .. } => "blood-request",
            AlertKind::RequestAccepted { .. } => "request-accepted",
            AlertKind::Emergency { .. } => "emergency",
        }
    }

    /// Emergency with a non-zero level. Allowed to notify again under the same tag.
    pub fn is_escalation(&self) -> bool {
        matches!(self, AlertKind::Emergency { level, .. } if *level > 0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedAlert {
    pub notification_id: String,
    pub urgency: Urgency,
    pub message: String,
    pub kind: AlertKind,
}

/// Decide whether `notification` should alert a viewer with `role`, and how.
///
/// Returns `None` for every `(type, role)` pair that has no alert.
pub fn classify(notification: &Notification, role: UserRole) -> Option<ClassifiedAlert> {
    let kind = match (&notification.kind, role) {
        (NotificationType::BloodRequest, UserRole::Donor) => blood_request(notification),
        (NotificationType::RequestAccepted, UserRole::Patient | UserRole::Clinic) => {
            request_accepted(notification)
        }
        (kind, _) if kind.is_emergency() => emergency(notification),
        _ => return None,
    };

    Some(ClassifiedAlert {
        notification_id: notification.id.clone(),
        urgency: notification.urgency,
        message: notification.message.clone(),
        kind,
    })
}

fn blood_request(notification: &Notification) -> AlertKind {
    let blood_type = notification
        .blood_type
        .clone()
        .or_else(|| extract_blood_type(&notification.message))
        .or_else(|| extract_blood_type(&notification.title))
        .unwrap_or_else(|| UNKNOWN_BLOOD_TYPE.to_string());

    let hospital = notification
        .hospital_name
        .clone()
        .or_else(|| extract_request_hospital(&notification.title, &notification.message))
        .unwrap_or_else(|| DEFAULT_REQUEST_HOSPITAL.to_string());

    AlertKind::BloodRequest {
        hospital,
        blood_type,
        distance: notification.distance.clone(),
        units_needed: notification.units_needed,
    }
}

fn request_accepted(notification: &Notification) -> AlertKind {
    let donor_name = notification
        .donor_name
        .clone()
        .or_else(|| extract_donor_name(&notification.message))
        .unwrap_or_else(|| DEFAULT_DONOR_NAME.to_string());

    let blood_type = notification
        .blood_type
        .clone()
        .or_else(|| extract_blood_type(&notification.message))
        .unwrap_or_else(|| UNKNOWN_BLOOD_TYPE.to_string());

    let hospital = notification
        .hospital_name
        .clone()
        .or_else(|| extract_after_at(&notification.message))
        .unwrap_or_else(|| DEFAULT_ACCEPTED_HOSPITAL.to_string());

    AlertKind::RequestAccepted {
        donor_name,
        blood_type,
        hospital,
        donor_contact: notification.donor_contact.clone(),
        donor_message: notification.donor_message.clone(),
    }
}

fn emergency(notification: &Notification) -> AlertKind {
    AlertKind::Emergency {
        blood_type: notification
            .blood_type
            .clone()
            .unwrap_or_else(|| ANY_BLOOD_TYPE.to_string()),
        hospital: notification
            .hospital_name
            .clone()
            .unwrap_or_else(|| DEFAULT_EMERGENCY_HOSPITAL.to_string()),
        units_needed: notification.units_needed,
        location: extract_location(&notification.message),
        level: notification.emergency_level.unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn notification(kind: NotificationType, title: &str, message: &str) -> Notification {
        Notification::new("n-1", kind, title, message, Utc::now())
    }

    #[test]
    fn test_blood_request_for_donor_uses_text_fallbacks() {
        let n = notification(
            NotificationType::BloodRequest,
            "Critical Blood Request Near You at City Hospital - O+ needed",
            "Critical Blood Request Near You at City Hospital - O+ needed",
        )
        .with_urgency(Urgency::Critical);

        let alert = classify(&n, UserRole::Donor).unwrap();
        assert_eq!(alert.urgency, Urgency::Critical);
        assert_eq!(
            alert.kind,
            AlertKind::BloodRequest {
                hospital: "City Hospital".to_string(),
                blood_type: "O+".to_string(),
                distance: None,
                units_needed: None,
            }
        );
    }

    #[test]
    fn test_blood_request_prefers_structured_fields() {
        let mut n = notification(
            NotificationType::BloodRequest,
            "Blood Request at Wrong Place",
            "A- needed at Wrong Place",
        );
        n.blood_type = Some("B+".to_string());
        n.hospital_name = Some("Right Hospital".to_string());
        n.distance = Some("2.4 km".to_string());

        match classify(&n, UserRole::Donor).unwrap().kind {
            AlertKind::BloodRequest {
                hospital,
                blood_type,
                distance,
                ..
            } => {
                assert_eq!(hospital, "Right Hospital");
                assert_eq!(blood_type, "B+");
                assert_eq!(distance.as_deref(), Some("2.4 km"));
            }
            other => panic!("Unexpected alert: {:?}", other),
        }
    }

    #[test]
    fn test_blood_request_defaults() {
        let n = notification(NotificationType::BloodRequest, "Help", "Please donate");
        match classify(&n, UserRole::Donor).unwrap().kind {
            AlertKind::BloodRequest {
                hospital,
                blood_type,
                ..
            } => {
                assert_eq!(hospital, DEFAULT_REQUEST_HOSPITAL);
                assert_eq!(blood_type, UNKNOWN_BLOOD_TYPE);
            }
            other => panic!("Unexpected alert: {:?}", other),
        }
    }

    #[test]
    fn test_blood_request_ignored_for_other_roles() {
        let n = notification(NotificationType::BloodRequest, "t", "O+ at City Hospital");
        assert!(classify(&n, UserRole::Patient).is_none());
        assert!(classify(&n, UserRole::Clinic).is_none());
    }

    #[test]
    fn test_request_accepted_for_patient_and_clinic() {
        let n = notification(
            NotificationType::RequestAccepted,
            "Request accepted",
            "Jane Doe has accepted your AB- request at Fortis Hospital",
        );

        for role in [UserRole::Patient, UserRole::Clinic] {
            let alert = classify(&n, role).unwrap();
            assert_eq!(
                alert.kind,
                AlertKind::RequestAccepted {
                    donor_name: "Jane Doe".to_string(),
                    blood_type: "AB-".to_string(),
                    hospital: "Fortis Hospital".to_string(),
                    donor_contact: None,
                    donor_message: None,
                }
            );
        }
        assert!(classify(&n, UserRole::Donor).is_none());
    }

    #[test]
    fn test_request_accepted_defaults() {
        let n = notification(
            NotificationType::RequestAccepted,
            "Accepted",
            "Your request was accepted",
        );
        match classify(&n, UserRole::Patient).unwrap().kind {
            AlertKind::RequestAccepted {
                donor_name,
                blood_type,
                hospital,
                ..
            } => {
                assert_eq!(donor_name, DEFAULT_DONOR_NAME);
                assert_eq!(blood_type, UNKNOWN_BLOOD_TYPE);
                assert_eq!(hospital, DEFAULT_ACCEPTED_HOSPITAL);
            }
            other => panic!("Unexpected alert: {:?}", other),
        }
    }

    #[test]
    fn test_emergency_for_any_role() {
        let mut n = notification(
            NotificationType::EmergencyBroadcast,
            "Emergency",
            "Bus accident in Nashik - donors needed",
        );
        n.blood_type = Some("O-".to_string());
        n.hospital_name = Some("Civil Hospital".to_string());
        n.units_needed = Some(20);

        for role in [UserRole::Donor, UserRole::Patient, UserRole::Clinic] {
            let alert = classify(&n, role).unwrap();
            assert!(!alert.kind.is_escalation());
            assert_eq!(
                alert.kind,
                AlertKind::Emergency {
                    blood_type: "O-".to_string(),
                    hospital: "Civil Hospital".to_string(),
                    units_needed: Some(20),
                    location: Some("Nashik".to_string()),
                    level: 0,
                }
            );
        }
    }

    #[test]
    fn test_escalation_depends_on_level() {
        let mut n = notification(NotificationType::EmergencyEscalation, "Escalated", "Still short");
        assert!(!classify(&n, UserRole::Donor).unwrap().kind.is_escalation());

        n.emergency_level = Some(2);
        let alert = classify(&n, UserRole::Donor).unwrap();
        assert!(alert.kind.is_escalation());
        assert_eq!(alert.kind.alert_id(), "emergency");
    }

    #[test]
    fn test_other_types_are_ignored() {
        for kind in [
            NotificationType::Appointment,
            NotificationType::Urgent,
            NotificationType::System,
            NotificationType::Other("promo".to_string()),
        ] {
            let n = notification(kind, "t", "m");
            for role in [UserRole::Donor, UserRole::Patient, UserRole::Clinic] {
                assert!(classify(&n, role).is_none());
            }
        }
    }
}
