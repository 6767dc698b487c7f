use crate::error::AlertError;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Kind of event the backend is telling the user about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationType {
    BloodRequest,
    RequestAccepted,
    Appointment,
    Urgent,
    System,
    EmergencyBroadcast,
    EmergencyEscalation,
    /// Anything the backend adds later. Kept so one new type does not
    /// poison a whole batch.
    Other(String),
}

impl NotificationType {
    pub fn as_str(&self) -> &str {
        match self {
            NotificationType::BloodRequest => "blood_request",
            NotificationType::RequestAccepted => "request_accepted",
            NotificationType::Appointment => "appointment",
            NotificationType::Urgent => "urgent",
            NotificationType::System => "system",
            NotificationType::EmergencyBroadcast => "emergency_broadcast",
            NotificationType::EmergencyEscalation => "emergency_escalation",
            NotificationType::Other(other) => other,
        }
    }

    pub fn is_emergency(&self) -> bool {
        matches!(
            self,
            NotificationType::EmergencyBroadcast | NotificationType::EmergencyEscalation
        )
    }
}

impl From<&str> for NotificationType {
    fn from(value: &str) -> Self {
        match value {
            "blood_request" => NotificationType::BloodRequest,
            "request_accepted" => NotificationType::RequestAccepted,
            "appointment" => NotificationType::Appointment,
            "urgent" => NotificationType::Urgent,
            "system" => NotificationType::System,
            "emergency_broadcast" => NotificationType::EmergencyBroadcast,
            "emergency_escalation" => NotificationType::EmergencyEscalation,
            other => NotificationType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NotificationType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// How loudly an alert should be presented. Ordered from quietest to loudest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Urgency::Critical),
            "high" => Ok(Urgency::High),
            "medium" => Ok(Urgency::Medium),
            "low" => Ok(Urgency::Low),
            other => Err(format!(
                "Invalid urgency: {}. Must be 'critical', 'high', 'medium' or 'low'",
                other
            )),
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Urgency::Critical => "Critical",
            Urgency::High => "High",
            Urgency::Medium => "Medium",
            Urgency::Low => "Low",
        };
        f.write_str(name)
    }
}

/// Who is looking at the notifications. Decides which types raise alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Donor,
    Patient,
    Clinic,
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "donor" => Ok(UserRole::Donor),
            "patient" => Ok(UserRole::Patient),
            "clinic" => Ok(UserRole::Clinic),
            other => Err(format!(
                "Invalid role: {}. Must be 'donor', 'patient' or 'clinic'",
                other
            )),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UserRole::Donor => "donor",
            UserRole::Patient => "patient",
            UserRole::Clinic => "clinic",
        };
        f.write_str(name)
    }
}

/// A notification as owned by the backend. Read-only on this side.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
    pub urgency: Urgency,
    pub donor_name: Option<String>,
    pub donor_contact: Option<String>,
    pub donor_message: Option<String>,
    pub distance: Option<String>,
    pub hospital_name: Option<String>,
    pub units_needed: Option<u32>,
    pub blood_type: Option<String>,
    pub emergency_level: Option<u8>,
}

impl Notification {
    /// Minimal notification, mostly for tests and synthetic alerts.
    pub fn new(
        id: impl Into<String>,
        kind: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            message: message.into(),
            created_at,
            read: false,
            urgency: Urgency::default(),
            donor_name: None,
            donor_contact: None,
            donor_message: None,
            distance: None,
            hospital_name: None,
            units_needed: None,
            blood_type: None,
            emergency_level: None,
        }
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    /// Decode one element of the backend payload.
    ///
    /// Each element is decoded on its own so a malformed entry is dropped
    /// without losing the rest of the batch.
    pub fn from_value(value: Value) -> Result<Self, AlertError> {
        let id_hint = value
            .get("id")
            .or_else(|| value.get("_id"))
            .map(|v| value_to_string(v).unwrap_or_default())
            .unwrap_or_default();

        let raw: RawNotification =
            serde_json::from_value(value).map_err(|e| AlertError::MalformedNotification {
                id: id_hint.clone(),
                reason: e.to_string(),
            })?;

        raw.into_notification()
    }
}

/// Wire shape of the `GET /notifications/{userId}` response.
#[derive(Debug, Deserialize)]
pub struct NotificationsEnvelope {
    #[serde(default)]
    pub notifications: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNotification {
    #[serde(alias = "_id")]
    id: Value,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    message: String,
    created_at: Value,
    #[serde(default)]
    read: bool,
    #[serde(default)]
    urgency: Option<String>,
    donor_name: Option<String>,
    donor_contact: Option<String>,
    donor_message: Option<String>,
    distance: Option<Value>,
    hospital_name: Option<String>,
    units_needed: Option<Value>,
    blood_type: Option<String>,
    emergency_level: Option<Value>,
}

impl RawNotification {
    fn into_notification(self) -> Result<Notification, AlertError> {
        let id = value_to_string(&self.id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AlertError::MalformedNotification {
                id: String::new(),
                reason: "missing id".to_string(),
            })?;

        let malformed = |reason: String| AlertError::MalformedNotification {
            id: id.clone(),
            reason,
        };

        let created_at = parse_timestamp(&self.created_at)
            .ok_or_else(|| malformed(format!("unparseable createdAt: {}", self.created_at)))?;

        let urgency = match self.urgency.as_deref() {
            None => Urgency::default(),
            Some(raw) => raw.parse().map_err(malformed)?,
        };

        let units_needed = match &self.units_needed {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                value_to_u64(v)
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| malformed(format!("unparseable unitsNeeded: {}", v)))?,
            ),
        };

        let emergency_level = match &self.emergency_level {
            None | Some(Value::Null) => None,
            Some(v) => {
                let level = value_to_u64(v)
                    .ok_or_else(|| malformed(format!("unparseable emergencyLevel: {}", v)))?;
                Some(level.min(3) as u8)
            }
        };

        Ok(Notification {
            kind: NotificationType::from(self.kind.as_str()),
            title: self.title,
            message: self.message,
            created_at,
            read: self.read,
            urgency,
            donor_name: non_empty(self.donor_name),
            donor_contact: non_empty(self.donor_contact),
            donor_message: non_empty(self.donor_message),
            distance: self.distance.as_ref().and_then(value_to_string),
            hospital_name: non_empty(self.hospital_name),
            units_needed,
            blood_type: non_empty(self.blood_type),
            emergency_level,
            id,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_to_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Accepts RFC 3339 strings and epoch milliseconds.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}
