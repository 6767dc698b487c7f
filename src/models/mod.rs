// Models module
pub mod notification;

pub use notification::{Notification, NotificationType, NotificationsEnvelope, Urgency, UserRole};
