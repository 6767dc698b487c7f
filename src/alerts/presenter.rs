use crate::alerts::audio::{AudioCue, CuePlayer, SilentPlayer};
use crate::alerts::classifier::{AlertKind, ClassifiedAlert};
use crate::alerts::desktop::{DesktopAlert, DesktopNotifier, NotifyRustDesktop};
use crate::alerts::toast::{TerminalToaster, Toast, Toaster};
use crate::config::settings::AlertsConfig;
use crate::error::AlertError;
use crate::models::Urgency;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const GENERAL_AUTO_CLOSE: Duration = Duration::from_secs(8);
pub const EMERGENCY_AUTO_CLOSE: Duration = Duration::from_secs(120);

/// Desktop notification permission, tri-state like the browser API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Default,
    Granted,
    Denied,
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Permission::Default),
            "granted" => Ok(Permission::Granted),
            "denied" => Ok(Permission::Denied),
            other => Err(format!(
                "Invalid permission: {}. Must be 'default', 'granted' or 'denied'",
                other
            )),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Permission::Default => "default",
            Permission::Granted => "granted",
            Permission::Denied => "denied",
        };
        f.write_str(name)
    }
}

/// Asked once, on the first alert, when permission is still undecided.
pub trait PermissionPrompt: Send + Sync {
    fn request(&self) -> Permission;
}

/// Grants permission when a desktop session is reachable.
#[derive(Debug, Default)]
pub struct DesktopSessionProbe;

impl PermissionPrompt for DesktopSessionProbe {
    fn request(&self) -> Permission {
        if NotifyRustDesktop::is_available() {
            Permission::Granted
        } else {
            Permission::Denied
        }
    }
}

#[derive(Debug, Clone)]
pub struct PresenterSettings {
    pub notifications_enabled: bool,
    pub sound_enabled: bool,
    pub general_auto_close: Duration,
    pub emergency_auto_close: Duration,
}

impl Default for PresenterSettings {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            sound_enabled: true,
            general_auto_close: GENERAL_AUTO_CLOSE,
            emergency_auto_close: EMERGENCY_AUTO_CLOSE,
        }
    }
}

impl From<&AlertsConfig> for PresenterSettings {
    fn from(config: &AlertsConfig) -> Self {
        Self {
            notifications_enabled: config.notifications_enabled,
            sound_enabled: config.sound_enabled,
            general_auto_close: Duration::from_millis(config.general_auto_close_ms),
            emergency_auto_close: Duration::from_millis(config.emergency_auto_close_ms),
        }
    }
}

/// Everything shown for one alert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Presentation {
    pub desktop: DesktopAlert,
    #[serde(skip)]
    pub cue: AudioCue,
    pub toast: Toast,
}

/// Build the desktop notification, audio cue and toast for a classified alert.
pub fn build_presentation(alert: &ClassifiedAlert, settings: &PresenterSettings) -> Presentation {
    let critical = alert.urgency == Urgency::Critical;

    let (title, body, tag) = match &alert.kind {
        AlertKind::BloodRequest {
            hospital,
            blood_type,
            distance,
            units_needed,
        } => {
            let mut title = format!("Blood Request: {} needed", blood_type);
            if critical {
                title = format!("CRITICAL {}", title);
            }
            let mut body = format!("{} needs {} blood", hospital, blood_type);
            if let Some(distance) = distance {
                body.push_str(&format!(" ({} away)", distance));
            }
            if let Some(units) = units_needed {
                body.push_str(&format!(". {} units needed", units));
            }
            body.push_str(". Can you help?");
            (title, body, tag_for(alert.kind.alert_id(), hospital, blood_type))
        }
        AlertKind::RequestAccepted {
            donor_name,
            blood_type,
            hospital,
            donor_contact,
            donor_message,
        } => {
            let title = "Request Accepted".to_string();
            let mut body = format!(
                "{} accepted your {} blood request at {}",
                donor_name, blood_type, hospital
            );
            if let Some(contact) = donor_contact {
                body.push_str(&format!(". Contact: {}", contact));
            }
            if let Some(message) = donor_message {
                body.push_str(&format!(". \"{}\"", message));
            }
            (title, body, tag_for(alert.kind.alert_id(), hospital, blood_type))
        }
        AlertKind::Emergency {
            blood_type,
            hospital,
            units_needed,
            location,
            level,
        } => {
            let mut title = format!("EMERGENCY: {} blood needed", blood_type);
            if *level > 0 {
                title = format!("ESCALATED (Level {}) {}", level, title);
            }
            let mut body = match units_needed {
                Some(units) => format!("{} units of {} needed at {}", units, blood_type, hospital),
                None => format!("{} needed at {}", blood_type, hospital),
            };
            if let Some(location) = location {
                body.push_str(&format!(" in {}", location));
            }
            (title, body, tag_for(alert.kind.alert_id(), hospital, blood_type))
        }
    };

    let auto_close = if critical {
        None
    } else if matches!(alert.kind, AlertKind::Emergency { .. }) {
        Some(settings.emergency_auto_close)
    } else {
        Some(settings.general_auto_close)
    };

    let toast = Toast::for_urgency(alert.urgency, title.clone(), body.clone());

    Presentation {
        desktop: DesktopAlert {
            title,
            body,
            tag,
            require_interaction: critical,
            renotify: alert.kind.is_escalation(),
            auto_close,
        },
        cue: AudioCue::for_urgency(alert.urgency),
        toast,
    }
}

fn tag_for(kind: &str, hospital: &str, blood_type: &str) -> String {
    let slug = |text: &str| {
        text.split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
            .to_lowercase()
    };
    format!("{}-{}-{}", kind, slug(hospital), slug(blood_type))
}

/// What happened to an alert handed to the presenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentOutcome {
    /// The user switched alerts off.
    Disabled,
    /// Desktop permission was denied, nothing was shown.
    PermissionDenied,
    /// Delivered, replacing a same-tag desktop notification that may still be on screen.
    Replaced,
    Delivered,
}

pub struct Presenter {
    settings: PresenterSettings,
    permission: Mutex<Permission>,
    prompt: Box<dyn PermissionPrompt>,
    desktop: Box<dyn DesktopNotifier>,
    player: Box<dyn CuePlayer>,
    toaster: Box<dyn Toaster>,
    // tag -> when its desktop notification auto-closes; `None` stays until dismissed
    on_screen: Mutex<HashMap<String, Option<Instant>>>,
}

impl Presenter {
    pub fn new(
        settings: PresenterSettings,
        permission: Permission,
        prompt: Box<dyn PermissionPrompt>,
        desktop: Box<dyn DesktopNotifier>,
        player: Box<dyn CuePlayer>,
        toaster: Box<dyn Toaster>,
    ) -> Self {
        Self {
            settings,
            permission: Mutex::new(permission),
            prompt,
            desktop,
            player,
            toaster,
            on_screen: Mutex::new(HashMap::new()),
        }
    }

    /// Presenter wired to the real desktop, audio device (when compiled in) and terminal.
    pub fn from_config(config: &AlertsConfig) -> Self {
        Self::new(
            PresenterSettings::from(config),
            config.permission,
            Box::new(DesktopSessionProbe),
            Box::new(NotifyRustDesktop::new()),
            default_player(config.sound_enabled),
            Box::new(TerminalToaster::default()),
        )
    }

    pub fn settings(&self) -> &PresenterSettings {
        &self.settings
    }

    pub fn permission(&self) -> Permission {
        *self.permission.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Resolve permission, asking the prompt only while still undecided.
    fn ensure_permission(&self) -> Permission {
        let mut permission = self.permission.lock().unwrap_or_else(|e| e.into_inner());
        if *permission == Permission::Default {
            let resolved = self.prompt.request();
            tracing::info!(permission = %resolved, "Desktop notification permission resolved");
            *permission = resolved;
        }
        *permission
    }

    /// Record `alert` as shown. True when a same-tag notification may still be on screen
    /// and this one replaces it instead of re-notifying.
    fn track_on_screen(&self, alert: &DesktopAlert) -> bool {
        let now = Instant::now();
        let mut on_screen = self.on_screen.lock().unwrap_or_else(|e| e.into_inner());
        on_screen.retain(|_, closes_at| closes_at.is_none_or(|at| at > now));

        let replaced = on_screen.contains_key(&alert.tag) && !alert.renotify;
        let closes_at = alert.auto_close.and_then(|delay| now.checked_add(delay));
        on_screen.insert(alert.tag.clone(), closes_at);
        replaced
    }

    /// Show an alert. Delivery failures are logged and never returned.
    ///
    /// Blocks on the desktop notification service and, the first time, on the
    /// permission prompt. Async callers run it on a blocking thread.
    pub fn present(&self, alert: &ClassifiedAlert) -> PresentOutcome {
        if !self.settings.notifications_enabled {
            tracing::debug!(id = %alert.notification_id, "Notifications disabled, skipping alert");
            return PresentOutcome::Disabled;
        }

        if self.ensure_permission() != Permission::Granted {
            tracing::debug!(id = %alert.notification_id, "{}", AlertError::PermissionDenied);
            return PresentOutcome::PermissionDenied;
        }

        let presentation = build_presentation(alert, &self.settings);

        if let Err(e) = self.toaster.show(&presentation.toast) {
            tracing::warn!("Toast failed: {e}");
        }

        let replaced = self.track_on_screen(&presentation.desktop);
        if let Err(e) = self.desktop.show(&presentation.desktop) {
            tracing::warn!(tag = %presentation.desktop.tag, "Desktop notification failed: {e}");
        }

        if self.settings.sound_enabled {
            if let Err(e) = self.player.play(&presentation.cue) {
                tracing::warn!("Audio cue failed: {e}");
            }
        }

        tracing::info!(
            id = %alert.notification_id,
            kind = alert.kind.alert_id(),
            urgency = %alert.urgency,
            replaced,
            "Alert delivered"
        );
        if replaced {
            PresentOutcome::Replaced
        } else {
            PresentOutcome::Delivered
        }
    }
}

#[cfg(feature = "audio")]
fn default_player(sound_enabled: bool) -> Box<dyn CuePlayer> {
    if sound_enabled {
        Box::new(crate::alerts::audio::DevicePlayer)
    } else {
        Box::new(SilentPlayer)
    }
}

#[cfg(not(feature = "audio"))]
fn default_player(_sound_enabled: bool) -> Box<dyn CuePlayer> {
    Box::new(SilentPlayer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AlertResult;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default, Clone)]
    struct Recorder {
        desktop: Arc<Mutex<Vec<DesktopAlert>>>,
        cues: Arc<AtomicUsize>,
        toasts: Arc<Mutex<Vec<Toast>>>,
        prompts: Arc<AtomicUsize>,
    }

    struct FixedPrompt(Permission, Recorder);

    impl PermissionPrompt for FixedPrompt {
        fn request(&self) -> Permission {
            self.1.prompts.fetch_add(1, Ordering::SeqCst);
            self.0
        }
    }

    struct RecordingDesktop(Recorder, bool);

    impl DesktopNotifier for RecordingDesktop {
        fn show(&self, alert: &DesktopAlert) -> AlertResult<()> {
            self.0.desktop.lock().unwrap().push(alert.clone());
            if self.1 {
                Err(AlertError::Desktop("no notification daemon".to_string()))
            } else {
                Ok(())
            }
        }
    }

    struct CountingPlayer(Recorder);

    impl CuePlayer for CountingPlayer {
        fn play(&self, _cue: &AudioCue) -> AlertResult<()> {
            self.0.cues.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct RecordingToaster(Recorder);

    impl Toaster for RecordingToaster {
        fn show(&self, toast: &Toast) -> AlertResult<()> {
            self.0.toasts.lock().unwrap().push(toast.clone());
            Ok(())
        }
    }

    fn presenter(settings: PresenterSettings, initial: Permission, answer: Permission) -> (Presenter, Recorder) {
        presenter_with_failing_desktop(settings, initial, answer, false)
    }

    fn presenter_with_failing_desktop(
        settings: PresenterSettings,
        initial: Permission,
        answer: Permission,
        desktop_fails: bool,
    ) -> (Presenter, Recorder) {
        let recorder = Recorder::default();
        let presenter = Presenter::new(
            settings,
            initial,
            Box::new(FixedPrompt(answer, recorder.clone())),
            Box::new(RecordingDesktop(recorder.clone(), desktop_fails)),
            Box::new(CountingPlayer(recorder.clone())),
            Box::new(RecordingToaster(recorder.clone())),
        );
        (presenter, recorder)
    }

    fn blood_request(urgency: Urgency) -> ClassifiedAlert {
        ClassifiedAlert {
            notification_id: "n-1".to_string(),
            urgency,
            message: String::new(),
            kind: AlertKind::BloodRequest {
                hospital: "City Hospital".to_string(),
                blood_type: "O+".to_string(),
                distance: Some("3 km".to_string()),
                units_needed: Some(2),
            },
        }
    }

    fn emergency(urgency: Urgency, level: u8) -> ClassifiedAlert {
        ClassifiedAlert {
            notification_id: "e-1".to_string(),
            urgency,
            message: String::new(),
            kind: AlertKind::Emergency {
                blood_type: "O-".to_string(),
                hospital: "Civil Hospital".to_string(),
                units_needed: Some(10),
                location: Some("Nashik".to_string()),
                level,
            },
        }
    }

    #[test]
    fn test_critical_blood_request_never_auto_closes() {
        let p = build_presentation(&blood_request(Urgency::Critical), &PresenterSettings::default());
        assert!(p.desktop.require_interaction);
        assert_eq!(p.desktop.auto_close, None);
        assert!(p.desktop.title.starts_with("CRITICAL"));
        assert_eq!(p.desktop.tag, "blood-request-city-hospital-o+");
        assert_eq!(p.cue.tones.len(), 3);
        assert_eq!(p.toast.severity, crate::alerts::toast::ToastSeverity::Error);
    }

    #[test]
    fn test_non_critical_auto_close_delays() {
        let settings = PresenterSettings::default();

        let p = build_presentation(&blood_request(Urgency::High), &settings);
        assert!(!p.desktop.require_interaction);
        assert_eq!(p.desktop.auto_close, Some(GENERAL_AUTO_CLOSE));
        assert_eq!(p.cue.tones.len(), 2);
        assert!(p.desktop.body.contains("(3 km away)"));
        assert!(p.desktop.body.contains("2 units needed"));

        let p = build_presentation(&emergency(Urgency::High, 0), &settings);
        assert_eq!(p.desktop.auto_close, Some(EMERGENCY_AUTO_CLOSE));

        let p = build_presentation(&emergency(Urgency::Critical, 0), &settings);
        assert!(p.desktop.require_interaction);
        assert_eq!(p.desktop.auto_close, None);
    }

    #[test]
    fn test_emergency_presentation() {
        let p = build_presentation(&emergency(Urgency::Medium, 0), &PresenterSettings::default());
        assert_eq!(p.desktop.title, "EMERGENCY: O- blood needed");
        assert_eq!(p.desktop.body, "10 units of O- needed at Civil Hospital in Nashik");
        assert_eq!(p.desktop.tag, "emergency-civil-hospital-o-");
        assert!(!p.desktop.renotify);

        let p = build_presentation(&emergency(Urgency::Medium, 2), &PresenterSettings::default());
        assert!(p.desktop.title.starts_with("ESCALATED (Level 2)"));
        assert!(p.desktop.renotify);
    }

    #[test]
    fn test_request_accepted_presentation() {
        let alert = ClassifiedAlert {
            notification_id: "a-1".to_string(),
            urgency: Urgency::Low,
            message: String::new(),
            kind: AlertKind::RequestAccepted {
                donor_name: "Jane Doe".to_string(),
                blood_type: "AB-".to_string(),
                hospital: "Fortis Hospital".to_string(),
                donor_contact: Some("555-0100".to_string()),
                donor_message: None,
            },
        };
        let p = build_presentation(&alert, &PresenterSettings::default());
        assert_eq!(p.desktop.title, "Request Accepted");
        assert_eq!(
            p.desktop.body,
            "Jane Doe accepted your AB- blood request at Fortis Hospital. Contact: 555-0100"
        );
        assert_eq!(p.desktop.tag, "request-accepted-fortis-hospital-ab-");
        assert_eq!(p.toast.duration, Duration::from_secs(5));
    }

    #[test]
    fn test_disabled_presenter_does_nothing() {
        let settings = PresenterSettings {
            notifications_enabled: false,
            ..PresenterSettings::default()
        };
        let (presenter, recorder) = presenter(settings, Permission::Granted, Permission::Granted);

        assert_eq!(presenter.present(&blood_request(Urgency::High)), PresentOutcome::Disabled);
        assert!(recorder.desktop.lock().unwrap().is_empty());
        assert!(recorder.toasts.lock().unwrap().is_empty());
        assert_eq!(recorder.cues.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_permission_requested_lazily_once() {
        let (presenter, recorder) =
            presenter(PresenterSettings::default(), Permission::Default, Permission::Granted);
        assert_eq!(recorder.prompts.load(Ordering::SeqCst), 0);

        assert_eq!(presenter.present(&blood_request(Urgency::High)), PresentOutcome::Delivered);
        assert_eq!(presenter.permission(), Permission::Granted);
        presenter.present(&emergency(Urgency::High, 0));
        assert_eq!(recorder.prompts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_denied_permission_shows_nothing() {
        let (presenter, recorder) =
            presenter(PresenterSettings::default(), Permission::Default, Permission::Denied);

        assert_eq!(
            presenter.present(&blood_request(Urgency::Critical)),
            PresentOutcome::PermissionDenied
        );
        assert!(recorder.desktop.lock().unwrap().is_empty());
        assert_eq!(recorder.cues.load(Ordering::SeqCst), 0);
        assert!(recorder.toasts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_same_tag_replaces_but_still_plays_cue() {
        let (presenter, recorder) =
            presenter(PresenterSettings::default(), Permission::Granted, Permission::Granted);

        assert_eq!(presenter.present(&blood_request(Urgency::Low)), PresentOutcome::Delivered);
        let mut second = blood_request(Urgency::Critical);
        second.notification_id = "n-2".to_string();
        assert_eq!(presenter.present(&second), PresentOutcome::Replaced);

        assert_eq!(recorder.desktop.lock().unwrap().len(), 2);
        assert_eq!(recorder.cues.load(Ordering::SeqCst), 2);
        assert_eq!(recorder.toasts.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_tag_expires_after_auto_close() {
        let settings = PresenterSettings {
            general_auto_close: Duration::from_millis(10),
            ..PresenterSettings::default()
        };
        let (presenter, recorder) = presenter(settings, Permission::Granted, Permission::Granted);

        assert_eq!(presenter.present(&blood_request(Urgency::High)), PresentOutcome::Delivered);
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(presenter.present(&blood_request(Urgency::High)), PresentOutcome::Delivered);
        assert_eq!(recorder.cues.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_sticky_tag_never_expires() {
        let settings = PresenterSettings {
            general_auto_close: Duration::from_millis(10),
            ..PresenterSettings::default()
        };
        let (presenter, _recorder) = presenter(settings, Permission::Granted, Permission::Granted);

        assert_eq!(presenter.present(&blood_request(Urgency::Critical)), PresentOutcome::Delivered);
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(presenter.present(&blood_request(Urgency::High)), PresentOutcome::Replaced);
    }

    #[test]
    fn test_escalations_always_renotify() {
        let (presenter, recorder) =
            presenter(PresenterSettings::default(), Permission::Granted, Permission::Granted);

        assert_eq!(presenter.present(&emergency(Urgency::High, 1)), PresentOutcome::Delivered);
        assert_eq!(presenter.present(&emergency(Urgency::High, 2)), PresentOutcome::Delivered);
        assert_eq!(recorder.cues.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_sound_disabled() {
        let settings = PresenterSettings {
            sound_enabled: false,
            ..PresenterSettings::default()
        };
        let (presenter, recorder) = presenter(settings, Permission::Granted, Permission::Granted);
        assert_eq!(presenter.present(&blood_request(Urgency::Critical)), PresentOutcome::Delivered);
        assert_eq!(recorder.cues.load(Ordering::SeqCst), 0);
        assert_eq!(recorder.desktop.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_desktop_failure_is_absorbed() {
        let (presenter, recorder) = presenter_with_failing_desktop(
            PresenterSettings::default(),
            Permission::Granted,
            Permission::Granted,
            true,
        );
        assert_eq!(presenter.present(&blood_request(Urgency::Low)), PresentOutcome::Delivered);
        assert_eq!(recorder.toasts.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_permission_parsing() {
        assert_eq!("Granted".parse::<Permission>().unwrap(), Permission::Granted);
        assert!("sometimes".parse::<Permission>().is_err());
        assert_eq!(Permission::Denied.to_string(), "denied");
    }
}
