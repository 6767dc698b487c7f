// Poller module
use crate::alerts::classifier::classify;
use crate::alerts::presenter::{PresentOutcome, Presenter};
use crate::api::NotificationSource;
use crate::models::UserRole;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(30_000);
pub const DEFAULT_LOOKBACK: Duration = Duration::from_secs(60);

/// Counters for one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub fetched: usize,
    /// Newer than the watermark.
    pub fresh: usize,
    /// Actually shown to the user.
    pub dispatched: usize,
    /// Fresh but not alert-worthy for this role.
    pub ignored: usize,
}

/// Last-seen timestamp shared by the cycles of one poller.
#[derive(Debug, Clone)]
pub struct Watermark(Arc<Mutex<DateTime<Utc>>>);

impl Watermark {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(Arc::new(Mutex::new(at)))
    }

    pub fn get(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }
}

pub struct Poller {
    source: Arc<dyn NotificationSource>,
    presenter: Arc<Presenter>,
    lookback: Duration,
}

impl Poller {
    pub fn new(source: Arc<dyn NotificationSource>, presenter: Arc<Presenter>) -> Self {
        Self {
            source,
            presenter,
            lookback: DEFAULT_LOOKBACK,
        }
    }

    /// How far back the first cycle looks.
    pub fn with_lookback(mut self, lookback: Duration) -> Self {
        self.lookback = lookback;
        self
    }

    /// Start polling for `user_id`. Returns `None` when there is no user to poll for.
    ///
    /// The first cycle runs immediately, then one every `interval`. Each cycle
    /// is its own task, so a slow cycle can overlap the next one.
    pub fn start(&self, user_id: &str, role: UserRole, interval: Duration) -> Option<PollerHandle> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            tracing::warn!("No user id, not starting notification polling");
            return None;
        }

        let lookback = TimeDelta::from_std(self.lookback).unwrap_or_else(|_| TimeDelta::zero());
        let watermark = Watermark::new(Utc::now() - lookback);
        let stopped = Arc::new(AtomicBool::new(false));
        let interval = if interval.is_zero() {
            DEFAULT_INTERVAL
        } else {
            interval
        };

        let ticker = {
            let source = Arc::clone(&self.source);
            let presenter = Arc::clone(&self.presenter);
            let watermark = watermark.clone();
            let stopped = Arc::clone(&stopped);
            let user_id = user_id.to_string();

            tokio::spawn(async move {
                let mut ticks = tokio::time::interval(interval);
                ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    ticks.tick().await;
                    if stopped.load(Ordering::SeqCst) {
                        break;
                    }
                    spawn_cycle(
                        Arc::clone(&source),
                        Arc::clone(&presenter),
                        user_id.clone(),
                        role,
                        watermark.clone(),
                    );
                }
            })
        };

        tracing::info!(user_id, %role, interval_ms = interval.as_millis() as u64, "Notification polling started");

        Some(PollerHandle {
            ticker,
            stopped,
            watermark,
        })
    }
}

fn spawn_cycle(
    source: Arc<dyn NotificationSource>,
    presenter: Arc<Presenter>,
    user_id: String,
    role: UserRole,
    watermark: Watermark,
) {
    let cycle = tokio::spawn(async move {
        run_cycle(source.as_ref(), &presenter, &user_id, role, &watermark).await
    });

    // A failed cycle is logged here and never reaches the ticker
    tokio::spawn(async move {
        match cycle.await {
            Ok(report) => tracing::debug!(
                fetched = report.fetched,
                fresh = report.fresh,
                dispatched = report.dispatched,
                ignored = report.ignored,
                "Poll cycle finished"
            ),
            Err(e) if e.is_panic() => tracing::error!("Poll cycle panicked: {e}"),
            Err(e) => tracing::debug!("Poll cycle cancelled: {e}"),
        }
    });
}

/// One fetch, filter, classify and dispatch pass.
///
/// Only notifications created strictly after the watermark are considered,
/// whatever their read flag. The watermark moves to "now" afterwards even
/// when nothing was found.
pub async fn run_cycle(
    source: &dyn NotificationSource,
    presenter: &Arc<Presenter>,
    user_id: &str,
    role: UserRole,
    watermark: &Watermark,
) -> CycleReport {
    let since = watermark.get();
    let notifications = source.fetch_notifications(user_id).await;

    let mut report = CycleReport {
        fetched: notifications.len(),
        ..CycleReport::default()
    };

    for notification in notifications.iter().filter(|n| n.created_at > since) {
        report.fresh += 1;
        match classify(notification, role) {
            Some(alert) => {
                // Desktop notification calls block, keep them off the runtime threads
                let presenter = Arc::clone(presenter);
                let shown = tokio::task::spawn_blocking(move || presenter.present(&alert)).await;
                match shown {
                    Ok(outcome) => {
                        tracing::debug!(id = %notification.id, ?outcome, "Dispatched alert");
                        if matches!(outcome, PresentOutcome::Delivered | PresentOutcome::Replaced) {
                            report.dispatched += 1;
                        }
                    }
                    Err(e) => tracing::warn!(id = %notification.id, "Presenting alert failed: {e}"),
                }
            }
            None => report.ignored += 1,
        }
    }

    watermark.set(Utc::now());
    report
}

/// Running poller. Dropping the handle does not stop it; call [`PollerHandle::stop`].
pub struct PollerHandle {
    ticker: JoinHandle<()>,
    stopped: Arc<AtomicBool>,
    watermark: Watermark,
}

impl PollerHandle {
    /// Cancel the timer. Cycles already running are left to finish. Safe to call more than once.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.ticker.abort();
            tracing::info!("Notification polling stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst) && !self.ticker.is_finished()
    }

    pub fn watermark(&self) -> DateTime<Utc> {
        self.watermark.get()
    }
}
