use crate::config::settings::ApiConfig;
use crate::error::{AlertError, AlertResult};
use crate::models::{Notification, NotificationsEnvelope};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(3000);
pub const DEFAULT_MARK_READ_TIMEOUT: Duration = Duration::from_millis(2000);

/// Where the poller gets notifications from.
///
/// Both operations degrade silently: a failed fetch looks exactly like an
/// empty inbox and a failed acknowledgment is just `false`.
#[async_trait]
pub trait NotificationSource: Send + Sync {
    async fn fetch_notifications(&self, user_id: &str) -> Vec<Notification>;

    async fn mark_as_read(&self, notification_id: &str) -> bool;
}

#[derive(Debug, Clone)]
pub struct NotificationClient {
    client: Client,
    base_url: String,
    fetch_timeout: Duration,
    mark_read_timeout: Duration,
    demo_session: bool,
}

impl NotificationClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            mark_read_timeout: DEFAULT_MARK_READ_TIMEOUT,
            demo_session: false,
        }
    }

    pub fn from_config(api: &ApiConfig, demo_session: bool) -> Self {
        Self::new(api.base_url.clone())
            .with_timeouts(api.fetch_timeout(), api.mark_read_timeout())
            .with_demo_session(demo_session)
    }

    pub fn with_timeouts(mut self, fetch: Duration, mark_read: Duration) -> Self {
        self.fetch_timeout = fetch;
        self.mark_read_timeout = mark_read;
        self
    }

    /// Demo sessions never show a failed acknowledgment.
    pub fn with_demo_session(mut self, demo_session: bool) -> Self {
        self.demo_session = demo_session;
        self
    }

    pub fn is_demo_session(&self) -> bool {
        self.demo_session
    }

    /// Build `{base_url}/notifications/{segments...}` with each segment escaped.
    fn endpoint(&self, segments: &[&str]) -> AlertResult<Url> {
        let mut url = Url::parse(self.base_url.trim_end_matches('/'))
            .map_err(|e| AlertError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| AlertError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push("notifications")
            .extend(segments);
        Ok(url)
    }

    async fn try_fetch(&self, user_id: &str) -> AlertResult<Vec<Notification>> {
        let url = self.endpoint(&[user_id])?;
        tracing::debug!(%url, "Fetching notifications");

        let response = race(self.fetch_timeout, self.client.get(url).send()).await??;
        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::Http {
                status: status.as_u16(),
            });
        }

        let body = race(self.fetch_timeout, response.text()).await??;
        let envelope: NotificationsEnvelope = serde_json::from_str(&body)?;

        let mut notifications = Vec::with_capacity(envelope.notifications.len());
        for value in envelope.notifications {
            match Notification::from_value(value) {
                Ok(notification) => notifications.push(notification),
                Err(e) => tracing::warn!("Dropping notification: {e}"),
            }
        }
        Ok(notifications)
    }

    async fn try_mark_as_read(&self, notification_id: &str) -> AlertResult<()> {
        let url = self.endpoint(&[notification_id, "read"])?;
        let response = race(self.mark_read_timeout, self.client.put(url).send()).await??;
        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::Http {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationSource for NotificationClient {
    async fn fetch_notifications(&self, user_id: &str) -> Vec<Notification> {
        if user_id.trim().is_empty() {
            return Vec::new();
        }

        match self.try_fetch(user_id).await {
            Ok(notifications) => notifications,
            Err(e) => {
                tracing::warn!(user_id, "Notification fetch failed, treating as empty: {e}");
                Vec::new()
            }
        }
    }

    async fn mark_as_read(&self, notification_id: &str) -> bool {
        let outcome = if notification_id.trim().is_empty() {
            Err(AlertError::InvalidUrl("empty notification id".to_string()))
        } else {
            self.try_mark_as_read(notification_id).await
        };

        match outcome {
            Ok(()) => true,
            Err(e) if self.demo_session => {
                tracing::debug!(notification_id, "Demo session, ignoring mark-as-read failure: {e}");
                true
            }
            Err(e) => {
                tracing::warn!(notification_id, "Mark-as-read failed: {e}");
                false
            }
        }
    }
}

/// Race a request future against a deadline.
async fn race<F, T>(limit: Duration, future: F) -> AlertResult<Result<T, reqwest::Error>>
where
    F: Future<Output = Result<T, reqwest::Error>>,
{
    tokio::time::timeout(limit, future)
        .await
        .map_err(|_| AlertError::Timeout(limit.as_millis() as u64))
}
