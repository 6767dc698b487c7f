/// Failures the alert pipeline can hit.
///
/// None of these ever reach a caller of the public pipeline operations: the
/// client, presenter and poller absorb them and fall back to an empty list,
/// `false`, or a skipped alert. They exist so the absorbing layer can log
/// what went wrong.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("network request failed: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("request timed out after {0} ms")]
    Timeout(u64),

    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),

    #[error("server responded with status {status}")]
    Http { status: u16 },

    #[error("desktop notification permission denied")]
    PermissionDenied,

    #[error("failed to decode notification payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("malformed notification {id}: {reason}")]
    MalformedNotification { id: String, reason: String },

    #[error("desktop notification failed: {0}")]
    Desktop(String),
}

pub type AlertResult<T> = std::result::Result<T, AlertError>;
