/// Error taxonomy for everything between the user's intent and the backend.
///
/// `Auth`, `Remote`, and `Transport` come out of the gateway; `EmptyText`
/// is rejected by the engine before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("session expired, please log in again")]
    Auth,
    #[error("server rejected the request ({status}): {message}")]
    Remote { status: u16, message: String },
    #[error("backend unreachable: {0}")]
    Transport(String),
    #[error("todo text cannot be empty")]
    EmptyText,
}

impl SyncError {
    /// Map a non-2xx response to an error. Token problems are their own
    /// kind so the engine can force a logout instead of suggesting a retry.
    pub fn from_status(status: u16, message: impl Into<String>) -> SyncError {
        match status {
            401 | 403 => SyncError::Auth,
            _ => SyncError::Remote {
                status,
                message: message.into(),
            },
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => SyncError::from_status(status.as_u16(), err.to_string()),
            // no response at all: connect failure, timeout, or a dropped body
            None => SyncError::Transport(err.to_string()),
        }
    }
}
