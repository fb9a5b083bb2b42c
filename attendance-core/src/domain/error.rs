use thiserror::Error;

use super::ports::outbound::RemoteError;

/// Errors returned by lifecycle operations.
///
/// Every error is scoped to the single requested operation; in-memory state is
/// left as it was before the call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LifecycleError {
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
    #[error("no active attendance session")]
    NoActiveSession,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{0} must not be empty")]
    EmptyInput(&'static str),
    #[error("invalid date range: {0}")]
    InvalidDateRange(String),
    #[error("start date is in the past")]
    PastDate,
    #[error("leave request is no longer editable")]
    NotEditable,
    #[error("remote store unavailable: {0}")]
    RemoteUnavailable(String),
    #[error("another operation is still in flight")]
    OperationInFlight,
    #[error("remote store rejected the request: {0}")]
    Remote(String),
}

impl LifecycleError {
    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

impl From<RemoteError> for LifecycleError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Unavailable(msg) => Self::RemoteUnavailable(msg),
            RemoteError::NotFound(what) => Self::NotFound(what),
            RemoteError::Rejected(msg) => Self::Remote(msg),
        }
    }
}
