//! Error taxonomy for pipeline runs

use thiserror::Error;

/// The inbound event could not be turned into a run configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigDerivationError {
    /// Payload is not a JSON object
    #[error("malformed event payload: {0}")]
    MalformedPayload(String),

    /// Event carries no commit identifier
    #[error("event has no commit identifier")]
    MissingCommit,
}

/// A job's steps exited non-zero, or the engine could not run it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("job '{job}' failed with exit code {exit_code}: {message}")]
pub struct JobExecutionFailure {
    pub job: String,
    pub exit_code: i32,
    pub message: String,
}

/// Completion message could not be delivered. Logged, never re-raised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("notification delivery failed: {reason}")]
pub struct NotificationDeliveryFailure {
    pub reason: String,
}

impl NotificationDeliveryFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
