//! Notification domain types
//!
//! The completion message sent once per handled event. The destination
//! webhook is a secret and travels separately from the message.

use serde::{Deserialize, Serialize};

pub const COLOR_SUCCESS: &str = "#00ff00";
pub const COLOR_FAILURE: &str = "#ff0000";
pub const COLOR_INFO: &str = "#0000ff";

/// Final status of one event handling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Carries only the tag; the registry host stays out of messages
    Succeeded { image_tag: String },
    Failed {
        failed_job: Option<String>,
        reason: String,
    },
    /// Gate decided not to execute
    Skipped { branch: String },
}

impl RunStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, RunStatus::Failed { .. })
    }
}

/// Message delivered to the notification channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub username: String,
    pub message: String,
    pub color: String,
}

impl Notification {
    /// Builds the completion message for `status`, sent as `username`
    pub fn for_status(username: impl Into<String>, status: &RunStatus) -> Self {
        let (message, color) = match status {
            RunStatus::Succeeded { image_tag } => (
                format!("Keel pipeline finished successfully: {}", image_tag),
                COLOR_SUCCESS,
            ),
            RunStatus::Failed {
                failed_job: Some(job),
                reason,
            } => (
                format!("Keel pipeline failed in job {}: {}", job, reason),
                COLOR_FAILURE,
            ),
            RunStatus::Failed {
                failed_job: None,
                reason,
            } => (format!("Keel pipeline failed: {}", reason), COLOR_FAILURE),
            RunStatus::Skipped { branch } => (
                format!("Keel pipeline skipped: no jobs to run for branch {}", branch),
                COLOR_INFO,
            ),
        };

        Self {
            username: username.into(),
            message,
            color: color.to_string(),
        }
    }
}
