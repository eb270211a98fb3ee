//! Completion notification
//!
//! Every handled event ends with exactly one notification, whatever the gate
//! decided and whatever the executor reported. [`NotificationStage::guard`]
//! wraps the pipeline body so the delivery sits in the control flow right
//! after it, instead of depending on some external "after" hook firing.

mod job;
mod webhook;

use async_trait::async_trait;
use futures::FutureExt;
use keel_core::domain::notification::{Notification, RunStatus};
use keel_core::domain::secret::Secret;
use keel_core::error::NotificationDeliveryFailure;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info, warn};

pub use job::{JobNotifier, NOTIFY_JOB_NAME};
pub use webhook::{WebhookNotifier, WebhookPayload};

/// Delivery channel for completion notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends `notification` to `webhook`
    async fn deliver(
        &self,
        webhook: &Secret,
        notification: &Notification,
    ) -> Result<(), NotificationDeliveryFailure>;
}

/// The always-run notification stage
#[derive(Clone)]
pub struct NotificationStage {
    notifier: Arc<dyn Notifier>,
    sender: String,
}

impl NotificationStage {
    /// # Arguments
    /// * `notifier` - Delivery channel
    /// * `sender` - Fixed sender identity shown on every message
    pub fn new(notifier: Arc<dyn Notifier>, sender: impl Into<String>) -> Self {
        Self {
            notifier,
            sender: sender.into(),
        }
    }

    /// Runs `body` to completion, then notifies with the status it produced
    ///
    /// A panic inside `body` is caught and reported as a failed run, so the
    /// notification still goes out.
    ///
    /// # Returns
    /// The body's status and whether delivery succeeded
    pub async fn guard<F>(&self, webhook: &Secret, body: F) -> (RunStatus, bool)
    where
        F: Future<Output = RunStatus>,
    {
        let status = match AssertUnwindSafe(body).catch_unwind().await {
            Ok(status) => status,
            Err(_) => {
                error!("Pipeline body panicked");
                RunStatus::Failed {
                    failed_job: None,
                    reason: "pipeline panicked".to_string(),
                }
            }
        };
        let delivered = self.notify(webhook, &status).await;
        (status, delivered)
    }

    /// Delivers one notification for `status`. Failures are logged, never raised.
    pub async fn notify(&self, webhook: &Secret, status: &RunStatus) -> bool {
        let notification = Notification::for_status(&self.sender, status);

        match self.notifier.deliver(webhook, &notification).await {
            Ok(()) => {
                info!("Notification sent: {}", notification.message);
                true
            }
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }
}
