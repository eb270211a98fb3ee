//! Notification as a job
//!
//! Runs the `slack-notify` image through the job engine, the same way the
//! pipeline jobs run.

use async_trait::async_trait;
use keel_core::domain::job::JobSpec;
use keel_core::domain::notification::Notification;
use keel_core::domain::secret::Secret;
use keel_core::error::NotificationDeliveryFailure;
use std::sync::Arc;

use super::Notifier;
use crate::engine::JobEngine;

pub const NOTIFY_JOB_NAME: &str = "slack-notify";

/// Delivers notifications by running a notifier container
pub struct JobNotifier {
    engine: Arc<dyn JobEngine>,
    image: String,
}

impl JobNotifier {
    pub fn new(engine: Arc<dyn JobEngine>, image: impl Into<String>) -> Self {
        Self {
            engine,
            image: image.into(),
        }
    }

    /// Notification job; never persists workspace storage
    pub fn notification_job(&self, webhook: &Secret, notification: &Notification) -> JobSpec {
        JobSpec::new(NOTIFY_JOB_NAME)
            .image(&self.image)
            .persistent_storage(false)
            .secret_env("SLACK_WEBHOOK", webhook.clone())
            .env("SLACK_USERNAME", &notification.username)
            .env("SLACK_MESSAGE", &notification.message)
            .env("SLACK_COLOR", &notification.color)
            .step("/slack-notify")
    }
}

#[async_trait]
impl Notifier for JobNotifier {
    async fn deliver(
        &self,
        webhook: &Secret,
        notification: &Notification,
    ) -> Result<(), NotificationDeliveryFailure> {
        let job = self.notification_job(webhook, notification);

        match self.engine.run_job(&job).await {
            Ok(result) if result.success => Ok(()),
            Ok(result) => Err(NotificationDeliveryFailure::new(format!(
                "{} job exited with code {}",
                NOTIFY_JOB_NAME, result.exit_code
            ))),
            Err(e) => Err(NotificationDeliveryFailure::new(format!("{:#}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::tests::ScriptedEngine;
    use keel_core::domain::notification::{COLOR_SUCCESS, RunStatus};

    fn notification() -> Notification {
        Notification::for_status(
            "keel",
            &RunStatus::Succeeded {
                image_tag: "master-abcdef1".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_runs_notify_job() {
        let engine = Arc::new(ScriptedEngine::default());
        let notifier = JobNotifier::new(engine.clone(), "technosophos/slack-notify:latest");

        notifier
            .deliver(&Secret::new("https://hooks.example.com/T0"), &notification())
            .await
            .unwrap();

        let started = engine.started.lock().unwrap();
        assert_eq!(started.len(), 1);
        let job = &started[0];
        assert_eq!(job.name, NOTIFY_JOB_NAME);
        assert!(!job.persistent_storage_enabled);
        assert_eq!(job.env.get("SLACK_USERNAME").map(String::as_str), Some("keel"));
        assert_eq!(job.env.get("SLACK_COLOR").map(String::as_str), Some(COLOR_SUCCESS));
        assert!(job.env.values().all(|v| !v.contains("hooks.example.com")));
        assert_eq!(
            job.secret_env.get("SLACK_WEBHOOK").map(|s| s.expose()),
            Some("https://hooks.example.com/T0")
        );
    }

    #[tokio::test]
    async fn test_failed_job_is_delivery_failure() {
        let engine = Arc::new(ScriptedEngine::failing(NOTIFY_JOB_NAME, 7));
        let notifier = JobNotifier::new(engine, "technosophos/slack-notify:latest");

        let err = notifier
            .deliver(&Secret::new("https://hooks.example.com/T0"), &notification())
            .await
            .unwrap_err();
        assert!(err.reason.contains("code 7"));
    }
}
