//! Direct webhook delivery
//!
//! Posts the notification straight to an incoming-webhook endpoint instead
//! of starting a notifier container.

use async_trait::async_trait;
use keel_core::domain::notification::Notification;
use keel_core::domain::secret::Secret;
use keel_core::error::NotificationDeliveryFailure;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::Notifier;

/// Incoming-webhook message body
#[derive(Debug, Serialize)]
pub struct WebhookPayload<'a> {
    pub username: &'a str,
    pub text: &'a str,
    pub attachments: [WebhookAttachment<'a>; 1],
}

#[derive(Debug, Serialize)]
pub struct WebhookAttachment<'a> {
    pub color: &'a str,
    pub text: &'a str,
}

impl<'a> WebhookPayload<'a> {
    pub fn from_notification(notification: &'a Notification) -> Self {
        Self {
            username: &notification.username,
            text: &notification.message,
            attachments: [WebhookAttachment {
                color: &notification.color,
                text: &notification.message,
            }],
        }
    }
}

/// Delivers notifications with an HTTP POST
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
}

impl WebhookNotifier {
    /// Creates a notifier whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, NotificationDeliveryFailure> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotificationDeliveryFailure::new(format!("HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn deliver(
        &self,
        webhook: &Secret,
        notification: &Notification,
    ) -> Result<(), NotificationDeliveryFailure> {
        // reqwest errors can carry the URL, which is the secret here
        let response = self
            .client
            .post(webhook.expose())
            .json(&WebhookPayload::from_notification(notification))
            .send()
            .await
            .map_err(|e| {
                NotificationDeliveryFailure::new(format!(
                    "request failed: {}",
                    e.without_url()
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotificationDeliveryFailure::new(format!(
                "webhook returned status {}",
                status.as_u16()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::domain::notification::{COLOR_FAILURE, RunStatus};

    #[test]
    fn test_payload_shape() {
        let notification = Notification::for_status(
            "keel",
            &RunStatus::Failed {
                failed_job: Some("job-runner-docker".to_string()),
                reason: "exit code 1".to_string(),
            },
        );

        let json = serde_json::to_value(WebhookPayload::from_notification(&notification)).unwrap();

        assert_eq!(json["username"], "keel");
        assert_eq!(json["attachments"][0]["color"], COLOR_FAILURE);
        assert_eq!(json["text"], json["attachments"][0]["text"]);
    }

    #[tokio::test]
    async fn test_unreachable_webhook_is_delivery_failure() {
        let notifier = WebhookNotifier::new(Duration::from_millis(500)).unwrap();
        let notification = Notification::for_status(
            "keel",
            &RunStatus::Skipped {
                branch: "PR".to_string(),
            },
        );

        let err = notifier
            .deliver(&Secret::new("http://127.0.0.1:9/secret-token"), &notification)
            .await
            .unwrap_err();
        assert!(!err.reason.contains("secret-token"));
    }
}
