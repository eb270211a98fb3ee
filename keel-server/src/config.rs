//! Server configuration
//!
//! Project secrets, pipeline settings and engine options, loaded from
//! environment variables with defaults for everything that isn't a secret.

use anyhow::Context;
use keel_core::PipelineSettings;
use keel_core::domain::event::ProjectSecrets;
use keel_core::domain::secret::Secret;
use keel_runner::PodmanConfig;
use std::path::PathBuf;
use std::time::Duration;

/// How completion notifications are delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierKind {
    /// Run the notifier image as a job
    Job,
    /// POST straight to the webhook
    Webhook,
}

impl std::str::FromStr for NotifierKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "job" => Ok(NotifierKind::Job),
            "webhook" => Ok(NotifierKind::Webhook),
            other => anyhow::bail!("unknown notifier '{}', expected 'job' or 'webhook'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Address the event receiver listens on
    pub bind_addr: String,

    pub secrets: ProjectSecrets,

    pub settings: PipelineSettings,

    pub podman: PodmanConfig,

    pub notifier: NotifierKind,

    /// Request timeout for webhook delivery
    pub notify_timeout: Duration,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - REGISTRY_URL, REGISTRY_USERNAME, REGISTRY_PASSWORD (required)
    /// - NOTIFICATION_WEBHOOK (required)
    /// - KEEL_BIND_ADDR (optional, default: 0.0.0.0:8080)
    /// - KEEL_SETTINGS_FILE (optional, JSON pipeline settings)
    /// - RELEASE_BRANCH (optional, overrides the settings file)
    /// - KEEL_SOURCE_DIR (required, host source directory mounted into jobs)
    /// - KEEL_NOTIFIER (optional, `job` or `webhook`, default: job)
    /// - NOTIFY_TIMEOUT (optional, seconds, default: 10)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable lookup
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |name: &str| {
            var(name).ok_or_else(|| anyhow::anyhow!("{} environment variable not set", name))
        };

        let secrets = ProjectSecrets {
            registry_url: required("REGISTRY_URL")?,
            registry_username: required("REGISTRY_USERNAME")?,
            registry_password: Secret::new(required("REGISTRY_PASSWORD")?),
            notification_webhook: Secret::new(required("NOTIFICATION_WEBHOOK")?),
        };

        let mut settings = match var("KEEL_SETTINGS_FILE") {
            Some(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read settings file {}", path))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("Invalid settings file {}", path))?
            }
            None => PipelineSettings::default(),
        };

        if let Some(branch) = var("RELEASE_BRANCH") {
            settings.release_branch = branch;
        }

        let podman = PodmanConfig {
            source_dir: var("KEEL_SOURCE_DIR").map(PathBuf::from),
            source_mount: settings.source_dir.trim_end_matches('/').to_string(),
            ..PodmanConfig::default()
        };

        let notifier = var("KEEL_NOTIFIER")
            .map(|s| s.parse::<NotifierKind>())
            .transpose()?
            .unwrap_or(NotifierKind::Job);

        let notify_timeout = var("NOTIFY_TIMEOUT")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));

        Ok(Self {
            bind_addr: var("KEEL_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            secrets,
            settings,
            podman,
            notifier,
            notify_timeout,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if self.secrets.registry_url.is_empty() {
            anyhow::bail!("registry_url cannot be empty");
        }

        if self.secrets.notification_webhook.is_empty() {
            anyhow::bail!("notification webhook cannot be empty");
        }

        if self.notifier == NotifierKind::Webhook {
            let webhook = self.secrets.notification_webhook.expose();
            if !webhook.starts_with("http://") && !webhook.starts_with("https://") {
                anyhow::bail!("notification webhook must start with http:// or https://");
            }
        }

        // build jobs `cd` into the mounted source before anything else
        match &self.podman.source_dir {
            None => anyhow::bail!("KEEL_SOURCE_DIR environment variable not set"),
            Some(dir) if dir.as_os_str().is_empty() => {
                anyhow::bail!("KEEL_SOURCE_DIR cannot be empty")
            }
            Some(_) => {}
        }

        if self.settings.release_branch.is_empty() {
            anyhow::bail!("release_branch cannot be empty");
        }

        if self.notify_timeout.as_secs() == 0 {
            anyhow::bail!("notify_timeout must be greater than 0");
        }

        Ok(())
    }
}
