//! Job domain types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::secret::Secret;

/// Declarative description of one unit of work
///
/// The steps run in order inside `runtime_image`; the first non-zero exit
/// stops the job. `secret_env` is injected exactly like `env` but is never
/// printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub name: String,
    pub runtime_image: Option<String>,
    pub steps: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub secret_env: BTreeMap<String, Secret>,
    pub privileged: bool,
    pub persistent_storage_enabled: bool,
}

impl JobSpec {
    /// Creates an unprivileged job with storage disabled and no steps
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            runtime_image: None,
            steps: Vec::new(),
            env: BTreeMap::new(),
            secret_env: BTreeMap::new(),
            privileged: false,
            persistent_storage_enabled: false,
        }
    }

    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.runtime_image = Some(image.into());
        self
    }

    pub fn step(mut self, step: impl Into<String>) -> Self {
        self.steps.push(step.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn secret_env(mut self, key: impl Into<String>, value: Secret) -> Self {
        self.secret_env.insert(key.into(), value);
        self
    }

    pub fn privileged(mut self, privileged: bool) -> Self {
        self.privileged = privileged;
        self
    }

    pub fn persistent_storage(mut self, enabled: bool) -> Self {
        self.persistent_storage_enabled = enabled;
        self
    }

    /// Names of every variable injected into the job, secret or not
    pub fn env_names(&self) -> impl Iterator<Item = &str> {
        self.env
            .keys()
            .chain(self.secret_env.keys())
            .map(String::as_str)
    }
}

/// Terminal status of a job within an execution report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Succeeded,
    Failed,
    /// Never handed to the engine because an earlier job failed
    Skipped,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Succeeded => write!(f, "Succeeded"),
            JobStatus::Failed => write!(f, "Failed"),
            JobStatus::Skipped => write!(f, "Skipped"),
        }
    }
}

/// Result reported by the job-execution engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub success: bool,
    pub exit_code: i32,
    pub error_message: Option<String>,
}

impl JobResult {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            exit_code: 0,
            error_message: None,
        }
    }

    pub fn failed(exit_code: i32, message: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code,
            error_message: Some(message.into()),
        }
    }
}
