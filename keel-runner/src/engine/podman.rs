//! Podman job engine
//!
//! Runs each job in a throwaway podman container:
//! - Checking podman availability
//! - Translating a JobSpec into `podman run` arguments
//! - Injecting env vars through the podman process environment
//! - Running all steps as one `set -e` shell script

use anyhow::{Context, Result};
use async_trait::async_trait;
use keel_core::domain::job::{JobResult, JobSpec};
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::JobEngine;

/// Mount point of the shared workspace volume inside job containers
pub const SHARED_STORAGE_MOUNT: &str = "/mnt/share";

/// Number of trailing output characters kept in failure messages
const OUTPUT_TAIL_LEN: usize = 2000;

/// Checks if podman is installed and available
pub async fn check_podman_available(binary: &str) -> Result<()> {
    let output = Command::new(binary)
        .arg("--version")
        .output()
        .await
        .with_context(|| format!("Failed to execute '{} --version'. Is podman installed?", binary))?;

    if !output.status.success() {
        anyhow::bail!("Podman is not working correctly");
    }

    let version = String::from_utf8_lossy(&output.stdout);
    info!("Podman is available: {}", version.trim());

    Ok(())
}

/// Podman engine configuration
#[derive(Debug, Clone)]
pub struct PodmanConfig {
    /// Podman executable
    pub binary: String,

    /// Image for jobs that don't name one
    pub default_image: String,

    /// Host directory holding the checked-out source, if any
    pub source_dir: Option<PathBuf>,

    /// Where `source_dir` is mounted inside the container
    pub source_mount: String,

    /// Named volume mounted at `/mnt/share` for jobs with storage enabled
    pub shared_volume: String,
}

impl Default for PodmanConfig {
    fn default() -> Self {
        Self {
            binary: "podman".to_string(),
            default_image: "docker.io/library/alpine:latest".to_string(),
            source_dir: None,
            source_mount: "/src".to_string(),
            shared_volume: "keel-share".to_string(),
        }
    }
}

/// Job engine backed by `podman run`
pub struct PodmanEngine {
    config: PodmanConfig,
}

impl PodmanEngine {
    pub fn new(config: PodmanConfig) -> Self {
        Self { config }
    }

    /// Builds the `podman run` argument list for `job`
    ///
    /// Env vars are passed as bare `-e NAME` so podman reads the values from
    /// its own environment and they never appear in argv.
    fn run_args(&self, job: &JobSpec, container_name: &str) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "--rm".to_string(),
            "--name".to_string(),
            container_name.to_string(),
            "--entrypoint".to_string(),
            "/bin/sh".to_string(),
        ];

        if job.privileged {
            args.push("--privileged".to_string());
        }

        for name in job.env_names() {
            args.push("-e".to_string());
            args.push(name.to_string());
        }

        if let Some(source_dir) = &self.config.source_dir {
            args.push("-v".to_string());
            args.push(format!(
                "{}:{}",
                source_dir.display(),
                self.config.source_mount
            ));
        }

        if job.persistent_storage_enabled {
            args.push("-v".to_string());
            args.push(format!(
                "{}:{}",
                self.config.shared_volume, SHARED_STORAGE_MOUNT
            ));
        }

        args.push(
            job.runtime_image
                .clone()
                .unwrap_or_else(|| self.config.default_image.clone()),
        );
        args.push("-c".to_string());
        args.push(step_script(&job.steps));

        args
    }
}

#[async_trait]
impl JobEngine for PodmanEngine {
    async fn run_job(&self, job: &JobSpec) -> Result<JobResult> {
        let container_name = format!("keel-{}-{}", job.name, Uuid::new_v4().simple());
        let args = self.run_args(job, &container_name);

        info!(
            "Starting container {} for job {} ({} step(s))",
            container_name,
            job.name,
            job.steps.len()
        );

        let mut command = Command::new(&self.config.binary);
        command.args(&args);
        command.envs(job.env.iter());
        command.envs(
            job.secret_env
                .iter()
                .map(|(name, value)| (name, value.expose())),
        );

        let output = command
            .output()
            .await
            .with_context(|| format!("Failed to execute podman run for job {}", job.name))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !stdout.trim().is_empty() {
            debug!("[{}] stdout: {}", job.name, tail(stdout.trim()));
        }
        if !stderr.trim().is_empty() {
            debug!("[{}] stderr: {}", job.name, tail(stderr.trim()));
        }

        if output.status.success() {
            info!("Job {} completed successfully", job.name);
            return Ok(JobResult::succeeded());
        }

        let exit_code = output.status.code().unwrap_or(-1);
        error!("Job {} failed with exit code {}", job.name, exit_code);

        Ok(JobResult::failed(
            exit_code,
            format!("exit code {}: {}", exit_code, tail(stderr.trim())),
        ))
    }
}

/// Joins steps into one script that stops at the first failing step
fn step_script(steps: &[String]) -> String {
    let mut script = String::from("set -e\n");
    for step in steps {
        script.push_str(step);
        script.push('\n');
    }
    script
}

fn tail(text: &str) -> &str {
    let len = text.len();
    if len <= OUTPUT_TAIL_LEN {
        return text;
    }
    let mut start = len - OUTPUT_TAIL_LEN;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}
