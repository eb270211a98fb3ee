//! Job-execution engine seam
//!
//! The engine is what actually runs a job's steps in an isolated
//! environment. The executor and the job notifier only talk to it through
//! [`JobEngine`], so tests can swap in a scripted engine.

mod podman;

use anyhow::Result;
use async_trait::async_trait;
use keel_core::domain::job::{JobResult, JobSpec};

pub use podman::{PodmanConfig, PodmanEngine, check_podman_available};

/// Runs one job to its terminal status
#[async_trait]
pub trait JobEngine: Send + Sync {
    /// Runs `job` and waits until all its steps completed or one failed
    ///
    /// # Returns
    /// `Ok(JobResult)` with the terminal status. `Err` means the engine could
    /// not run the job at all (e.g. the container runtime is unavailable).
    async fn run_job(&self, job: &JobSpec) -> Result<JobResult>;
}
