//! Pipeline executor
//!
//! Runs a pipeline's jobs strictly sequentially. Each job is handed to the
//! engine and awaited to its terminal status before the next one starts; the
//! first failure stops the run and no later job is ever started.

use keel_core::domain::job::{JobSpec, JobStatus};
use keel_core::domain::pipeline::Pipeline;
use keel_core::error::JobExecutionFailure;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::engine::JobEngine;

/// Status of one job in a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub name: String,
    pub status: JobStatus,
}

/// What happened when a pipeline ran
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    jobs: Vec<JobOutcome>,
    failure: Option<JobExecutionFailure>,
}

impl ExecutionReport {
    pub fn jobs(&self) -> &[JobOutcome] {
        &self.jobs
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    /// The job that stopped the run, if any
    pub fn failure(&self) -> Option<&JobExecutionFailure> {
        self.failure.as_ref()
    }

    pub fn status_of(&self, job: &str) -> Option<JobStatus> {
        self.jobs.iter().find(|o| o.name == job).map(|o| o.status)
    }
}

/// Sequential pipeline executor
#[derive(Clone)]
pub struct Executor {
    engine: Arc<dyn JobEngine>,
}

impl Executor {
    pub fn new(engine: Arc<dyn JobEngine>) -> Self {
        Self { engine }
    }

    /// Runs every job of `pipeline` in order until one fails
    pub async fn run(&self, pipeline: &Pipeline) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        let total = pipeline.len();

        for (idx, job) in pipeline.jobs().iter().enumerate() {
            if report.failure.is_some() {
                report.jobs.push(JobOutcome {
                    name: job.name.clone(),
                    status: JobStatus::Skipped,
                });
                continue;
            }

            info!("Executing job {}/{}: {}", idx + 1, total, job.name);

            match self.run_one(job).await {
                Ok(()) => {
                    info!("Job '{}' completed", job.name);
                    report.jobs.push(JobOutcome {
                        name: job.name.clone(),
                        status: JobStatus::Succeeded,
                    });
                }
                Err(failure) => {
                    error!(
                        "Job '{}' failed with exit code {}",
                        failure.job, failure.exit_code
                    );
                    report.jobs.push(JobOutcome {
                        name: job.name.clone(),
                        status: JobStatus::Failed,
                    });
                    report.failure = Some(failure);
                }
            }
        }

        if let Some(failure) = &report.failure {
            let skipped = report
                .jobs
                .iter()
                .filter(|o| o.status == JobStatus::Skipped)
                .count();
            if skipped > 0 {
                warn!(
                    "Pipeline aborted after job '{}', {} job(s) not started",
                    failure.job, skipped
                );
            }
        }

        report
    }

    async fn run_one(&self, job: &JobSpec) -> Result<(), JobExecutionFailure> {
        match self.engine.run_job(job).await {
            Ok(result) if result.success => Ok(()),
            Ok(result) => Err(JobExecutionFailure {
                job: job.name.clone(),
                exit_code: result.exit_code,
                message: result
                    .error_message
                    .unwrap_or_else(|| format!("exit code {}", result.exit_code)),
            }),
            Err(e) => Err(JobExecutionFailure {
                job: job.name.clone(),
                exit_code: -1,
                message: format!("{:#}", e),
            }),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use keel_core::domain::job::JobResult;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Engine that records every job it is handed and replies from a script
    #[derive(Default)]
    pub(crate) struct ScriptedEngine {
        pub started: Mutex<Vec<JobSpec>>,
        pub results: HashMap<String, JobResult>,
        pub unavailable: Vec<String>,
    }

    impl ScriptedEngine {
        pub fn failing(job: &str, exit_code: i32) -> Self {
            let mut results = HashMap::new();
            results.insert(job.to_string(), JobResult::failed(exit_code, "boom"));
            Self {
                results,
                ..Self::default()
            }
        }

        pub fn started_names(&self) -> Vec<String> {
            self.started
                .lock()
                .unwrap()
                .iter()
                .map(|j| j.name.clone())
                .collect()
        }
    }

    #[async_trait]
    impl JobEngine for ScriptedEngine {
        async fn run_job(&self, job: &JobSpec) -> Result<JobResult> {
            self.started.lock().unwrap().push(job.clone());
            if self.unavailable.contains(&job.name) {
                anyhow::bail!("container runtime unavailable");
            }
            Ok(self
                .results
                .get(&job.name)
                .cloned()
                .unwrap_or_else(JobResult::succeeded))
        }
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(vec![
            JobSpec::new("build").step("make"),
            JobSpec::new("deploy").step("ship"),
        ])
    }

    #[tokio::test]
    async fn test_runs_jobs_in_order() {
        let engine = Arc::new(ScriptedEngine::default());
        let report = Executor::new(engine.clone()).run(&pipeline()).await;

        assert!(report.succeeded());
        assert_eq!(engine.started_names(), vec!["build", "deploy"]);
        assert_eq!(report.status_of("build"), Some(JobStatus::Succeeded));
        assert_eq!(report.status_of("deploy"), Some(JobStatus::Succeeded));
    }

    #[tokio::test]
    async fn test_failure_stops_the_pipeline() {
        let engine = Arc::new(ScriptedEngine::failing("build", 2));
        let report = Executor::new(engine.clone()).run(&pipeline()).await;

        assert!(!report.succeeded());
        assert_eq!(engine.started_names(), vec!["build"]);
        assert_eq!(report.status_of("deploy"), Some(JobStatus::Skipped));

        let failure = report.failure().unwrap();
        assert_eq!(failure.job, "build");
        assert_eq!(failure.exit_code, 2);
    }

    #[tokio::test]
    async fn test_engine_error_counts_as_failure() {
        let engine = Arc::new(ScriptedEngine {
            unavailable: vec!["build".to_string()],
            ..ScriptedEngine::default()
        });
        let report = Executor::new(engine.clone()).run(&pipeline()).await;

        let failure = report.failure().unwrap();
        assert_eq!(failure.exit_code, -1);
        assert!(failure.message.contains("unavailable"));
        assert_eq!(engine.started_names(), vec!["build"]);
    }

    #[tokio::test]
    async fn test_empty_pipeline_succeeds() {
        let engine = Arc::new(ScriptedEngine::default());
        let report = Executor::new(engine).run(&Pipeline::new(vec![])).await;
        assert!(report.succeeded());
        assert!(report.jobs().is_empty());
    }
}
