//! Pipeline domain types

use crate::domain::job::JobSpec;

/// Ordered sequence of jobs for one run
///
/// Built fresh for every event and consumed by the executor.
#[derive(Debug, PartialEq, Eq)]
pub struct Pipeline {
    jobs: Vec<JobSpec>,
}

impl Pipeline {
    pub fn new(jobs: Vec<JobSpec>) -> Self {
        Self { jobs }
    }

    pub fn jobs(&self) -> &[JobSpec] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn job_names(&self) -> Vec<&str> {
        self.jobs.iter().map(|job| job.name.as_str()).collect()
    }
}
