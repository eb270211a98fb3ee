//! Release-branch gate

use crate::domain::run::RunConfig;

/// Decision for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Execute,
    Skip { branch: String },
}

/// Lets the pipeline execute only for the release branch
#[derive(Debug, Clone)]
pub struct Gate {
    release_branch: String,
}

impl Gate {
    pub fn new(release_branch: impl Into<String>) -> Self {
        Self {
            release_branch: release_branch.into(),
        }
    }

    /// Exact, case-sensitive branch comparison
    pub fn evaluate(&self, config: &RunConfig) -> GateDecision {
        self.evaluate_branch(config.branch())
    }

    pub fn evaluate_branch(&self, branch: &str) -> GateDecision {
        if branch == self.release_branch {
            GateDecision::Execute
        } else {
            GateDecision::Skip {
                branch: branch.to_string(),
            }
        }
    }

    /// Diagnostic emitted instead of executing any job
    pub fn skip_message(&self) -> String {
        format!("no jobs to run when not {}", self.release_branch)
    }
}
