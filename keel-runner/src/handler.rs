//! Pipeline event handler
//!
//! Drives one event through
//! `RECEIVED -> CONFIG_DERIVED -> {GATE_SKIP | PIPELINE_BUILT -> EXECUTING -> {SUCCEEDED | FAILED}} -> NOTIFIED -> DONE`.
//! A derivation failure jumps straight to NOTIFIED with a failed status.
//! Every path goes through the notification stage exactly once.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keel_core::domain::event::{Event, ProjectSecrets};
use keel_core::domain::notification::RunStatus;
use keel_core::{Gate, GateDecision, PipelineSettings, build_pipeline, derive_run_config};
use std::sync::Arc;
use tracing::{Instrument, debug, error, info, info_span};
use uuid::Uuid;

use crate::dispatcher::EventHandler;
use crate::executor::{ExecutionReport, Executor};
use crate::notify::NotificationStage;

/// States an event handling passes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Received,
    ConfigDerived,
    GateSkip,
    PipelineBuilt,
    Executing,
    Succeeded,
    Failed,
    Notified,
    Done,
}

/// Record of one handled event
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub phases: Vec<RunPhase>,
    pub status: RunStatus,
    /// Whether the completion notification was delivered
    pub notified: bool,
    /// Present only when the gate let the pipeline execute
    pub execution: Option<ExecutionReport>,
}

/// Handles push-like events: derive, gate, build, execute, notify
pub struct PipelineHandler {
    settings: Arc<PipelineSettings>,
    gate: Gate,
    executor: Executor,
    notifications: NotificationStage,
}

impl PipelineHandler {
    pub fn new(
        settings: Arc<PipelineSettings>,
        executor: Executor,
        notifications: NotificationStage,
    ) -> Self {
        let gate = Gate::new(settings.release_branch.clone());
        Self {
            settings,
            gate,
            executor,
            notifications,
        }
    }

    /// Handles `event` with `now` as the run's start time
    pub async fn handle_at(
        &self,
        event: &Event,
        secrets: &ProjectSecrets,
        now: DateTime<Utc>,
    ) -> RunReport {
        let run_id = Uuid::new_v4();
        let span = info_span!("run", %run_id, kind = %event.kind);

        self.run(run_id, event, secrets, now).instrument(span).await
    }

    async fn run(
        &self,
        run_id: Uuid,
        event: &Event,
        secrets: &ProjectSecrets,
        now: DateTime<Utc>,
    ) -> RunReport {
        let mut phases = vec![RunPhase::Received];
        let mut execution = None;

        let (status, notified) = self
            .notifications
            .guard(&secrets.notification_webhook, async {
                let config = match derive_run_config(event, secrets, &self.settings, now) {
                    Ok(config) => config,
                    Err(e) => {
                        error!("Failed to derive run configuration: {}", e);
                        return RunStatus::Failed {
                            failed_job: None,
                            reason: e.to_string(),
                        };
                    }
                };
                phases.push(RunPhase::ConfigDerived);

                info!(
                    "==> webhook ({}) with commit ID {}",
                    config.branch(),
                    config.commit_sha()
                );
                info!("==> Date {}", config.build_date());

                if let GateDecision::Skip { branch } = self.gate.evaluate(&config) {
                    phases.push(RunPhase::GateSkip);
                    if config.is_pull_request() {
                        debug!("No ref in payload, treating event as a pull request");
                    }
                    info!("==> {}", self.gate.skip_message());
                    return RunStatus::Skipped { branch };
                }

                let pipeline = build_pipeline(&config, &self.settings);
                phases.push(RunPhase::PipelineBuilt);

                info!(
                    "==> starting pipeline for docker image: {}:{}",
                    config.base_image_name(),
                    config.image_tag()
                );
                phases.push(RunPhase::Executing);
                let report = self.executor.run(&pipeline).await;

                let status = match report.failure() {
                    None => {
                        phases.push(RunPhase::Succeeded);
                        RunStatus::Succeeded {
                            image_tag: config.image_tag().to_string(),
                        }
                    }
                    Some(failure) => {
                        phases.push(RunPhase::Failed);
                        // engine output may echo registry details, keep it out
                        RunStatus::Failed {
                            failed_job: Some(failure.job.clone()),
                            reason: format!("exit code {}", failure.exit_code),
                        }
                    }
                };
                execution = Some(report);
                status
            })
            .await;

        phases.push(RunPhase::Notified);
        phases.push(RunPhase::Done);
        info!("Run {} finished: {:?}", run_id, status);

        RunReport {
            run_id,
            phases,
            status,
            notified,
            execution,
        }
    }
}

#[async_trait]
impl EventHandler for PipelineHandler {
    async fn handle(&self, event: &Event, secrets: &ProjectSecrets) -> RunReport {
        self.handle_at(event, secrets, Utc::now()).await
    }
}
