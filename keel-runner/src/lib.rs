//! Keel Runner
//!
//! Executes the pipelines assembled by `keel-core`.
//!
//! Architecture:
//! - Engine: the job-execution seam (`JobEngine`) and its podman implementation
//! - Executor: runs a pipeline's jobs strictly one after another
//! - Notify: the always-run completion notification and its delivery channels
//! - Handler: the per-event state machine tying derivation, gate, execution
//!   and notification together
//! - Dispatcher: explicit event kind -> handler routing

pub mod dispatcher;
pub mod engine;
pub mod executor;
pub mod handler;
pub mod notify;

pub use dispatcher::{Dispatch, Dispatcher, EventHandler};
pub use engine::{JobEngine, PodmanConfig, PodmanEngine};
pub use executor::{ExecutionReport, Executor, JobOutcome};
pub use handler::{PipelineHandler, RunPhase, RunReport};
pub use notify::{JobNotifier, NotificationStage, Notifier, WebhookNotifier};
