//! Keel Core
//!
//! Core types and pure pipeline logic for the Keel build-and-deploy pipeline.
//!
//! This crate contains:
//! - Domain types: events, run configuration, job specs, pipelines, notifications
//! - Config derivation: inbound event -> immutable `RunConfig`
//! - Pipeline assembly and the release-branch gate
//!
//! Nothing in here performs I/O. Execution lives in `keel-runner`.

pub mod builder;
pub mod derive;
pub mod domain;
pub mod error;
pub mod gate;
pub mod settings;

pub use builder::build_pipeline;
pub use derive::derive_run_config;
pub use error::{ConfigDerivationError, JobExecutionFailure, NotificationDeliveryFailure};
pub use gate::{Gate, GateDecision};
pub use settings::PipelineSettings;
