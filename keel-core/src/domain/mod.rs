//! Core domain types
//!
//! This module contains the domain structures shared between the pure
//! pipeline logic in this crate and the executor in `keel-runner`.

pub mod event;
pub mod job;
pub mod notification;
pub mod pipeline;
pub mod run;
pub mod secret;
