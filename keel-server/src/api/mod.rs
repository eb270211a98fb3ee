//! API Module
//!
//! HTTP surface of the event receiver.
//! Each submodule handles endpoints for a specific concern.

pub mod error;
pub mod events;
pub mod health;

use axum::{
    Router,
    routing::{get, post},
};
use keel_core::domain::event::ProjectSecrets;
use keel_runner::Dispatcher;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared, read-only state handed to every request
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub secrets: Arc<ProjectSecrets>,
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Event delivery
        .route("/events", post(events::receive_event))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
