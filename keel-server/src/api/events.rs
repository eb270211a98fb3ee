//! Event API Handler
//!
//! Accepts source-control events and hands each one to the dispatcher in its
//! own task. Runs share nothing mutable; the response only acknowledges
//! receipt.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use keel_core::domain::event::Event;
use keel_runner::Dispatch;
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::api::AppState;
use crate::api::error::ApiResult;

/// Acknowledgement returned for every well-formed event
#[derive(Debug, Serialize)]
pub struct EventAccepted {
    pub delivery_id: Uuid,
    /// False when no handler is routed for the event kind
    pub handled: bool,
}

/// POST /events
pub async fn receive_event(
    State(state): State<AppState>,
    payload: Result<Json<Event>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<EventAccepted>)> {
    let Json(event) = payload?;
    let delivery_id = Uuid::new_v4();

    if !state.dispatcher.handles(&event.kind) {
        tracing::debug!("Ignoring '{}' event {}", event.kind, delivery_id);
        return Ok((
            StatusCode::OK,
            Json(EventAccepted {
                delivery_id,
                handled: false,
            }),
        ));
    }

    tracing::info!("Accepted '{}' event {}", event.kind, delivery_id);

    let span = tracing::info_span!("delivery", %delivery_id);
    tokio::spawn(
        async move {
            match state.dispatcher.dispatch(&event, &state.secrets).await {
                Dispatch::Handled(report) => {
                    tracing::info!(
                        "Run {} done: {:?} (notified: {})",
                        report.run_id,
                        report.status,
                        report.notified
                    );
                }
                Dispatch::Unhandled(kind) => {
                    tracing::debug!("No handler for '{}' event", kind);
                }
            }
        }
        .instrument(span),
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(EventAccepted {
            delivery_id,
            handled: true,
        }),
    ))
}
