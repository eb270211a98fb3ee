//! Event dispatcher
//!
//! Explicit mapping from event kind to handler. Every reachable route is
//! visible through [`Dispatcher::handled_kinds`], so nothing depends on a
//! live event source registering callbacks by name.

use async_trait::async_trait;
use keel_core::domain::event::{Event, EventKind, ProjectSecrets};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::handler::{PipelineHandler, RunReport};

/// Something that handles one kind of event
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &Event, secrets: &ProjectSecrets) -> RunReport;
}

/// Result of dispatching one event
#[derive(Debug)]
pub enum Dispatch {
    Handled(RunReport),
    /// No handler registered; nothing ran and nothing was notified
    Unhandled(EventKind),
}

/// Event kind -> handler routing table
#[derive(Clone, Default)]
pub struct Dispatcher {
    handlers: HashMap<EventKind, Arc<dyn EventHandler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes pushes and manual runs to the pipeline handler
    pub fn standard(pipeline: Arc<PipelineHandler>) -> Self {
        Self::new()
            .on(EventKind::Push, pipeline.clone())
            .on(EventKind::Exec, pipeline)
    }

    /// Registers `handler` for `kind`, replacing any previous one
    pub fn on(mut self, kind: EventKind, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.insert(kind, handler);
        self
    }

    pub fn handles(&self, kind: &EventKind) -> bool {
        self.handlers.contains_key(kind)
    }

    /// All routed kinds, sorted by wire name
    pub fn handled_kinds(&self) -> Vec<EventKind> {
        let mut kinds: Vec<EventKind> = self.handlers.keys().cloned().collect();
        kinds.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        kinds
    }

    pub async fn dispatch(&self, event: &Event, secrets: &ProjectSecrets) -> Dispatch {
        match self.handlers.get(&event.kind) {
            Some(handler) => Dispatch::Handled(handler.handle(event, secrets).await),
            None => {
                debug!("No handler registered for event kind '{}'", event.kind);
                Dispatch::Unhandled(event.kind.clone())
            }
        }
    }
}
