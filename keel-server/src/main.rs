//! Keel Server
//!
//! Receives source-control events over HTTP and runs the build-and-deploy
//! pipeline for each one.
//!
//! Architecture:
//! - Configuration: secrets and settings from the environment
//! - Runner: podman job engine, sequential executor, notification stage
//! - Dispatcher: event kind -> pipeline handler
//! - API: `POST /events`, `GET /health`

mod api;
mod config;

use anyhow::{Context, Result};
use keel_runner::engine::check_podman_available;
use keel_runner::{
    Dispatcher, Executor, JobEngine, JobNotifier, NotificationStage, Notifier, PipelineHandler,
    PodmanEngine, WebhookNotifier,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::AppState;
use crate::config::{Config, NotifierKind};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keel_server=info,keel_runner=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Keel Server");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate()?;
    info!(
        "Loaded configuration: bind_addr={}, release_branch={}, notifier={:?}",
        config.bind_addr, config.settings.release_branch, config.notifier
    );

    if let Err(e) = check_podman_available(&config.podman.binary).await {
        warn!("Jobs will fail until podman is available: {:#}", e);
    }

    let dispatcher = build_dispatcher(&config)?;
    info!("Routing event kinds: {:?}", dispatcher.handled_kinds());

    let app = api::create_router(AppState {
        dispatcher: Arc::new(dispatcher),
        secrets: Arc::new(config.secrets.clone()),
    });

    info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}

/// Wires engine, executor, notifier and handler into the dispatcher
fn build_dispatcher(config: &Config) -> Result<Dispatcher> {
    let settings = Arc::new(config.settings.clone());
    let engine: Arc<dyn JobEngine> = Arc::new(PodmanEngine::new(config.podman.clone()));

    let notifier: Arc<dyn Notifier> = match config.notifier {
        NotifierKind::Job => Arc::new(JobNotifier::new(
            engine.clone(),
            &settings.notifier_image,
        )),
        NotifierKind::Webhook => Arc::new(
            WebhookNotifier::new(config.notify_timeout)
                .context("Failed to create webhook notifier")?,
        ),
    };

    let handler = PipelineHandler::new(
        settings.clone(),
        Executor::new(engine),
        NotificationStage::new(notifier, &settings.sender),
    );

    Ok(Dispatcher::standard(Arc::new(handler)))
}
