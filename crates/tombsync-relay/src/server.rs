//! Relay server implementation

use axum::{middleware, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tombsync_core::{config::RelayConfig, Error, Result};
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing::{info, warn};

use crate::events::DeletionDispatcher;
use crate::metrics;
use crate::middleware::{assign_request_id, require_token};
use crate::registry::TargetRegistry;
use crate::routes;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<DeletionDispatcher>,
    pub auth_token: Option<Arc<str>>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(config: &RelayConfig, registry: Arc<TargetRegistry>) -> Self {
        Self {
            dispatcher: Arc::new(DeletionDispatcher::new(
                registry,
                config.replication.dry_run,
            )),
            auth_token: config.auth.token().map(Arc::from),
            max_body_bytes: config.server.max_body_bytes,
        }
    }
}

/// Build the webhook router: every path and method lands on one handler
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .fallback(routes::handle_webhook)
        .layer(middleware::from_fn_with_state(state.clone(), require_token))
        .layer(middleware::from_fn(assign_request_id))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .with_state(state)
}

/// Delete replication relay
pub struct RelayServer {
    config: RelayConfig,
}

impl RelayServer {
    pub fn new(config: RelayConfig) -> Self {
        Self { config }
    }

    /// Validate configuration, connect every target and serve until a
    /// shutdown signal arrives. Every error returned before the listener is
    /// up is a startup error.
    pub async fn run(self) -> Result<()> {
        let registry = TargetRegistry::build(
            &self.config.targets,
            self.config.replication.insecure,
            &self.config.client,
        )?;

        if let Some(address) = &self.config.metrics.listen_address {
            metrics::install_exporter(address)?;
        }
        metrics::set_target_count(registry.len());
        info!(sites = ?registry.names(), "Replicating deletes to {} remote site(s)", registry.len());

        let state = AppState::new(&self.config, Arc::new(registry));
        let app = build_router(state);

        let addr = self.config.server.bind_address();
        let listener = TcpListener::bind(&addr).await.map_err(|e| Error::Bind {
            address: addr.clone(),
            reason: e.to_string(),
        })?;

        if self.config.replication.dry_run {
            warn!("Dry run enabled; deletions will be logged but not executed");
        }
        if self.config.auth.token().is_none() {
            warn!("No auth token configured; accepting unauthenticated webhooks");
        }
        info!("Started listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Relay stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
