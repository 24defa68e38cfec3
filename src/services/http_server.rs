//! HTTP server service: binds the Axum app and runs it in a background task.
//!
//! Depends on the GraphQL service (and transitively database). Start order is
//! ensured by the service manager; this service builds [AppState](crate::app::AppState)
//! and the router in [start](Service::start) and runs the server until [stop](Service::stop).

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{error, info};

use crate::app::{AppState, build_app};
use crate::config::Config;
use crate::services::manager::{Service, ServiceHealth};

/// How long in-flight requests get to finish after shutdown is requested
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Configuration for the HTTP server service (bind address and app config).
#[derive(Clone)]
pub struct HttpServerConfig {
    pub config: Arc<Config>,
}

/// HTTP server service: binds and serves the Axum app in a background task.
pub struct HttpServerService {
    manager: Arc<crate::services::ServicesManager>,
    config: Arc<Config>,
    /// JoinHandle for the server task; set in start(), taken in stop().
    join_handle: parking_lot::RwLock<Option<tokio::task::JoinHandle<Result<()>>>>,
    /// Send to trigger server shutdown; set in start(), taken in stop().
    shutdown_tx: parking_lot::RwLock<Option<broadcast::Sender<()>>>,
}

impl HttpServerService {
    /// Create the service. Register with the manager (e.g. via builder) and call
    /// [start_all](crate::services::ServicesManager::start_all); [start](Service::start)
    /// will build the app and spawn the server task.
    pub fn new(manager: Arc<crate::services::ServicesManager>, config: Arc<Config>) -> Self {
        Self {
            manager,
            config,
            join_handle: parking_lot::RwLock::new(None),
            shutdown_tx: parking_lot::RwLock::new(None),
        }
    }
}

#[async_trait]
impl Service for HttpServerService {
    fn name(&self) -> &str {
        "http"
    }

    fn dependencies(&self) -> Vec<String> {
        vec!["graphql".to_string()]
    }

    async fn start(&self) -> Result<()> {
        info!(service = "http", "HTTP server service starting");

        let gql = self
            .manager
            .get_graphql()
            .await
            .ok_or_else(|| anyhow::anyhow!("graphql service not available"))?;
        let schema = gql
            .schema()
            .await
            .ok_or_else(|| anyhow::anyhow!("graphql schema not built"))?;

        let state = AppState {
            config: self.config.clone(),
            schema,
            services: self.manager.clone(),
        };

        let app = build_app(state);
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("HTTP server: bind to {} failed", addr))?;

        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let mut shutdown_rx = shutdown_tx.subscribe();
        let mut graceful_rx = shutdown_tx.subscribe();

        let serve_fut = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = graceful_rx.recv().await;
        });
        let join = tokio::spawn(async move {
            tokio::select! {
                result = serve_fut => result.context("axum::serve"),
                // Open subscription sockets would hold graceful shutdown forever
                _ = async {
                    let _ = shutdown_rx.recv().await;
                    tokio::time::sleep(SHUTDOWN_GRACE).await;
                } => Ok(()),
            }
        });

        *self.join_handle.write() = Some(join);
        *self.shutdown_tx.write() = Some(shutdown_tx);

        info!(service = "http", "HTTP server service started");
        info!(
            service = "http",
            "Listening on http://{}; GraphQL: http://{}/graphql",
            addr,
            addr
        );
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let tx = self.shutdown_tx.write().take();
        let handle = self.join_handle.write().take();
        if let Some(tx) = tx {
            let _ = tx.send(());
        }
        if let Some(h) = handle {
            match h.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(service = "http", error = ?e, "HTTP server exited with error"),
                Err(e) => error!(service = "http", error = %e, "HTTP server task panicked or was cancelled"),
            }
        }
        info!(service = "http", "HTTP server service stopped");
        Ok(())
    }

    async fn health(&self) -> Result<ServiceHealth> {
        match self.join_handle.read().as_ref() {
            Some(handle) if !handle.is_finished() => Ok(ServiceHealth::healthy()),
            Some(_) => Ok(ServiceHealth::unhealthy("server task exited")),
            None => Ok(ServiceHealth::unhealthy("server task not running")),
        }
    }
}
