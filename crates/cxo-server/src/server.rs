use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;

use cxo_sync::SyncEngine;

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::AppState;
use crate::router::build_router;
use crate::scheduler::NotificationScheduler;

/// CXO node HTTP server.
pub struct CxoServer {
    config: ServerConfig,
    state: AppState,
}

impl CxoServer {
    pub fn new(config: ServerConfig, engine: Arc<SyncEngine>) -> Self {
        let scheduler = NotificationScheduler::new(engine, config.settle_delay);
        Self {
            config,
            state: AppState::new(scheduler),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &NotificationScheduler {
        self.state.scheduler()
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Serve until ctrl-c.
    pub async fn serve(self) -> ServerResult<()> {
        self.serve_with_shutdown(shutdown_signal()).await
    }

    /// Resume pending announcements, serve until `signal` resolves, then
    /// cancel waiting updates and wait for running ones.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let resumed = self.scheduler().resume_pending()?;
        if resumed > 0 {
            tracing::info!(count = resumed, "resumed pending announcements");
        }

        let listener = TcpListener::bind(self.config.listen_addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "CXO node listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(signal)
            .await?;

        tracing::info!(in_flight = self.scheduler().in_flight(), "waiting for scheduled updates");
        self.scheduler().shutdown().await;
        tracing::info!("CXO node stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "cannot listen for ctrl-c, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
