//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap a configured `Mux` in an Axum Router
//! - Apply server-wide limits (request timeout)
//! - Bind server to listener
//! - Stop accepting and drain on shutdown

use axum::Router;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::timeout::TimeoutLayer;

use crate::config::ServerConfig;
use crate::routing::Mux;

/// HTTP server for a multiplexer.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server serving `mux`.
    pub fn new(mux: Mux, config: ServerConfig) -> Self {
        tracing::info!(
            routes = mux.list_routes().len(),
            request_timeout_secs = config.timeouts.request_secs,
            "HTTP server configured"
        );
        let router = Self::build_router(mux, &config);
        Self { router, config }
    }

    /// Build the Axum router with server-wide layers.
    #[allow(deprecated)]
    fn build_router(mux: Mux, config: &ServerConfig) -> Router {
        mux.into_router()
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
    }

    /// Run the server until `shutdown` fires, then wait for in-flight
    /// requests to finish.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;
    use axum::extract::Request;

    #[tokio::test]
    async fn test_serves_until_shutdown() {
        let mux = Mux::default();
        mux.get("/ping", |_req: Request| async { "pong" });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Shutdown::new();
        let server = HttpServer::new(mux, ServerConfig::default());
        let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

        let body = reqwest::get(format!("http://{addr}/ping"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "pong");

        shutdown.trigger();
        handle.await.unwrap().unwrap();
    }
}
