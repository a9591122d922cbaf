//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Record request counts and latency from inside the middleware chain
//! - Expose a Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `mux_requests_total` (counter): total requests by method, status
//! - `mux_request_duration_seconds` (histogram): latency distribution
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade, so it is a no-op until an
//!   exporter is installed
//! - The exporter is installed at most once per process

use axum::extract::Request;
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Instant;

use crate::middleware::{Middleware, Next};

static EXPORTER: OnceLock<()> = OnceLock::new();

/// Start the Prometheus exporter on `addr`.
///
/// Later calls are ignored. Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    EXPORTER.get_or_init(|| {
        match metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
        {
            Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
            Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
        }
    });
}

/// Record one finished request.
pub fn record_request(method: &str, status: u16, started: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    metrics::counter!("mux_requests_total", "method" => method.clone(), "status" => status.clone())
        .increment(1);
    metrics::histogram!("mux_request_duration_seconds", "method" => method, "status" => status)
        .record(started.elapsed().as_secs_f64());
}

/// Middleware recording every request that passes through it.
pub fn track_requests() -> Middleware {
    Middleware::from_fn(|req: Request, next: Next| async move {
        let started = Instant::now();
        let method = req.method().to_string();
        let res = next.run(req).await;
        record_request(&method, res.status().as_u16(), started);
        res
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::handler::Handler;
    use axum::body::Body;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_tracking_is_transparent_without_exporter() {
        let handler = track_requests().wrap(Handler::new(|_req: Request| async {
            StatusCode::CREATED
        }));
        let res = handler.call(Request::new(Body::empty())).await;
        assert_eq!(res.status(), StatusCode::CREATED);
    }
}
