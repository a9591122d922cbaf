//! Per-request spans.

use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::middleware::Middleware;

/// Middleware opening an INFO span per request and logging its response.
pub fn trace_requests() -> Middleware {
    Middleware::layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}
