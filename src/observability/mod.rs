//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Mux and adapters produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!     → tracing.rs (per-request spans)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request metrics and spans are plain middleware, mounted like any other
//! - Request ID flows through spans via the `x-request-id` header
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
pub mod tracing;
