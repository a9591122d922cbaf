//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, timeout, graceful shutdown)
//!     → Mux (routing, middleware chains)
//!     → handler.rs (type-erased request handlers)
//!     → Send to client
//! ```
//!
//! request.rs provides the request ID middleware, normally the first entry
//! of the global chain.

pub mod handler;
pub mod request;
pub mod server;

pub use handler::{Handler, IntoHandler};
pub use request::{request_id, RequestIdExt, X_REQUEST_ID};
pub use server::HttpServer;
