//! HTTP routing and middleware composition on top of Axum.
//!
//! A [`Mux`] owns a global middleware chain and a tree of route [`Group`]s.
//! Each group carries a path prefix and its own chain; a request runs
//! through the chains from the root down to its group, unless a group on the
//! way was marked independent.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod middleware;
pub mod observability;
pub mod routing;

pub use config::ServerConfig;
pub use error::RouterError;
pub use http::{Handler, HttpServer, IntoHandler};
pub use lifecycle::Shutdown;
pub use middleware::{after, around, before, Chain, Middleware, Next};
pub use routing::{Group, Mux, PathParamsExt};
