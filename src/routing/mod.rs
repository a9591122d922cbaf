//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (at startup):
//!     Mux / Group method call ("GET /users/{id}")
//!     → pattern.rs (split method, join group prefix)
//!     → matcher.rs (bind handler to template + method)
//!     → registry.rs (record method, infer HEAD for GET)
//!
//! Incoming Request (method, path):
//!     → mux.rs (lookup)
//!     → matched: group middleware chain → handler
//!     → unmatched: OPTIONS from registry, else not found
//! ```
//!
//! # Design Decisions
//! - Literal segments beat captures; no registration-order dependence
//! - Middleware added to a group after its routes still applies to them
//! - Independent groups drop every ancestor chain, the global one included

pub mod group;
pub mod matcher;
pub mod mux;
pub mod params;
pub mod pattern;
pub mod registry;
pub mod statics;

pub use group::Group;
pub use mux::Mux;
pub use params::{PathParams, PathParamsExt};
pub use registry::{Registry, Route};
