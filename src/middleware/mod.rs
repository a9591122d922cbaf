//! Middleware composition subsystem.
//!
//! # Data Flow
//! ```text
//! Middleware values (decorators: Handler → Handler)
//!     → chain.rs (immutable ordered Chain)
//!     → Chain::then(handler)
//!     → wrapped Handler bound by the router
//! ```
//!
//! # Design Decisions
//! - Middleware hold no shared mutable state of their own
//! - Registration order is nesting order: first registered is outermost
//! - tower layers are accepted as middleware through `Middleware::layer`

pub mod chain;
pub mod wrap;

pub use chain::{after, around, before, Chain};
pub use wrap::{Middleware, Next};
