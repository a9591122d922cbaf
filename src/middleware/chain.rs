//! Immutable middleware chains.
//!
//! # Ordering
//! ```text
//! Chain::new([m0, m1, m2]).then(h)
//!
//!   m0-pre → m1-pre → m2-pre → h → m2-post → m1-post → m0-post
//! ```
//!
//! # Design Decisions
//! - Backed by `Arc<[Middleware]>`: clones are cheap and share storage
//! - `append`/`extend` build a new slice; the receiver is never mutated, so a
//!   chain can be shared across tasks and reused by many `then` calls

use std::sync::Arc;

use crate::http::handler::{Handler, IntoHandler};
use crate::middleware::Middleware;

/// An ordered, immutable sequence of middleware.
#[derive(Clone, Debug)]
pub struct Chain {
    middlewares: Arc<[Middleware]>,
}

impl Chain {
    /// Snapshot `middlewares` into a new chain.
    pub fn new<I>(middlewares: I) -> Self
    where
        I: IntoIterator<Item = Middleware>,
    {
        Self {
            middlewares: middlewares.into_iter().collect(),
        }
    }

    /// An empty chain; `then` returns the handler unchanged.
    pub fn empty() -> Self {
        Self {
            middlewares: Arc::from(Vec::<Middleware>::new()),
        }
    }

    /// A new chain with `middlewares` appended after this chain's middleware.
    pub fn append<I>(&self, middlewares: I) -> Self
    where
        I: IntoIterator<Item = Middleware>,
    {
        Self::new(self.middlewares.iter().cloned().chain(middlewares))
    }

    /// A new chain with `other` appended; this chain's middleware stay outermost.
    pub fn extend(&self, other: &Chain) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        self.append(other.middlewares.iter().cloned())
    }

    /// Wrap `handler` so that the first middleware is the outermost.
    pub fn then(&self, handler: impl IntoHandler) -> Handler {
        self.middlewares
            .iter()
            .rev()
            .fold(handler.into_handler(), |next, mw| mw.wrap(next))
    }

    /// Like [`then`](Self::then), substituting the default 404 handler when
    /// no handler is given.
    pub fn then_optional(&self, handler: Option<Handler>) -> Handler {
        self.then(handler.unwrap_or_else(Handler::not_found))
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Middleware> {
        self.middlewares.iter()
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::empty()
    }
}

impl FromIterator<Middleware> for Chain {
    fn from_iter<T: IntoIterator<Item = Middleware>>(iter: T) -> Self {
        Self::new(iter)
    }
}

/// Wrap `handler` in `middlewares` without keeping a chain around.
pub fn around<I>(handler: impl IntoHandler, middlewares: I) -> Handler
where
    I: IntoIterator<Item = Middleware>,
{
    Chain::new(middlewares).then(handler)
}

/// Same as [`around`]; reads naturally when the middleware run before the handler.
pub fn before<I>(handler: impl IntoHandler, middlewares: I) -> Handler
where
    I: IntoIterator<Item = Middleware>,
{
    around(handler, middlewares)
}

/// Wrap `handler` with the nesting reversed: the first middleware listed runs
/// closest to the handler.
pub fn after<I>(handler: impl IntoHandler, middlewares: I) -> Handler
where
    I: IntoIterator<Item = Middleware>,
{
    let mut middlewares: Vec<Middleware> = middlewares.into_iter().collect();
    middlewares.reverse();
    Chain::new(middlewares).then(handler)
}
