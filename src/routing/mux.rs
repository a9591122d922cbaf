//! The top-level request multiplexer.
//!
//! # Responsibilities
//! - Own the global middleware chain, the registry and the path matcher
//! - Dispatch every request to its bound handler or to the fallback
//! - Answer OPTIONS automatically from the registry and produce 404s
//! - Expose the route table for introspection
//!
//! # Fallback State Machine
//! ```text
//! unmatched request
//!     → method == OPTIONS ?
//!         yes → allowed methods for the path ?
//!                 some → 204 No Content + Allow
//!                 none → not found
//!         no  → not found
//! not found → custom handler wrapped in the global chain, or plain 404
//! ```
//!
//! # Design Decisions
//! - The automatic OPTIONS response does not pass through middleware; a custom
//!   not-found handler does, through the global chain only
//! - A path that matches a template but not the method reuses the template's
//!   registry entry, so `OPTIONS /users/7` lists the methods of `/users/{id}`
//! - Build once at startup; registration after serving begins is unsupported

use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::task::{Context, Poll};
use tower::Service;

use crate::error::RouterError;
use crate::http::handler::{not_found_response, Handler, IntoHandler};
use crate::middleware::{Chain, Middleware};
use crate::routing::group::{Binding, Group, Node};
use crate::routing::matcher::{Lookup, Matcher};
use crate::routing::registry::{Registry, Route};

/// State shared by the mux and every group handle.
pub(crate) struct Core {
    root: Arc<Node>,
    registry: Arc<Registry>,
    matcher: RwLock<Matcher<Binding>>,
    not_found: RwLock<Option<Arc<Binding>>>,
    generation: AtomicU64,
}

impl Core {
    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub(crate) fn bump_generation(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Insert a binding into the matcher and record it in the registry.
    pub(crate) fn bind(
        &self,
        method: Option<&Method>,
        pattern: &str,
        binding: Binding,
    ) -> Result<(), RouterError> {
        // Equivalent spellings share a matcher slot; the registry keys on it too.
        let key = self
            .matcher
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(method, pattern, binding)?;

        match method {
            Some(method) => self.registry.register(&key, method),
            None => self.registry.register_any(&key),
        }

        tracing::debug!(
            method = method.map_or("*", Method::as_str),
            pattern = %pattern,
            "Route registered"
        );
        Ok(())
    }

    fn lookup(&self, method: &Method, path: &str) -> Lookup<Binding> {
        self.matcher
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .lookup(method, path)
    }

    async fn handle_options(&self, req: Request, pattern: Option<String>) -> Response {
        if req.method() != Method::OPTIONS {
            return self.handle_not_found(req).await;
        }

        let key = pattern.unwrap_or_else(|| req.uri().path().to_string());
        let Some(allow) = self.registry.allow_header(&key) else {
            return self.handle_not_found(req).await;
        };

        match HeaderValue::from_str(&allow) {
            Ok(value) => {
                tracing::trace!(path = %req.uri().path(), allow = %allow, "Automatic OPTIONS response");
                (StatusCode::NO_CONTENT, [(header::ALLOW, value)]).into_response()
            }
            Err(err) => {
                tracing::error!(pattern = %key, error = %err, "Allow header is not a valid header value");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }

    async fn handle_not_found(&self, req: Request) -> Response {
        let custom = self
            .not_found
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match custom {
            Some(binding) => binding.resolve(self.generation()).call(req).await,
            None => not_found_response(),
        }
    }
}

/// The request multiplexer: routes, groups, global middleware and the
/// automatic OPTIONS/404 fallback.
///
/// Cloning a `Mux` yields another handle to the same router.
#[derive(Clone)]
pub struct Mux {
    core: Arc<Core>,
}

impl Mux {
    /// Create a mux whose global chain is `middlewares`.
    pub fn new<I>(middlewares: I) -> Self
    where
        I: IntoIterator<Item = Middleware>,
    {
        let core = Core {
            root: Node::root(Chain::new(middlewares)),
            registry: Arc::new(Registry::new()),
            matcher: RwLock::new(Matcher::new()),
            not_found: RwLock::new(None),
            generation: AtomicU64::new(0),
        };
        Self {
            core: Arc::new(core),
        }
    }

    /// The implicit root group: empty prefix, global chain, no parent.
    pub(crate) fn root(&self) -> Group {
        Group::new(Arc::clone(&self.core.root), Arc::clone(&self.core))
    }

    /// Append middleware to the global chain.
    ///
    /// Applies to every non-independent route, including routes registered
    /// earlier.
    pub fn use_middleware<I>(&self, middlewares: I) -> &Self
    where
        I: IntoIterator<Item = Middleware>,
    {
        self.root().use_middleware(middlewares);
        self
    }

    /// The global chain.
    pub fn middleware_chain(&self) -> Chain {
        self.core.root.middleware_chain()
    }

    /// Create a top-level group under `prefix` and configure it.
    pub fn prefix_group<F>(&self, prefix: &str, configure: F) -> Group
    where
        F: FnOnce(&Group),
    {
        self.root().prefix_group(prefix, configure)
    }

    /// Create a top-level group without a prefix and configure it.
    pub fn group<F>(&self, configure: F) -> Group
    where
        F: FnOnce(&Group),
    {
        self.root().group(configure)
    }

    /// Bind `handler` to `GET /` exactly; descendants of `/` are not matched.
    pub fn home(&self, handler: impl IntoHandler) -> &Self {
        self.get("/{$}", handler)
    }

    /// Replace the default 404 response. The handler runs inside the global chain.
    pub fn not_found(&self, handler: impl IntoHandler) -> &Self {
        let binding = Binding::new(Arc::clone(&self.core.root), handler.into_handler());
        *self
            .core
            .not_found
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(binding));
        self
    }

    /// Bind a GET handler. HEAD requests are answered by it too.
    ///
    /// # Panics
    /// On an invalid or conflicting pattern; see [`try_handle`](Self::try_handle).
    pub fn get(&self, pattern: &str, handler: impl IntoHandler) -> &Self {
        self.root().get(pattern, handler);
        self
    }

    pub fn post(&self, pattern: &str, handler: impl IntoHandler) -> &Self {
        self.root().post(pattern, handler);
        self
    }

    pub fn put(&self, pattern: &str, handler: impl IntoHandler) -> &Self {
        self.root().put(pattern, handler);
        self
    }

    pub fn delete(&self, pattern: &str, handler: impl IntoHandler) -> &Self {
        self.root().delete(pattern, handler);
        self
    }

    pub fn patch(&self, pattern: &str, handler: impl IntoHandler) -> &Self {
        self.root().patch(pattern, handler);
        self
    }

    pub fn options(&self, pattern: &str, handler: impl IntoHandler) -> &Self {
        self.root().options(pattern, handler);
        self
    }

    pub fn head(&self, pattern: &str, handler: impl IntoHandler) -> &Self {
        self.root().head(pattern, handler);
        self
    }

    /// Bind a handler using the method prefix of `pattern`; without one the
    /// handler answers every method.
    pub fn handle_func(&self, pattern: &str, handler: impl IntoHandler) -> &Self {
        self.root().handle_func(pattern, handler);
        self
    }

    /// Bind a handler, returning misconfiguration as an error.
    pub fn try_handle(
        &self,
        method: Option<Method>,
        pattern: &str,
        handler: impl IntoHandler,
    ) -> Result<(), RouterError> {
        self.root().try_handle(method, pattern, handler)
    }

    /// Sorted allowed methods for a registered pattern.
    pub fn allowed_methods(&self, pattern: &str) -> Vec<String> {
        self.core.registry.allowed_methods(pattern)
    }

    /// Snapshot of the route table, sorted by pattern.
    pub fn list_routes(&self) -> Vec<Route> {
        self.core.registry.routes()
    }

    /// The route table as pretty-printed JSON.
    pub fn dump_routes(&self) -> Result<String, RouterError> {
        Ok(serde_json::to_string_pretty(&self.list_routes())?)
    }

    /// A handler serving the route table as JSON, for mounting on an
    /// introspection path.
    pub fn routes_handler(&self) -> Handler {
        let registry = Arc::clone(&self.core.registry);
        Handler::new(move |_req: Request| {
            let routes = registry.routes();
            async move { axum::Json(routes) }
        })
    }

    /// Route one request.
    pub async fn dispatch(&self, mut req: Request) -> Response {
        let lookup = self.core.lookup(req.method(), req.uri().path());
        match lookup {
            Lookup::Matched { value, params } => {
                req.extensions_mut().insert(params);
                let handler = value.resolve(self.core.generation());
                handler.call(req).await
            }
            Lookup::Unmatched { pattern } => self.core.handle_options(req, pattern).await,
        }
    }

    /// Wrap the mux in an `axum::Router` so it can be handed to `axum::serve`.
    pub fn into_router(self) -> axum::Router {
        axum::Router::new().fallback_service(self)
    }
}

impl Default for Mux {
    fn default() -> Self {
        Self::new(Vec::<Middleware>::new())
    }
}

impl fmt::Debug for Mux {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mux")
            .field("routes", &self.core.registry.len())
            .field("global_middleware", &self.middleware_chain().len())
            .finish()
    }
}

impl Service<Request> for Mux {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send + 'static>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let mux = self.clone();
        Box::pin(async move { Ok(mux.dispatch(req).await) })
    }
}
