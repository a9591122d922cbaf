//! Route groups.
//!
//! # Responsibilities
//! - Scope routes under a URL prefix
//! - Carry middleware that applies to every route in the subtree
//! - Resolve the effective middleware chain through the ancestor links
//!
//! # Middleware Resolution
//! ```text
//! Mux (global chain)
//!  └─ /api        use(auth)
//!      └─ /v1     use(audit)          GET /api/v1/users → global, auth, audit, handler
//!  └─ /hooks      independent()
//!                 use(signature)      POST /hooks/stripe → signature, handler
//! ```
//!
//! # Design Decisions
//! - Chains are resolved from live group state, so `use_middleware` affects
//!   routes registered before the call as well as after it
//! - Resolved handlers are cached per binding and invalidated by a mux-wide
//!   generation counter bumped on every `use_middleware`/`independent` call
//! - Mutating groups while traffic is being served is unsupported: it is
//!   memory safe, but in-flight requests may observe either chain

use arc_swap::ArcSwapOption;
use axum::http::Method;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::RouterError;
use crate::http::handler::{Handler, IntoHandler};
use crate::middleware::{Chain, Middleware};
use crate::routing::mux::Core;
use crate::routing::pattern::{self, Pattern};

#[derive(Debug)]
struct NodeState {
    chain: Chain,
    independent: bool,
}

/// One node of the group tree. The mux itself is the root node; its own
/// chain is the global chain.
#[derive(Debug)]
pub(crate) struct Node {
    prefix: String,
    parent: Option<Arc<Node>>,
    state: RwLock<NodeState>,
}

impl Node {
    pub(crate) fn root(chain: Chain) -> Arc<Self> {
        Arc::new(Self {
            prefix: String::new(),
            parent: None,
            state: RwLock::new(NodeState {
                chain,
                independent: false,
            }),
        })
    }

    fn child(parent: &Arc<Node>, prefix: &str) -> Arc<Self> {
        Arc::new(Self {
            prefix: pattern::join(&parent.prefix, prefix),
            parent: Some(Arc::clone(parent)),
            state: RwLock::new(NodeState {
                chain: Chain::empty(),
                independent: false,
            }),
        })
    }

    fn own(&self) -> (Chain, bool) {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        (state.chain.clone(), state.independent)
    }

    pub(crate) fn append(&self, middlewares: Vec<Middleware>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.chain = state.chain.append(middlewares);
    }

    fn make_independent(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.independent = true;
        state.chain = Chain::empty();
    }

    /// Effective chain, outermost first.
    ///
    /// Walks up to the first independent node (or the root) collecting own
    /// chains leaf-to-root, then composes them root-to-leaf.
    pub(crate) fn middleware_chain(&self) -> Chain {
        let mut chains = Vec::new();
        let mut current = Some(self);
        while let Some(node) = current {
            let (chain, independent) = node.own();
            chains.push(chain);
            if independent {
                break;
            }
            current = node.parent.as_deref();
        }
        chains
            .iter()
            .rev()
            .fold(Chain::empty(), |acc, chain| acc.extend(chain))
    }
}

#[derive(Debug)]
struct Resolved {
    generation: u64,
    handler: Handler,
}

/// A handler bound to the node it was registered under.
pub(crate) struct Binding {
    node: Arc<Node>,
    handler: Handler,
    resolved: ArcSwapOption<Resolved>,
}

impl Binding {
    pub(crate) fn new(node: Arc<Node>, handler: Handler) -> Self {
        Self {
            node,
            handler,
            resolved: ArcSwapOption::empty(),
        }
    }

    /// The handler wrapped in its node's current effective chain.
    pub(crate) fn resolve(&self, generation: u64) -> Handler {
        let current = self.resolved.load();
        if let Some(resolved) = &*current {
            if resolved.generation == generation {
                return resolved.handler.clone();
            }
        }
        let handler = self.node.middleware_chain().then(self.handler.clone());
        self.resolved.store(Some(Arc::new(Resolved {
            generation,
            handler: handler.clone(),
        })));
        handler
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("prefix", &self.node.prefix)
            .finish_non_exhaustive()
    }
}

/// A prefixed routing namespace with its own middleware.
///
/// Groups are cheap handles; cloning one yields another handle to the same
/// group.
#[derive(Clone)]
pub struct Group {
    node: Arc<Node>,
    core: Arc<Core>,
}

impl Group {
    pub(crate) fn new(node: Arc<Node>, core: Arc<Core>) -> Self {
        Self { node, core }
    }

    /// Full prefix of this group, ancestors included. Empty for the mux root.
    pub fn prefix(&self) -> &str {
        &self.node.prefix
    }

    /// Append middleware to this group's own chain.
    ///
    /// Applies to every route under this group and its descendants, including
    /// routes registered before this call.
    pub fn use_middleware<I>(&self, middlewares: I) -> &Self
    where
        I: IntoIterator<Item = Middleware>,
    {
        self.node.append(middlewares.into_iter().collect());
        self.core.bump_generation();
        self
    }

    /// Detach this group from all inherited middleware.
    ///
    /// Clears the group's own chain and stops the ancestor walk here, so
    /// middleware added afterwards with `use_middleware` form the entire
    /// chain for this subtree. Mux-level middleware no longer apply.
    pub fn independent(&self) -> &Self {
        self.node.make_independent();
        self.core.bump_generation();
        tracing::debug!(prefix = %self.node.prefix, "Group detached from inherited middleware");
        self
    }

    pub fn is_independent(&self) -> bool {
        self.node.own().1
    }

    /// The chain currently applied to handlers of this group.
    pub fn middleware_chain(&self) -> Chain {
        self.node.middleware_chain()
    }

    /// Create a child group under `prefix` and configure it.
    pub fn prefix_group<F>(&self, prefix: &str, configure: F) -> Group
    where
        F: FnOnce(&Group),
    {
        let child = Group::new(Node::child(&self.node, prefix), Arc::clone(&self.core));
        configure(&child);
        child
    }

    /// Create a child group with the same prefix and configure it.
    pub fn group<F>(&self, configure: F) -> Group
    where
        F: FnOnce(&Group),
    {
        self.prefix_group("", configure)
    }

    /// Bind a GET handler. HEAD requests are answered by it too.
    ///
    /// # Panics
    /// On an invalid or conflicting pattern; see [`try_handle`](Self::try_handle).
    pub fn get(&self, pattern: &str, handler: impl IntoHandler) -> &Self {
        self.route(Some(Method::GET), pattern, handler)
    }

    /// Bind a POST handler.
    pub fn post(&self, pattern: &str, handler: impl IntoHandler) -> &Self {
        self.route(Some(Method::POST), pattern, handler)
    }

    /// Bind a PUT handler.
    pub fn put(&self, pattern: &str, handler: impl IntoHandler) -> &Self {
        self.route(Some(Method::PUT), pattern, handler)
    }

    /// Bind a DELETE handler.
    pub fn delete(&self, pattern: &str, handler: impl IntoHandler) -> &Self {
        self.route(Some(Method::DELETE), pattern, handler)
    }

    /// Bind a PATCH handler.
    pub fn patch(&self, pattern: &str, handler: impl IntoHandler) -> &Self {
        self.route(Some(Method::PATCH), pattern, handler)
    }

    /// Bind an OPTIONS handler, replacing the automatic response for this path.
    pub fn options(&self, pattern: &str, handler: impl IntoHandler) -> &Self {
        self.route(Some(Method::OPTIONS), pattern, handler)
    }

    /// Bind a HEAD handler.
    pub fn head(&self, pattern: &str, handler: impl IntoHandler) -> &Self {
        self.route(Some(Method::HEAD), pattern, handler)
    }

    /// Bind a handler using the method prefix of `pattern` (`"PUT /x"`); a
    /// pattern without one binds every method.
    pub fn handle_func(&self, pattern: &str, handler: impl IntoHandler) -> &Self {
        self.route(None, pattern, handler)
    }

    /// Bind a handler, returning misconfiguration as an error.
    ///
    /// `method` overrides the pattern's method prefix; the two must agree
    /// when both are given.
    pub fn try_handle(
        &self,
        method: Option<Method>,
        pattern: &str,
        handler: impl IntoHandler,
    ) -> Result<(), RouterError> {
        let parsed = Pattern::parse(pattern)?;
        let method = match (method, parsed.method) {
            (Some(expected), Some(declared)) if expected != declared => {
                return Err(RouterError::MethodMismatch {
                    pattern: pattern.to_string(),
                    declared: declared.to_string(),
                    expected: expected.to_string(),
                });
            }
            (Some(method), _) | (None, Some(method)) => Some(method),
            (None, None) => None,
        };

        let full = pattern::join(&self.node.prefix, &parsed.path);
        let binding = Binding::new(Arc::clone(&self.node), handler.into_handler());
        self.core.bind(method.as_ref(), &full, binding)
    }

    fn route(&self, method: Option<Method>, pattern: &str, handler: impl IntoHandler) -> &Self {
        if let Err(err) = self.try_handle(method, pattern, handler) {
            panic!("failed to register route `{pattern}` under `{}`: {err}", self.node.prefix);
        }
        self
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("prefix", &self.node.prefix)
            .field("independent", &self.is_independent())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::Next;
    use crate::routing::Mux;
    use axum::body::Body;
    use axum::extract::Request;
    use axum::http::StatusCode;
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn tag(log: &Log, name: &'static str) -> Middleware {
        let log = Arc::clone(log);
        Middleware::from_fn(move |req: Request, next: Next| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(name);
                next.run(req).await
            }
        })
    }

    async fn send(mux: &Mux, method: Method, uri: &str) -> StatusCode {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        mux.dispatch(req).await.status()
    }

    #[test]
    fn test_prefix_composition() {
        let mux = Mux::default();
        let api = mux.prefix_group("/api", |_| {});
        let v1 = api.prefix_group("/v1/", |_| {});
        let deep = v1.prefix_group("admin", |_| {});

        assert_eq!(api.prefix(), "/api");
        assert_eq!(v1.prefix(), "/api/v1");
        assert_eq!(deep.prefix(), "/api/v1/admin");
        assert_eq!(v1.group(|_| {}).prefix(), "/api/v1");
    }

    #[tokio::test]
    async fn test_nested_route_reachable_at_joined_path() {
        let mux = Mux::default();
        mux.prefix_group("/api", |api| {
            api.prefix_group("/v1", |v1| {
                v1.get("/users", |_req: Request| async { "users" });
            });
        });

        assert_eq!(send(&mux, Method::GET, "/api/v1/users").await, StatusCode::OK);
        assert_eq!(send(&mux, Method::GET, "/api//v1/users").await, StatusCode::NOT_FOUND);
        assert_eq!(send(&mux, Method::GET, "/v1/users").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_chain_inherits_root_to_leaf() {
        let log: Log = Arc::default();
        let mux = Mux::new([tag(&log, "global")]);
        mux.prefix_group("/a", |a| {
            a.use_middleware([tag(&log, "a")]);
            a.prefix_group("/b", |b| {
                b.use_middleware([tag(&log, "b")]);
                b.get("/x", |_req: Request| async { "x" });
            });
        });

        assert_eq!(send(&mux, Method::GET, "/a/b/x").await, StatusCode::OK);
        assert_eq!(*log.lock().unwrap(), ["global", "a", "b"]);
    }

    #[tokio::test]
    async fn test_independent_group_skips_ancestors() {
        let log: Log = Arc::default();
        let mux = Mux::new([tag(&log, "global")]);
        mux.prefix_group("/outer", |outer| {
            outer.use_middleware([tag(&log, "outer")]);
            outer.prefix_group("/hooks", |hooks| {
                hooks.use_middleware([tag(&log, "discarded")]);
                hooks.independent();
                hooks.use_middleware([tag(&log, "own")]);
                hooks.post("/stripe", |_req: Request| async { StatusCode::ACCEPTED });

                hooks.prefix_group("/nested", |nested| {
                    nested.post("/x", |_req: Request| async { StatusCode::ACCEPTED });
                });
            });
        });

        assert_eq!(
            send(&mux, Method::POST, "/outer/hooks/stripe").await,
            StatusCode::ACCEPTED
        );
        assert_eq!(*log.lock().unwrap(), ["own"]);

        log.lock().unwrap().clear();
        send(&mux, Method::POST, "/outer/hooks/nested/x").await;
        assert_eq!(*log.lock().unwrap(), ["own"]);
    }

    #[tokio::test]
    async fn test_use_applies_to_earlier_routes() {
        let log: Log = Arc::default();
        let mux = Mux::default();
        let api = mux.prefix_group("/api", |api| {
            api.get("/early", |_req: Request| async { "early" });
        });

        send(&mux, Method::GET, "/api/early").await;
        assert!(log.lock().unwrap().is_empty());

        api.use_middleware([tag(&log, "late")]);
        mux.use_middleware([tag(&log, "global")]);
        send(&mux, Method::GET, "/api/early").await;
        assert_eq!(*log.lock().unwrap(), ["global", "late"]);
    }

    #[test]
    fn test_method_prefix_rules() {
        let mux = Mux::default();
        let group = mux.prefix_group("/g", |_| {});

        assert!(group
            .try_handle(None, "PUT /item", |_req: Request| async { "" })
            .is_ok());
        assert!(matches!(
            group.try_handle(Some(Method::GET), "POST /other", |_req: Request| async { "" }),
            Err(RouterError::MethodMismatch { .. })
        ));
        assert!(matches!(
            group.try_handle(None, "PUT /item", |_req: Request| async { "" }),
            Err(RouterError::DuplicateRoute { .. })
        ));
        assert_eq!(mux.allowed_methods("/g/item"), ["PUT"]);
    }

    #[test]
    #[should_panic(expected = "failed to register route")]
    fn test_convenience_methods_panic_on_bad_pattern() {
        let mux = Mux::default();
        mux.get("no-slash", |_req: Request| async { "" });
    }

    #[test]
    fn test_middleware_chain_introspection() {
        let log: Log = Arc::default();
        let mux = Mux::new([tag(&log, "g")]);
        let group = mux.prefix_group("/x", |x| {
            x.use_middleware([tag(&log, "x1"), tag(&log, "x2")]);
        });
        assert_eq!(group.middleware_chain().len(), 3);
        group.independent();
        assert!(group.is_independent());
        assert!(group.middleware_chain().is_empty());
    }
}
