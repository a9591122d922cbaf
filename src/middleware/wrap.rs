//! Middleware values.
//!
//! A middleware is a decorator: it takes the next handler and returns a new
//! handler that runs its own logic around it. Three constructors are offered:
//!
//! ```text
//! Middleware::new(|next: Handler| -> Handler)           raw decorator
//! Middleware::from_fn(|req, next: Next| async { .. })   axum-style function
//! Middleware::layer(SomeTowerLayer)                     any infallible tower layer
//! ```

use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tower::{Layer, Service};

use crate::http::handler::{BoxError, Handler};

type WrapFn = dyn Fn(Handler) -> Handler + Send + Sync;

/// A handler decorator.
#[derive(Clone)]
pub struct Middleware {
    wrap: Arc<WrapFn>,
}

impl Middleware {
    /// Create a middleware from a function transforming one handler into another.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Handler) -> Handler + Send + Sync + 'static,
    {
        Self { wrap: Arc::new(f) }
    }

    /// Create a middleware from an async function receiving the request and
    /// the rest of the chain.
    pub fn from_fn<F, Fut, R>(f: F) -> Self
    where
        F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        let f = Arc::new(f);
        Self::new(move |inner: Handler| {
            let f = Arc::clone(&f);
            Handler::new(move |req: Request| {
                let next = Next {
                    inner: inner.clone(),
                };
                f(req, next)
            })
        })
    }

    /// Adapt a tower layer whose service never fails.
    ///
    /// Works with tower-http layers such as `TraceLayer`, `TimeoutLayer` or
    /// `SetResponseHeaderLayer`.
    pub fn layer<L, ResBody>(layer: L) -> Self
    where
        L: Layer<Handler> + Send + Sync + 'static,
        L::Service: Service<Request, Response = axum::http::Response<ResBody>, Error = Infallible>
            + Clone
            + Send
            + Sync
            + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
        ResBody: http_body::Body<Data = Bytes> + Send + 'static,
        ResBody::Error: Into<BoxError>,
    {
        Self::new(move |inner: Handler| Handler::from_service(layer.layer(inner)))
    }

    /// Wrap `handler`.
    pub fn wrap(&self, handler: Handler) -> Handler {
        (self.wrap)(handler)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Middleware").finish_non_exhaustive()
    }
}

/// The remainder of a middleware chain, handed to [`Middleware::from_fn`]
/// functions.
#[derive(Clone, Debug)]
pub struct Next {
    inner: Handler,
}

impl Next {
    /// Run the rest of the chain.
    pub async fn run(self, req: Request) -> Response {
        self.inner.call(req).await
    }
}
