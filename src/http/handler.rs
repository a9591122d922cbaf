//! The handler contract.
//!
//! # Responsibilities
//! - Define the type-erased request handler every route is bound to
//! - Convert async closures and infallible tower services into handlers
//! - Provide the default 404 handler
//!
//! # Design Decisions
//! - A handler is a cheap, cloneable `Arc` around an async function; it owns
//!   no per-request state
//! - Handlers always produce a response; failures are expressed as responses
//! - `Handler` implements `tower::Service` so tower-http layers can wrap it

use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Service, ServiceExt};

/// Boxed future resolving to a response.
pub type BoxResponseFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Boxed error accepted from response bodies of wrapped services.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

type HandlerFn = dyn Fn(Request) -> BoxResponseFuture + Send + Sync;

/// A type-erased request handler.
#[derive(Clone)]
pub struct Handler {
    inner: Arc<HandlerFn>,
}

impl Handler {
    /// Create a handler from an async function.
    pub fn new<F, Fut, R>(f: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        Self {
            inner: Arc::new(move |req: Request| -> BoxResponseFuture {
                let fut = f(req);
                Box::pin(async move { fut.await.into_response() })
            }),
        }
    }

    /// Create a handler from an infallible tower service.
    ///
    /// The service is cloned per request, so it must be cheap to clone.
    pub fn from_service<S, ResBody>(service: S) -> Self
    where
        S: Service<Request, Response = axum::http::Response<ResBody>, Error = Infallible>
            + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
        ResBody: http_body::Body<Data = Bytes> + Send + 'static,
        ResBody::Error: Into<BoxError>,
    {
        Self::new(move |req: Request| {
            let service = service.clone();
            async move {
                match service.oneshot(req).await {
                    Ok(res) => res.map(Body::new),
                    Err(never) => match never {},
                }
            }
        })
    }

    /// The default handler for unmatched requests.
    pub fn not_found() -> Self {
        Self::new(|_req: Request| async { not_found_response() })
    }

    /// Invoke the handler.
    pub fn call(&self, req: Request) -> BoxResponseFuture {
        (self.inner)(req)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").finish_non_exhaustive()
    }
}

impl Service<Request> for Handler {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send + 'static>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let fut = (self.inner)(req);
        Box::pin(async move { Ok(fut.await) })
    }
}

/// Conversion into a [`Handler`].
///
/// Implemented for `Handler` itself and for every
/// `Fn(Request) -> impl Future<Output = impl IntoResponse>`.
pub trait IntoHandler {
    fn into_handler(self) -> Handler;
}

impl IntoHandler for Handler {
    fn into_handler(self) -> Handler {
        self
    }
}

impl<F, Fut, R> IntoHandler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    fn into_handler(self) -> Handler {
        Handler::new(self)
    }
}

/// The plain 404 response used when no custom handler is configured.
pub(crate) fn not_found_response() -> Response {
    (StatusCode::NOT_FOUND, "404 page not found\n").into_response()
}
