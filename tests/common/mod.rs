//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::Request;
use route_mux::config::ServerConfig;
use route_mux::http::HttpServer;
use route_mux::lifecycle::Shutdown;
use route_mux::{Middleware, Mux, Next};
use tokio::net::TcpListener;

/// A server running on an ephemeral port. Dropping it stops the server.
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Serve `mux` on 127.0.0.1 with default configuration.
pub async fn start_server(mux: Mux) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let server = HttpServer::new(mux, ServerConfig::default());
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    TestServer {
        addr,
        client: reqwest::Client::new(),
        shutdown,
    }
}

/// Shared log of middleware and handler visits.
#[allow(dead_code)]
pub type Trace = Arc<Mutex<Vec<String>>>;

#[allow(dead_code)]
pub fn new_trace() -> Trace {
    Arc::new(Mutex::new(Vec::new()))
}

/// Middleware recording `name` on the way in and `name` again on the way out.
#[allow(dead_code)]
pub fn tracer(trace: &Trace, name: &'static str) -> Middleware {
    let trace = Arc::clone(trace);
    Middleware::from_fn(move |req: Request, next: Next| {
        let trace = Arc::clone(&trace);
        async move {
            trace.lock().unwrap().push(name.to_string());
            let res = next.run(req).await;
            trace.lock().unwrap().push(name.to_string());
            res
        }
    })
}

/// Middleware appending `name` to the `x-chain` response header.
#[allow(dead_code)]
pub fn stamp(name: &'static str) -> Middleware {
    Middleware::from_fn(move |req: Request, next: Next| async move {
        let mut res = next.run(req).await;
        let value = match res.headers().get("x-chain").and_then(|v| v.to_str().ok()) {
            Some(existing) => format!("{name},{existing}"),
            None => name.to_string(),
        };
        res.headers_mut()
            .insert("x-chain", value.parse().unwrap());
        res
    })
}
