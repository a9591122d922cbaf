//! route-mux demo server.
//!
//! # Route Layout
//!
//! ```text
//!  global chain: request_id → trace → metrics
//!  │
//!  ├── GET  /                       home
//!  ├── GET  /healthz                liveness
//!  ├── GET  /_routes                route table (JSON)
//!  ├── GET  /static/{path...}       static directory (optional)
//!  │
//!  ├── /api/v1          + api-version header
//!  │   ├── GET    /users
//!  │   ├── POST   /users
//!  │   ├── GET    /users/{id}
//!  │   ├── DELETE /users/{id}
//!  │   └── /admin       + bearer token check
//!  │       └── GET /stats
//!  │
//!  └── /webhooks        independent: no global chain
//!      └── POST /{provider}
//! ```

use axum::extract::Request;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use route_mux::config::{load_config, ServerConfig};
use route_mux::http::{request_id, HttpServer, RequestIdExt};
use route_mux::lifecycle::{signals, Shutdown};
use route_mux::observability::{logging, metrics, tracing as request_tracing};
use route_mux::{Middleware, Mux, Next, PathParamsExt};

#[derive(Parser, Debug)]
#[command(name = "route-mux", version, about = "Demo server for the route-mux engine")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

fn api_version() -> Middleware {
    Middleware::from_fn(|req: Request, next: Next| async move {
        let mut res = next.run(req).await;
        res.headers_mut()
            .insert("api-version", HeaderValue::from_static("v1"));
        res
    })
}

fn require_bearer() -> Middleware {
    Middleware::from_fn(|req: Request, next: Next| async move {
        let authorized = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("Bearer "));
        if !authorized {
            tracing::warn!(path = %req.uri().path(), "Rejected unauthenticated admin request");
            return StatusCode::UNAUTHORIZED.into_response();
        }
        next.run(req).await
    })
}

fn build_mux(config: &ServerConfig) -> Result<Mux, Box<dyn std::error::Error>> {
    let mux = Mux::new([
        request_id(),
        request_tracing::trace_requests(),
        metrics::track_requests(),
    ]);

    mux.home(|_req: Request| async { "route-mux\n" });
    mux.get("/healthz", |_req: Request| async { "ok\n" });

    if config.introspection.enabled {
        mux.get(&config.introspection.path, mux.routes_handler());
    }

    if config.static_files.enabled {
        mux.serve_directory(&config.static_files.pattern(), &config.static_files.root)?;
    }

    mux.prefix_group("/api/v1", |api| {
        api.use_middleware([api_version()]);

        api.get("/users", |_req: Request| async {
            axum::Json(serde_json::json!([{ "id": "1", "name": "ada" }]))
        });
        api.post("/users", |req: Request| async move {
            let id = req.request_id().unwrap_or_default().to_string();
            (StatusCode::CREATED, axum::Json(serde_json::json!({ "request_id": id })))
        });
        api.get("/users/{id}", |req: Request| async move {
            let id = req.path_param("id").unwrap_or_default().to_string();
            axum::Json(serde_json::json!({ "id": id }))
        });
        api.delete("/users/{id}", |_req: Request| async { StatusCode::NO_CONTENT });

        api.prefix_group("/admin", |admin| {
            admin.use_middleware([require_bearer()]);
            admin.get("/stats", |_req: Request| async {
                axum::Json(serde_json::json!({ "users": 1 }))
            });
        });
    });

    mux.prefix_group("/webhooks", |hooks| {
        hooks.independent();
        hooks.post("/{provider}", |req: Request| async move {
            let provider = req.path_param("provider").unwrap_or_default().to_string();
            tracing::info!(provider = %provider, "Webhook received");
            StatusCode::ACCEPTED
        });
    });

    mux.not_found(|req: Request| async move {
        (
            StatusCode::NOT_FOUND,
            axum::Json(serde_json::json!({ "error": "not found", "path": req.uri().path() })),
        )
    });

    Ok(mux)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!("route-mux v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let mux = build_mux(&config)?;
    tracing::debug!(routes = %mux.dump_routes()?, "Route table");

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(signals::forward_signals(shutdown.clone()));

    HttpServer::new(mux, config)
        .run(listener, shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
