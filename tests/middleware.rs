//! Middleware ordering and group independence over HTTP.

use axum::extract::Request;
use route_mux::http::{request_id, X_REQUEST_ID};
use route_mux::Mux;

mod common;

#[tokio::test]
async fn test_global_group_and_nested_chains_run_in_order() {
    let trace = common::new_trace();
    let mux = Mux::new([common::tracer(&trace, "global")]);
    mux.prefix_group("/api", |api| {
        api.use_middleware([common::tracer(&trace, "api")]);
        api.prefix_group("/admin", |admin| {
            admin.use_middleware([common::tracer(&trace, "admin")]);
            let trace = trace.clone();
            admin.get("/stats", move |_req: Request| {
                let trace = trace.clone();
                async move {
                    trace.lock().unwrap().push("handler".to_string());
                    "stats"
                }
            });
        });
    });
    let server = common::start_server(mux).await;

    let res = server.client.get(server.url("/api/admin/stats")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(
        *trace.lock().unwrap(),
        ["global", "api", "admin", "handler", "admin", "api", "global"]
    );
}

#[tokio::test]
async fn test_independent_group_skips_global_chain() {
    let mux = Mux::new([common::stamp("global")]);
    mux.prefix_group("/api", |api| {
        api.use_middleware([common::stamp("api")]);
        api.get("/ping", |_req: Request| async { "pong" });
    });
    mux.prefix_group("/hooks", |hooks| {
        hooks.independent().use_middleware([common::stamp("hooks")]);
        hooks.post("/github", |_req: Request| async { "ok" });
    });
    let server = common::start_server(mux).await;

    let res = server.client.get(server.url("/api/ping")).send().await.unwrap();
    assert_eq!(res.headers()["x-chain"], "global,api");

    let res = server.client.post(server.url("/hooks/github")).send().await.unwrap();
    assert_eq!(res.headers()["x-chain"], "hooks");
}

#[tokio::test]
async fn test_middleware_added_after_routes_applies() {
    let mux = Mux::default();
    mux.get("/late", |_req: Request| async { "late" });
    mux.use_middleware([common::stamp("added-later")]);
    let server = common::start_server(mux).await;

    let res = server.client.get(server.url("/late")).send().await.unwrap();
    assert_eq!(res.headers()["x-chain"], "added-later");
}

#[tokio::test]
async fn test_request_id_round_trip() {
    let mux = Mux::new([request_id()]);
    mux.get("/id", |_req: Request| async { "ok" });
    let server = common::start_server(mux).await;

    let res = server
        .client
        .get(server.url("/id"))
        .header(X_REQUEST_ID.as_str(), "trace-me")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()[X_REQUEST_ID.as_str()], "trace-me");

    let res = server.client.get(server.url("/id")).send().await.unwrap();
    assert!(res.headers().contains_key(X_REQUEST_ID.as_str()));
}
