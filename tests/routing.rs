//! End-to-end routing tests over HTTP.

use axum::extract::Request;
use axum::http::StatusCode;
use reqwest::header::ALLOW;
use reqwest::Method;
use route_mux::{Mux, PathParamsExt};

mod common;

#[tokio::test]
async fn test_get_and_post_with_automatic_head_and_options() {
    let mux = Mux::default();
    mux.get("/widgets", |_req: Request| async { "list" });
    mux.post("/widgets", |_req: Request| async { (StatusCode::CREATED, "created") });
    let server = common::start_server(mux).await;

    let res = server.client.get(server.url("/widgets")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "list");

    let res = server.client.post(server.url("/widgets")).send().await.unwrap();
    assert_eq!(res.status(), 201);

    let res = server.client.head(server.url("/widgets")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    let res = server
        .client
        .request(Method::OPTIONS, server.url("/widgets"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 204);
    assert_eq!(res.headers()[ALLOW], "GET, HEAD, POST");
}

#[tokio::test]
async fn test_unknown_path_is_plain_404() {
    let server = common::start_server(Mux::default()).await;

    let res = server.client.get(server.url("/missing")).send().await.unwrap();
    assert_eq!(res.status(), 404);
    assert_eq!(res.text().await.unwrap(), "404 page not found\n");

    let res = server
        .client
        .request(Method::OPTIONS, server.url("/missing"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn test_nested_prefix_groups_compose() {
    let mux = Mux::default();
    mux.prefix_group("/api", |api| {
        api.prefix_group("/v1", |v1| {
            v1.get("/users/{id}", |req: Request| async move {
                format!("user {}", req.path_param("id").unwrap_or_default())
            });
        });
    });
    let server = common::start_server(mux).await;

    let res = server.client.get(server.url("/api/v1/users/42")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "user 42");

    let res = server
        .client
        .request(Method::OPTIONS, server.url("/api/v1/users/42"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 204);
    assert_eq!(res.headers()[ALLOW], "GET, HEAD");

    let res = server.client.get(server.url("/v1/users/42")).send().await.unwrap();
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn test_route_dump_endpoint() {
    let mux = Mux::default();
    mux.get("/a", |_req: Request| async { "a" });
    mux.get("/_routes", mux.routes_handler());
    let server = common::start_server(mux).await;

    let routes: serde_json::Value = server
        .client
        .get(server.url("/_routes"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        routes,
        serde_json::json!([
            { "pattern": "/_routes", "methods": ["GET", "HEAD"] },
            { "pattern": "/a", "methods": ["GET", "HEAD"] }
        ])
    );
}
