//! Request pipeline scenarios driven through the layered router.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use serde_json::{json, Map, Value};
use tower::ServiceExt;

use trestle::config::ServerConfig;
use trestle::{HookContext, HookOutcome, HttpServer, Reply, RequireAuthorization, Route, RouteRequest};

mod common;

fn server() -> HttpServer {
    HttpServer::new(ServerConfig::default())
}

#[tokio::test]
async fn test_registered_route_returns_envelope() {
    let mut server = server();
    server.add_route(
        Route::get("/testing/hello", |_req: RouteRequest| async { Reply::json(json!({"boom": "baby!"})) })
            .unwrap(),
    );

    let response = server.into_router().oneshot(common::get("/testing/hello")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        common::json_body(response).await,
        json!({"status": "success", "data": {"boom": "baby!"}})
    );
}

#[tokio::test]
async fn test_unregistered_path_is_404() {
    let response = server().into_router().oneshot(common::get("/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        common::json_body(response).await,
        json!({"status": "fail", "data": null, "message": "Route not found"})
    );
}

#[tokio::test]
async fn test_wrong_method_is_404() {
    let mut server = server();
    server.add_route(Route::post("/items", |_req: RouteRequest| async { Reply::ok() }).unwrap());

    let response = server.into_router().oneshot(common::get("/items")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_failing_hook_is_500_and_handler_never_runs() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let mut server = server();
    server
        .before_each_route(|_ctx: HookContext| async { HookOutcome::reject_with("X", "nope") })
        .add_route(
            Route::get("/guarded", move |_req: RouteRequest| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Reply::ok()
                }
            })
            .unwrap(),
        );

    let response = server.into_router().oneshot(common::get("/guarded")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        common::json_body(response).await,
        json!({"status": "error", "data": null, "message": "[X] nope", "code": "X"})
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_options_is_empty_success() {
    let mut server = server();
    server.before_each_route(|_ctx: HookContext| async { HookOutcome::reject() });

    let response = server
        .into_router()
        .oneshot(common::request(Method::OPTIONS, "/any/path", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::json_body(response).await, json!({"status": "success", "data": null}));
}

#[tokio::test]
async fn test_favicon_is_empty_success() {
    let response = server().into_router().oneshot(common::get("/favicon.ico")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::json_body(response).await, json!({"status": "success", "data": null}));
}

#[tokio::test]
async fn test_hook_data_merged_into_body() {
    let mut server = server();
    server
        .before_each_route(|_ctx: HookContext| async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let mut data = Map::new();
            data.insert("user".into(), json!("alice"));
            data.insert("source".into(), json!("first"));
            HookOutcome::pass_with(data)
        })
        .before_each_route(|_ctx: HookContext| async {
            let mut data = Map::new();
            data.insert("source".into(), json!("second"));
            HookOutcome::pass_with(data)
        })
        .add_route(Route::post("/echo", |req: RouteRequest| async move { Reply::json(req.body) }).unwrap());

    let request = common::request(Method::POST, "/echo", Some(("application/json", r#"{"n":1,"user":"mallory"}"#)));
    let response = server.into_router().oneshot(request).await.unwrap();
    assert_eq!(
        common::json_body(response).await["data"],
        json!({"n": 1, "user": "alice", "source": "second"})
    );
}

#[tokio::test]
async fn test_form_body_query_and_params_reach_handler() {
    let mut server = server();
    server.add_route(
        Route::post("/orgs/:org/members", |req: RouteRequest| async move {
            Reply::json(json!({
                "org": req.param("org"),
                "role": req.query_param("role"),
                "body": req.body,
            }))
        })
        .unwrap(),
    );

    let request = common::request(
        Method::POST,
        "/orgs/acme/members?role=admin",
        Some(("application/x-www-form-urlencoded", "name=Jane+Doe&team=r%26d")),
    );
    let response = server.into_router().oneshot(request).await.unwrap();
    assert_eq!(
        common::json_body(response).await["data"],
        json!({"org": "acme", "role": "admin", "body": {"name": "Jane Doe", "team": "r&d"}})
    );
}

#[tokio::test]
async fn test_unsupported_content_type_gives_null_body() {
    let mut server = server();
    server.add_route(
        Route::post("/raw", |req: RouteRequest| async move {
            Reply::json(json!({ "null": req.body.is_null() }))
        })
        .unwrap(),
    );

    let request = common::request(Method::POST, "/raw", Some(("text/plain", "hello")));
    let response = server.into_router().oneshot(request).await.unwrap();
    assert_eq!(common::json_body(response).await["data"], json!({"null": true}));
}

#[tokio::test]
async fn test_exact_route_beats_parameterized() {
    let mut server = server();
    server
        .add_route(Route::get("/users/:id", |_req: RouteRequest| async { Reply::text("param") }).unwrap())
        .add_route(Route::get("/users/me", |_req: RouteRequest| async { Reply::text("exact") }).unwrap());

    let app = server.into_router();
    let response = app.clone().oneshot(common::get("/users/me")).await.unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"exact");

    let response = app.oneshot(common::get("/users/42")).await.unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"param");
}

#[tokio::test]
async fn test_invalid_host_is_403() {
    let mut config = ServerConfig::default();
    config.access.valid_hosts = vec!["api.example.com".into()];
    let mut server = HttpServer::new(config);
    server.add_route(Route::get("/x", |_req: RouteRequest| async { Reply::ok() }).unwrap());
    let app = server.into_router();

    let mut request = common::get("/x");
    request.headers_mut().insert("host", "evil.example.com".parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        common::json_body(response).await,
        json!({"status": "fail", "data": null, "message": "Invalid Host"})
    );

    let mut request = common::get("/x");
    request.headers_mut().insert("host", "api.example.com".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_blocked_forwarded_ip_is_403() {
    let mut config = ServerConfig::default();
    config.access.blocked_ips = vec!["203.0.113.9".into()];
    let server = HttpServer::new(config);

    let mut request = common::get("/anything");
    request
        .headers_mut()
        .insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
    let response = server.into_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(common::json_body(response).await["message"], Value::from("Blocked IP"));
}

#[tokio::test]
async fn test_require_authorization_guard() {
    let mut server = server();
    server
        .before_each_route(RequireAuthorization::new())
        .add_route(
            Route::builder("/public")
                .public(true)
                .build(|_req: RouteRequest| async { Reply::ok() })
                .unwrap(),
        )
        .add_route(Route::get("/private", |_req: RouteRequest| async { Reply::ok() }).unwrap());
    let app = server.into_router();

    let response = app.clone().oneshot(common::get("/public")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(common::get("/private")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(common::json_body(response).await["code"], "UNAUTHORIZED");

    let mut request = common::get("/private");
    request.headers_mut().insert("jax-client-token", "t".parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Unmatched paths still reach the 404.
    let response = app.oneshot(common::get("/missing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_handler_error_helper() {
    let mut server = server();
    server.add_route(
        Route::get("/teapot", |_req: RouteRequest| async {
            let mut extra = Map::new();
            extra.insert("code".into(), json!("TEAPOT"));
            extra.insert("retry".into(), json!(false));
            Reply::error_with(StatusCode::IM_A_TEAPOT, "short and stout", extra)
        })
        .unwrap(),
    );

    let response = server.into_router().oneshot(common::get("/teapot")).await.unwrap();
    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(
        common::json_body(response).await,
        json!({
            "status": "fail",
            "data": null,
            "message": "[TEAPOT] short and stout",
            "code": "TEAPOT",
            "retry": false
        })
    );
}
