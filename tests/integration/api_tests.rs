//! API integration tests.
//!
//! Tests verify:
//! - Health endpoint
//! - `_method` overrides
//! - 405 with an `Allow` header
//! - Body limits
//! - CORS headers

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use simple_rest::negotiate::{Negotiator, Reply};
use simple_rest::{create_router, Args, AuthPolicy, Resource, RouterConfig};

use super::test_utils::{body_json, form, get, single_router, test_router};

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let response = test_router(AuthPolicy::Public)
        .oneshot(get("/health", "*/*"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    let response = test_router(AuthPolicy::Public)
        .oneshot(get("/nothing-here", "*/*"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Method Handling
// =============================================================================

#[tokio::test]
async fn test_method_override_in_query() {
    let response = test_router(AuthPolicy::Public)
        .oneshot(form("POST", "/items?_method=DELETE", String::new()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await, json!({"error": "nope"}));
}

#[tokio::test]
async fn test_method_override_in_body() {
    let response = test_router(AuthPolicy::Public)
        .oneshot(form("POST", "/items", "_method=put".to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([{"a": 1}, "not-a-number"]));
}

#[tokio::test]
async fn test_query_override_beats_body_override() {
    let response = test_router(AuthPolicy::Public)
        .oneshot(form("POST", "/items?_method=PUT", "_method=DELETE".to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_override_keeps_transport_verb() {
    let response = test_router(AuthPolicy::Public)
        .oneshot(form("POST", "/items", "_method=BREW&name=tea".to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await, json!({"created": "tea"}));
}

#[tokio::test]
async fn test_missing_verb_is_405_with_allow() {
    let resource: Resource<Reply> = Resource::new("readonly")
        .get(|_: &simple_rest::Request, _: &Args| Ok(json!("ok").into()));
    let router = single_router(Negotiator::new().apply(resource));

    let response = router
        .oneshot(form("PATCH", "/r", String::new()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers().get(header::ALLOW).unwrap(), "GET");
    assert_eq!(body_json(response).await["error"], "method_not_allowed");
}

// =============================================================================
// Limits and CORS
// =============================================================================

#[tokio::test]
async fn test_body_limit() {
    let resource: Resource<Reply> = Resource::new("upload")
        .post(|_: &simple_rest::Request, _: &Args| Ok(Reply::empty()));
    let router = create_router(
        vec![("/upload".to_string(), Negotiator::new().apply(resource))],
        RouterConfig::new().with_tracing(false).with_body_limit(8),
    );

    let body = "data=0123456789abcdef".to_string();
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_cors_allows_any_origin_by_default() {
    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://example.com")
        .body(Body::empty())
        .unwrap();

    let response = test_router(AuthPolicy::Public).oneshot(request).await.unwrap();
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}
