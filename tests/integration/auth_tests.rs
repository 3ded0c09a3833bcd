//! Authentication integration tests.
//!
//! Tests verify:
//! - Valid signatures work, in the query and in form bodies
//! - Stale, tampered and incomplete signatures are rejected with 401
//! - Session and superuser policies
//! - Cascading auth (signature, else session)
//! - Guards placed outside the negotiator

use axum::http::StatusCode;
use tower::ServiceExt;

use simple_rest::auth::{unix_now, KeyResolver};
use simple_rest::negotiate::Negotiator;
use simple_rest::{
    request_passes_test, static_key, Args, AuthPolicy, Request, SessionUser,
};
use std::sync::Arc;

use super::test_utils::{
    body_json, body_string, content_type, form, get, items_resource, signed_query,
    signed_query_now, single_router, test_router, with_user, TEST_SECRET,
};

fn signature_policy() -> AuthPolicy {
    AuthPolicy::Signature(static_key(TEST_SECRET))
}

// =============================================================================
// Valid Signatures
// =============================================================================

#[tokio::test]
async fn test_valid_signature_succeeds() {
    let router = test_router(signature_policy());
    let query = signed_query_now(&[("name", "lamp")]);

    let response = router
        .oneshot(get(&format!("/items?{}", query), "application/json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["items"][0], "lamp");
}

#[tokio::test]
async fn test_signature_covers_form_body() {
    let router = test_router(signature_policy());
    let body = signed_query_now(&[("name", "lamp")]);

    let response = router.oneshot(form("POST", "/items", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["created"], "lamp");
}

#[tokio::test]
async fn test_signature_within_window() {
    let router = test_router(signature_policy());
    let query = signed_query(&[("name", "lamp")], unix_now() - 200);

    let response = router
        .oneshot(get(&format!("/items?{}", query), "application/json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_client_clock_ahead_is_tolerated() {
    let router = test_router(signature_policy());
    let query = signed_query(&[("name", "lamp")], unix_now() + 200);

    let response = router
        .oneshot(get(&format!("/items?{}", query), "application/json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Rejected Signatures
// =============================================================================

#[tokio::test]
async fn test_stale_signature_rejected() {
    let router = test_router(signature_policy());
    let query = signed_query(&[("name", "lamp")], unix_now() - 400);

    let response = router
        .oneshot(get(&format!("/items?{}", query), "application/json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_string(response).await.is_empty());
}

#[tokio::test]
async fn test_tampered_parameter_rejected() {
    let router = test_router(signature_policy());
    let query = signed_query_now(&[("name", "lamp")]).replace("lamp", "vase");

    let response = router
        .oneshot(get(&format!("/items?{}", query), "application/json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_signature_rejected() {
    let router = test_router(signature_policy());
    let uri = format!("/items?name=lamp&t={}", unix_now());

    let response = router.oneshot(get(&uri, "application/json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_timestamp_rejected() {
    let router = test_router(signature_policy());
    let uri = format!("/items?name=lamp&sig={}", "ab".repeat(32));

    let response = router.oneshot(get(&uri, "application/json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_numeric_timestamp_rejected() {
    let router = test_router(signature_policy());
    let uri = format!("/items?name=lamp&t=yesterday&sig={}", "ab".repeat(32));

    let response = router.oneshot(get(&uri, "application/json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_key_rejected() {
    let router = test_router(AuthPolicy::Signature(static_key("another-key")));
    let query = signed_query_now(&[("name", "lamp")]);

    let response = router
        .oneshot(get(&format!("/items?{}", query), "application/json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unresolvable_key_fails_closed() {
    let resolver: KeyResolver = Arc::new(|_: &Request, _: &Args| None);
    let router = test_router(AuthPolicy::Signature(resolver));
    let query = signed_query_now(&[("name", "lamp")]);

    let response = router
        .oneshot(get(&format!("/items?{}", query), "application/json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_resolver_sees_route_captures() {
    let resolver: KeyResolver = Arc::new(|_: &Request, args: &Args| {
        (args.get("_format") == Some("json")).then(|| TEST_SECRET.as_bytes().to_vec())
    });
    let query = signed_query_now(&[]);

    let router = test_router(AuthPolicy::Signature(resolver.clone()));
    let response = router
        .oneshot(get(&format!("/items/json?{}", query), "text/html"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let router = test_router(AuthPolicy::Signature(resolver));
    let response = router
        .oneshot(get(&format!("/items/txt?{}", query), "text/html"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Session Policies
// =============================================================================

#[tokio::test]
async fn test_login_required() {
    let response = test_router(AuthPolicy::Login)
        .oneshot(get("/items", "application/json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = with_user(get("/items", "application/json"), SessionUser::new("alice"));
    let response = test_router(AuthPolicy::Login).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_required() {
    let request = with_user(get("/items", "application/json"), SessionUser::new("alice"));
    let response = test_router(AuthPolicy::Admin).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = with_user(get("/items", "application/json"), SessionUser::superuser("root"));
    let response = test_router(AuthPolicy::Admin).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Cascading Auth
// =============================================================================

fn cascading() -> AuthPolicy {
    AuthPolicy::Cascading(static_key(TEST_SECRET))
}

#[tokio::test]
async fn test_cascading_allows_session_without_signature() {
    let request = with_user(get("/items", "application/json"), SessionUser::new("alice"));
    let response = test_router(cascading()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cascading_allows_signature_without_session() {
    let query = signed_query_now(&[("name", "lamp")]);
    let response = test_router(cascading())
        .oneshot(get(&format!("/items?{}", query), "application/json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cascading_rejects_neither() {
    let response = test_router(cascading())
        .oneshot(get("/items?name=lamp", "application/json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Guard Outside the Negotiator
// =============================================================================

#[tokio::test]
async fn test_outer_guard_returns_plain_text() {
    let guard = request_passes_test(
        |request: &Request, _: &Args| request.param("member") == Some("yes"),
        Some("members only".to_string()),
        StatusCode::FORBIDDEN,
    );
    let resource = guard.apply(Negotiator::new().apply(items_resource()));

    let response = single_router(resource.clone())
        .oneshot(get("/r", "application/json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        content_type(&response).as_deref(),
        Some("text/plain; charset=utf-8")
    );
    assert_eq!(body_string(response).await, "members only");

    let response = single_router(resource)
        .oneshot(get("/r?member=yes", "application/json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
