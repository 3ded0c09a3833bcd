//! Test utilities for integration tests.
//!
//! Builds a small item API and helpers for signing requests and reading
//! response bodies.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};

use simple_rest::auth::{unix_now, SignatureAuth};
use simple_rest::negotiate::{Negotiator, Reply};
use simple_rest::{
    create_router, Args, AuthPolicy, CurrentUser, HandlerError, HttpError, Params, Resource,
    RestResource, RouterConfig,
};

pub const TEST_SECRET: &str = "test-secret-key-for-hmac-signing";

// =============================================================================
// Test API
// =============================================================================

/// An item resource with one handler per interesting return shape.
pub fn items_resource() -> Resource<Reply> {
    Resource::new("items")
        .get(|request: &simple_rest::Request, _: &Args| {
            let name = request.param("name").unwrap_or("mug");
            Ok(json!({"items": [name]}).into())
        })
        .post(|request: &simple_rest::Request, _: &Args| {
            let name = request.param("name").unwrap_or("").to_string();
            Ok((json!({"created": name}), 201).into())
        })
        .put(|_: &simple_rest::Request, _: &Args| Ok((json!({"a": 1}), "not-a-number").into()))
        .delete(|_: &simple_rest::Request, _: &Args| {
            Err(HttpError::with_message("nope", StatusCode::FORBIDDEN).into())
        })
}

/// A resource whose handler fails with an unrecognized error.
pub fn broken_resource() -> Resource<Reply> {
    Resource::new("broken").get(|_: &simple_rest::Request, _: &Args| {
        Err(HandlerError::other("database unavailable"))
    })
}

/// Negotiated `items` under `policy`, with the guard inside the negotiator.
pub fn guarded_items(policy: &AuthPolicy) -> RestResource {
    Negotiator::new().apply(policy.apply(items_resource()))
}

/// Router serving `/items`, `/items/{_format}` and `/broken`.
pub fn test_router(policy: AuthPolicy) -> Router {
    let items = guarded_items(&policy);
    let broken = Negotiator::new().apply(broken_resource());

    create_router(
        vec![
            ("/items".to_string(), items.clone()),
            ("/items/{_format}".to_string(), items),
            ("/broken".to_string(), broken),
        ],
        RouterConfig::new().with_tracing(false),
    )
}

/// Router serving a single resource at `/r`.
pub fn single_router(resource: RestResource) -> Router {
    create_router(
        vec![("/r".to_string(), resource)],
        RouterConfig::new().with_tracing(false),
    )
}

// =============================================================================
// Request Helpers
// =============================================================================

/// URL-encoded `params` with `t` and `sig` appended, signed at `timestamp`.
pub fn signed_query(params: &[(&str, &str)], timestamp: i64) -> String {
    let data: Params = params.iter().copied().collect();
    SignatureAuth::new(TEST_SECRET)
        .signed_params(&data, timestamp)
        .to_urlencoded()
}

/// [`signed_query`] at the current time.
pub fn signed_query_now(params: &[(&str, &str)]) -> String {
    signed_query(params, unix_now())
}

pub fn get(uri: &str, accept: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::ACCEPT, accept)
        .body(Body::empty())
        .unwrap()
}

pub fn form(method: &str, uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::ACCEPT, "application/json")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

/// Attach a session user the way an upstream session layer would.
pub fn with_user(mut request: Request<Body>, user: impl CurrentUser + 'static) -> Request<Body> {
    let user: Arc<dyn CurrentUser> = Arc::new(user);
    request.extensions_mut().insert(user);
    request
}

// =============================================================================
// Response Helpers
// =============================================================================

pub fn content_type(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string())
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_string(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
