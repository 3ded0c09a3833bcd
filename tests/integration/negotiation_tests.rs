//! Content negotiation integration tests.
//!
//! Tests verify:
//! - Accept header matching and `_format` overrides
//! - 415 for unacceptable types
//! - Handler return shapes and structured errors
//! - Custom renderers and charsets

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use simple_rest::negotiate::{Negotiator, Payload, Renderer, Reply};
use simple_rest::{AuthPolicy, Decimal, Record, Resource};

use super::test_utils::{
    body_json, body_string, content_type, form, get, items_resource, single_router, test_router,
};

// =============================================================================
// Format Resolution
// =============================================================================

#[tokio::test]
async fn test_accept_json() {
    let response = test_router(AuthPolicy::Public)
        .oneshot(get("/items", "application/json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        content_type(&response).as_deref(),
        Some("application/json; charset=utf-8")
    );
    assert_eq!(body_json(response).await, json!({"items": ["mug"]}));
}

#[tokio::test]
async fn test_accept_html() {
    let response = test_router(AuthPolicy::Public)
        .oneshot(get("/items", "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"))
        .await
        .unwrap();

    assert_eq!(
        content_type(&response).as_deref(),
        Some("text/html; charset=utf-8")
    );
    let html = body_string(response).await;
    assert!(html.starts_with("<html>"));
    assert!(html.contains("mug"));
}

#[tokio::test]
async fn test_accept_plain_text() {
    let response = test_router(AuthPolicy::Public)
        .oneshot(get("/items", "text/plain"))
        .await
        .unwrap();

    assert_eq!(
        body_string(response).await,
        "{\n    \"items\": [\n        \"mug\"\n    ]\n}"
    );
}

#[tokio::test]
async fn test_missing_accept_defaults_to_json() {
    let request = axum::http::Request::builder()
        .uri("/items")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = test_router(AuthPolicy::Public).oneshot(request).await.unwrap();

    assert_eq!(
        content_type(&response).as_deref(),
        Some("application/json; charset=utf-8")
    );
}

#[tokio::test]
async fn test_format_param_beats_accept() {
    let response = test_router(AuthPolicy::Public)
        .oneshot(get("/items?_format=json", "text/html"))
        .await
        .unwrap();

    assert_eq!(
        content_type(&response).as_deref(),
        Some("application/json; charset=utf-8")
    );
}

#[tokio::test]
async fn test_format_route_capture() {
    let response = test_router(AuthPolicy::Public)
        .oneshot(get("/items/txt", "application/json"))
        .await
        .unwrap();

    assert_eq!(
        content_type(&response).as_deref(),
        Some("text/plain; charset=utf-8")
    );
}

#[tokio::test]
async fn test_format_param_beats_route_capture() {
    let response = test_router(AuthPolicy::Public)
        .oneshot(get("/items/txt?_format=html", "application/json"))
        .await
        .unwrap();

    assert_eq!(
        content_type(&response).as_deref(),
        Some("text/html; charset=utf-8")
    );
}

#[tokio::test]
async fn test_unacceptable_type_is_415() {
    let response = test_router(AuthPolicy::Public)
        .oneshot(get("/items", "image/png, application/xml"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(body_string(response).await.is_empty());
}

#[tokio::test]
async fn test_format_without_renderer_is_415() {
    let response = test_router(AuthPolicy::Public)
        .oneshot(get("/items?_format=xml", "application/json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

// =============================================================================
// Return Shapes and Errors
// =============================================================================

#[tokio::test]
async fn test_pair_with_status() {
    let response = test_router(AuthPolicy::Public)
        .oneshot(form("POST", "/items", "name=lamp".to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await, json!({"created": "lamp"}));
}

#[tokio::test]
async fn test_pair_with_bad_status_is_payload() {
    let response = test_router(AuthPolicy::Public)
        .oneshot(form("PUT", "/items", String::new()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([{"a": 1}, "not-a-number"]));
}

#[tokio::test]
async fn test_structured_error_becomes_response() {
    let response = test_router(AuthPolicy::Public)
        .oneshot(form("DELETE", "/items", String::new()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await, json!({"error": "nope"}));
}

#[tokio::test]
async fn test_unrecognized_error_is_500() {
    let response = test_router(AuthPolicy::Public)
        .oneshot(get("/broken", "application/json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "handler_error");
    assert_eq!(body["message"], "database unavailable");
}

#[tokio::test]
async fn test_records_and_decimals() {
    let resource: Resource<Reply> = Resource::new("catalog").get(|_: &simple_rest::Request, _: &simple_rest::Args| {
        let records = vec![
            Record::new("shop.item", 1).field("name", "mug"),
            Record::new("shop.item", 2).field("name", "pen"),
        ];
        Ok(Payload::List(vec![
            Some(Payload::records(records)),
            Some(Payload::from_serialize(Decimal::new(1999, 2))),
        ])
        .into())
    });
    let router = single_router(Negotiator::new().apply(resource));

    let response = router.oneshot(get("/r", "application/json")).await.unwrap();
    assert_eq!(
        body_json(response).await,
        json!([
            [
                {"model": "shop.item", "pk": 1, "fields": {"name": "mug"}},
                {"model": "shop.item", "pk": 2, "fields": {"name": "pen"}}
            ],
            19.99
        ])
    );
}

// =============================================================================
// Negotiator Configuration
// =============================================================================

#[tokio::test]
async fn test_custom_renderer_and_charset() {
    let negotiator = Negotiator::new()
        .with_charset("iso-8859-1")
        .with_renderer(
            "text/csv",
            Renderer::func(|data: &Payload| {
                let value = data.to_json_value()?;
                Ok(value["items"]
                    .as_array()
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(|i| i.as_str())
                            .collect::<Vec<_>>()
                            .join(",")
                    })
                    .unwrap_or_default())
            }),
        );
    let router = single_router(negotiator.apply(items_resource()));

    let response = router.oneshot(get("/r?_format=csv", "text/html")).await.unwrap();
    assert_eq!(
        content_type(&response).as_deref(),
        Some("text/csv; charset=iso-8859-1")
    );
    assert_eq!(body_string(response).await, "mug");
}
