//! Axum handlers and response conversion.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check endpoint
//! - any verb on a mounted resource path - dispatched to the resource

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, warn};

use super::extract::into_rest_request;
use crate::error::{ExtractError, NegotiationError};
use crate::negotiate::NegotiatedResponse;
use crate::resource::Resource;

/// A resource whose handlers produce negotiated responses.
pub type RestResource = Resource<NegotiatedResponse, NegotiationError>;

// =============================================================================
// Application State
// =============================================================================

/// State for one mounted resource.
#[derive(Clone)]
pub struct ResourceState {
    /// The resource serving this path
    pub resource: Arc<RestResource>,

    /// Maximum request body size in bytes
    pub body_limit: usize,
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for failures outside the negotiator.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "method_not_allowed", "handler_error")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Response Conversion
// =============================================================================

impl IntoResponse for NegotiatedResponse {
    fn into_response(self) -> Response {
        let (status, content_type, body) = self.into_parts();

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = status;

        if let Some(content_type) = content_type {
            match HeaderValue::from_str(&content_type) {
                Ok(value) => {
                    response.headers_mut().insert(header::CONTENT_TYPE, value);
                }
                Err(_) => warn!(content_type = %content_type, "Dropping invalid Content-Type"),
            }
        }

        response
    }
}

/// Convert NegotiationError to HTTP response.
///
/// Structured errors that escaped the negotiator (raised by a guard wrapped
/// around it) keep their status and become plain text. Everything else is a
/// 500 with a JSON body, logged at ERROR level.
impl IntoResponse for NegotiationError {
    fn into_response(self) -> Response {
        let (error_type, message) = match self {
            NegotiationError::Http(err) => {
                let status = err.status;
                if status.is_server_error() {
                    error!(status = status.as_u16(), "Server error: {}", err);
                } else {
                    debug!(status = status.as_u16(), "Request rejected: {}", err);
                }
                let body = err.message.unwrap_or_default();
                return (
                    status,
                    [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                    body,
                )
                    .into_response();
            }
            NegotiationError::Handler(err) => ("handler_error", err.to_string()),
            NegotiationError::Render(err) => ("render_error", err.to_string()),
        };

        let status = StatusCode::INTERNAL_SERVER_ERROR;
        error!(
            error_type = error_type,
            status = status.as_u16(),
            "Server error: {}",
            message
        );

        (
            status,
            Json(ErrorResponse::with_status(error_type, message, status)),
        )
            .into_response()
    }
}

impl IntoResponse for ExtractError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ExtractError::UnsupportedMethod(_) => (StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed"),
            ExtractError::BodyTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "body_too_large"),
            ExtractError::Body(_) => (StatusCode::BAD_REQUEST, "invalid_body"),
        };
        let message = self.to_string();

        warn!(
            error_type = error_type,
            status = status.as_u16(),
            "Client error: {}",
            message
        );

        (
            status,
            Json(ErrorResponse::with_status(error_type, message, status)),
        )
            .into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Dispatch a request to the mounted resource.
///
/// Verbs the resource has no handler for get a 405 with an `Allow` header.
pub async fn resource_handler(
    State(state): State<ResourceState>,
    request: axum::extract::Request,
) -> Response {
    let (request, args) = match into_rest_request(request, state.body_limit).await {
        Ok(extracted) => extracted,
        Err(e) => return e.into_response(),
    };

    match state.resource.dispatch(&request, &args) {
        Some(Ok(response)) => response.into_response(),
        Some(Err(err)) => err.into_response(),
        None => method_not_allowed(&state.resource, &request),
    }
}

fn method_not_allowed(resource: &RestResource, request: &crate::request::Request) -> Response {
    let allow = resource
        .allowed_methods()
        .iter()
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    debug!(
        resource = resource.name(),
        method = %request.method(),
        "No handler for method"
    );

    let status = StatusCode::METHOD_NOT_ALLOWED;
    (
        status,
        [(header::ALLOW, allow)],
        Json(ErrorResponse::with_status(
            "method_not_allowed",
            format!("Method {} not allowed", request.method()),
            status,
        )),
    )
        .into_response()
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
