//! Router configuration.
//!
//! Mounts negotiated resources at paths and applies CORS and tracing.
//!
//! # Route Structure
//!
//! ```text
//! /health          - Health check (public)
//! <path>           - One resource per path, any verb; named captures
//!                    become route arguments (a `{_format}` capture acts
//!                    as a format override)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use simple_rest::{create_router, AuthPolicy, Negotiator, Resource, RouterConfig};
//!
//! let items = Resource::new("items").get(|_, _| Ok(serde_json::json!(["a", "b"]).into()));
//! let items = AuthPolicy::Login.apply(Negotiator::new().apply(items));
//!
//! let config = RouterConfig::new()
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//! let router = create_router(vec![("/items".to_string(), items)], config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{any, get},
    Router,
};
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::extract::DEFAULT_BODY_LIMIT;
use super::handlers::{health_handler, resource_handler, ResourceState, RestResource};

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// Maximum request body size in bytes
    pub body_limit: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterConfig {
    /// Create a new router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Tracing is enabled
    /// - Bodies are limited to 1 MiB
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            enable_tracing: true,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    /// Pass None (or don't call this method) to allow any origin.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    /// Set the request body limit in bytes.
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the application router.
///
/// Each `(path, resource)` pair is mounted for every verb; the resource
/// decides which verbs it answers. Auth and negotiation are expected to be
/// applied to the resources already. `/health` is always mounted and must
/// not be reused.
pub fn create_router(routes: Vec<(String, RestResource)>, config: RouterConfig) -> Router {
    let mut router = Router::new().route("/health", get(health_handler));

    for (path, resource) in routes {
        let state = ResourceState {
            resource: Arc::new(resource),
            body_limit: config.body_limit,
        };
        router = router.route(&path, any(resource_handler).with_state(state));
    }

    let router = router.layer(build_cors_layer(&config));

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::OPTIONS,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([ACCEPT, AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
