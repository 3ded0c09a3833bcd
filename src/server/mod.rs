//! HTTP adapter.
//!
//! Serves [`crate::resource::Resource`]s over axum.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │              any verb on a mounted resource path                │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │   extract   │  │  handlers   │  │        routes           │  │
//! │  │ (axum → Req)│  │ (dispatch)  │  │ (router config, CORS)   │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod extract;
pub mod handlers;
pub mod routes;

pub use extract::{into_rest_request, DEFAULT_BODY_LIMIT};
pub use handlers::{
    health_handler, resource_handler, ErrorResponse, HealthResponse, ResourceState, RestResource,
};
pub use routes::{create_router, RouterConfig};
