//! # Simple REST
//!
//! Request authentication and content negotiation for HTTP resource handlers.
//!
//! Handlers are plain functions over a transport-independent [`Request`].
//! This crate decides whether a request may reach them, and how whatever
//! they return is serialized.
//!
//! ## Features
//!
//! - **Auth gate**: session, superuser and HMAC-SHA256 signature checks,
//!   composable per route through [`AuthPolicy`]
//! - **Signed requests**: `sig`/`t` parameters with a five minute replay
//!   window, checked in constant time
//! - **Content negotiation**: `Accept` matching or a `_format` override,
//!   with JSON, HTML and plain-text renderers built in
//! - **Verb override**: `_method` in the query or form body
//! - **axum adapter**: mount resources on a router with CORS and tracing
//!
//! ## Architecture
//!
//! - [`request`] - Request model, parameters and current user
//! - [`resource`] - Views, per-verb resources and the [`Wrap`] seam
//! - [`auth`] - Signatures and auth guards
//! - [`negotiate`] - Replies, renderers and the negotiator
//! - [`server`] - Axum-based HTTP adapter
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust
//! use simple_rest::{login_required, Args, Method, Negotiator, Request, Resource, Reply, SessionUser};
//! use std::sync::Arc;
//!
//! let items: Resource<Reply> = Resource::new("items")
//!     .get(|_: &Request, _: &Args| Ok(serde_json::json!(["mug", "pen"]).into()));
//!
//! let items = Negotiator::new().apply(login_required(items));
//!
//! let request = Request::builder()
//!     .method(Method::Get)
//!     .accept("application/json")
//!     .user(Arc::new(SessionUser::new("alice")))
//!     .build();
//!
//! let response = items.dispatch(&request, &Args::new()).unwrap().unwrap();
//! assert_eq!(response.body_text(), r#"["mug","pen"]"#);
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod negotiate;
pub mod request;
pub mod resource;
pub mod server;

// Re-export commonly used types
pub use auth::{
    admin_required, auth_required, calculate_signature, login_required, request_passes_test,
    signature_required, static_key, validate_signature, AuthPolicy, Guard, KeyResolver,
    SignatureAuth, SignatureError,
};
pub use config::{Cli, Command, ServeConfig, SignConfig, UrlencodeConfig};
pub use error::{
    BoxError, CliError, ExtractError, HandlerError, HttpError, NegotiationError, RenderError,
};
pub use negotiate::{
    Decimal, NegotiatedResponse, Negotiator, Payload, Record, Renderer, Reply, SerializerRegistry,
    TemplateRenderer,
};
pub use request::{
    AnonymousUser, Args, CurrentUser, Method, Params, Request, RequestBuilder, SessionUser,
};
pub use resource::{Resource, View, Wrap};
pub use server::{create_router, RestResource, RouterConfig};
