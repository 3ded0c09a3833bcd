//! Conversion from axum requests to the transport-independent [`Request`].
//!
//! The form body is decoded for every verb, not only POST, so PUT/PATCH/DELETE
//! bodies take part in `_method` overrides and signature checks. Bodies of any
//! other content type are read (to enforce the limit) and then ignored.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Path};
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::request::Parts;
use tracing::debug;

use crate::error::ExtractError;
use crate::request::{Args, CurrentUser, Method, Request};

/// Default request body limit (1 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Build a [`Request`] plus the route captures from an axum request.
///
/// The current user is read from the request extensions as an
/// `Arc<dyn CurrentUser>`, as installed by an upstream session layer; it
/// defaults to anonymous.
pub async fn into_rest_request(
    request: axum::extract::Request,
    body_limit: usize,
) -> Result<(Request, Args), ExtractError> {
    let (mut parts, body) = request.into_parts();

    let method = Method::try_from(&parts.method)
        .map_err(|_| ExtractError::UnsupportedMethod(parts.method.to_string()))?;

    if declared_length(&parts).is_some_and(|len| len > body_limit) {
        return Err(ExtractError::BodyTooLarge { limit: body_limit });
    }

    let args = route_args(&mut parts).await;

    let bytes = axum::body::to_bytes(body, body_limit)
        .await
        .map_err(|e| ExtractError::Body(e.to_string()))?;

    let mut builder = Request::builder()
        .method(method)
        .query_string(parts.uri.query().unwrap_or(""));

    if is_form(&parts) {
        builder = builder.form_body(&bytes);
    } else if !bytes.is_empty() {
        debug!(bytes = bytes.len(), "Ignoring non-form request body");
    }

    if let Some(user) = parts.extensions.get::<Arc<dyn CurrentUser>>() {
        builder = builder.user(Arc::clone(user));
    }

    Ok((builder.headers(parts.headers).build(), args))
}

/// Named path captures, in route order.
async fn route_args(parts: &mut Parts) -> Args {
    match Path::<Vec<(String, String)>>::from_request_parts(parts, &()).await {
        Ok(Path(captures)) => captures
            .into_iter()
            .fold(Args::new(), |args, (key, value)| args.with(key, value)),
        Err(_) => Args::new(),
    }
}

fn declared_length(parts: &Parts) -> Option<usize> {
    parts
        .headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

fn is_form(parts: &Parts) -> bool {
    parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}
