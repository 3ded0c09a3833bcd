//! Authorization guards for views and resources.
//!
//! Every guard has the same shape: a predicate over `(request, args)` that
//! is evaluated before the handler runs. When it does not hold, the guard
//! returns an [`HttpError`] (401 by default) instead of calling the handler.
//!
//! Routes declare their requirement with an [`AuthPolicy`]:
//!
//! | Policy          | Allows when                                          |
//! |-----------------|------------------------------------------------------|
//! | `Public`        | always                                               |
//! | `Login`         | the session user is authenticated                    |
//! | `Admin`         | the session user is authenticated and a superuser    |
//! | `Signature(k)`  | the request signature validates against `k`          |
//! | `Cascading(k)`  | the signature validates, or the user is authenticated |
//!
//! Signature problems (missing `sig`/`t`, malformed `t`, stale timestamp,
//! unknown key, wrong signature) all fail closed: the predicate is false and
//! no error escapes the check.

use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use tracing::{debug, warn};

use super::signature::{
    unix_now, SignatureAuth, SignatureError, SIGNATURE_PARAM, TIMESTAMP_PARAM,
};
use crate::error::HttpError;
use crate::request::{Args, Request};
use crate::resource::{HandlerFn, View, Wrap};

/// Resolves the secret key for a request (e.g. per tenant). `None` means
/// no valid key, and the signature check fails closed.
pub type KeyResolver = Arc<dyn Fn(&Request, &Args) -> Option<Vec<u8>> + Send + Sync>;

/// Predicate deciding whether a request may reach the handler.
pub type Predicate = Arc<dyn Fn(&Request, &Args) -> bool + Send + Sync>;

/// A resolver that returns the same key for every request.
pub fn static_key(key: impl AsRef<[u8]>) -> KeyResolver {
    let key = key.as_ref().to_vec();
    Arc::new(move |_: &Request, _: &Args| Some(key.clone()))
}

// =============================================================================
// Signature Validation
// =============================================================================

/// Validate the `sig`/`t` parameters of `request` against `secret_key`.
pub fn validate_signature(request: &Request, secret_key: &[u8]) -> bool {
    validate_signature_at(request, secret_key, unix_now())
}

/// [`validate_signature`] with an explicit clock reading.
pub fn validate_signature_at(request: &Request, secret_key: &[u8], now: i64) -> bool {
    match check_signature(request, secret_key, now) {
        Ok(()) => true,
        Err(err @ SignatureError::InvalidSignature) => {
            warn!(method = %request.method(), "Signature rejected: {}", err);
            false
        }
        Err(err) => {
            debug!(method = %request.method(), "Signature rejected: {}", err);
            false
        }
    }
}

/// Signature check with the failure reason kept for logging.
pub fn check_signature(request: &Request, secret_key: &[u8], now: i64) -> Result<(), SignatureError> {
    // Working copy; the request's own parameters are never touched
    let mut data = request.params();

    let signature = data
        .remove(SIGNATURE_PARAM)
        .filter(|s| !s.is_empty())
        .ok_or(SignatureError::MissingSignature)?;

    let raw_timestamp = data
        .remove(TIMESTAMP_PARAM)
        .filter(|s| !s.is_empty())
        .ok_or(SignatureError::MissingTimestamp)?;
    let timestamp = raw_timestamp
        .trim()
        .parse::<i64>()
        .map_err(|_| SignatureError::InvalidTimestamp(raw_timestamp.clone()))?;

    SignatureAuth::new(secret_key).verify_at(&data, &signature, timestamp, now)
}

fn signature_with_resolver(resolver: &KeyResolver, request: &Request, args: &Args) -> bool {
    match resolver(request, args) {
        Some(key) => validate_signature(request, &key),
        None => {
            debug!("Signature rejected: {}", SignatureError::MissingKey);
            false
        }
    }
}

// =============================================================================
// Guard
// =============================================================================

/// A predicate plus the error to raise when it does not hold.
#[derive(Clone)]
pub struct Guard {
    test: Predicate,
    message: Option<String>,
    status: StatusCode,
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("message", &self.message)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl Guard {
    /// Guard rejecting with 401 and no message.
    pub fn new(test: Predicate) -> Self {
        Self {
            test,
            message: None,
            status: StatusCode::UNAUTHORIZED,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn allows(&self, request: &Request, args: &Args) -> bool {
        (self.test)(request, args)
    }

    fn rejection(&self) -> HttpError {
        HttpError {
            message: self.message.clone(),
            status: self.status,
        }
    }

    /// Wrap a single view.
    pub fn guard_view<T, E>(&self, view: View<T, E>) -> View<T, E>
    where
        T: 'static,
        E: From<HttpError> + 'static,
    {
        let guard = self.clone();
        let name = view.name().to_string();
        view.decorate(move |inner| {
            let wrapped: Arc<HandlerFn<T, E>> = Arc::new(move |request: &Request, args: &Args| {
                if !guard.allows(request, args) {
                    debug!(
                        view = %name,
                        status = guard.status.as_u16(),
                        "Request rejected by auth guard"
                    );
                    return Err(guard.rejection().into());
                }
                inner(request, args)
            });
            wrapped
        })
    }

    /// Wrap a view or every handler of a resource.
    pub fn apply<W, T, E>(&self, obj: W) -> W::Output<T, E>
    where
        W: Wrap<T, E>,
        T: 'static,
        E: From<HttpError> + 'static,
    {
        obj.wrap(|view| self.guard_view(view))
    }
}

/// Guard built from an arbitrary predicate, rejecting with `status` and
/// `message`.
pub fn request_passes_test<F>(test: F, message: Option<String>, status: StatusCode) -> Guard
where
    F: Fn(&Request, &Args) -> bool + Send + Sync + 'static,
{
    Guard {
        test: Arc::new(test),
        message,
        status,
    }
}

// =============================================================================
// Auth Policy
// =============================================================================

/// The authorization requirement attached to a route.
#[derive(Clone, Default)]
pub enum AuthPolicy {
    /// No requirement
    #[default]
    Public,

    /// Logged-in session required
    Login,

    /// Logged-in superuser required
    Admin,

    /// Valid request signature required
    Signature(KeyResolver),

    /// Valid signature, or else a logged-in session
    Cascading(KeyResolver),
}

impl fmt::Debug for AuthPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AuthPolicy::Public => "Public",
            AuthPolicy::Login => "Login",
            AuthPolicy::Admin => "Admin",
            AuthPolicy::Signature(_) => "Signature",
            AuthPolicy::Cascading(_) => "Cascading",
        })
    }
}

impl AuthPolicy {
    /// Evaluate the policy for a request.
    pub fn allows(&self, request: &Request, args: &Args) -> bool {
        match self {
            AuthPolicy::Public => true,
            AuthPolicy::Login => request.user().is_authenticated(),
            AuthPolicy::Admin => request.user().is_authenticated() && request.user().is_superuser(),
            AuthPolicy::Signature(resolver) => signature_with_resolver(resolver, request, args),
            AuthPolicy::Cascading(resolver) => {
                signature_with_resolver(resolver, request, args) || request.user().is_authenticated()
            }
        }
    }

    /// The guard enforcing this policy.
    pub fn guard(&self) -> Guard {
        let policy = self.clone();
        Guard::new(Arc::new(move |request: &Request, args: &Args| policy.allows(request, args)))
    }

    /// Wrap a view or resource so it enforces this policy. `Public` leaves
    /// handlers unguarded.
    pub fn apply<W, T, E>(&self, obj: W) -> W::Output<T, E>
    where
        W: Wrap<T, E>,
        T: 'static,
        E: From<HttpError> + 'static,
    {
        match self {
            AuthPolicy::Public => obj.wrap(|view| view),
            _ => self.guard().apply(obj),
        }
    }
}

// =============================================================================
// Decorator Forms
// =============================================================================

/// Require a logged-in session.
pub fn login_required<W, T, E>(obj: W) -> W::Output<T, E>
where
    W: Wrap<T, E>,
    T: 'static,
    E: From<HttpError> + 'static,
{
    AuthPolicy::Login.apply(obj)
}

/// Require a logged-in superuser.
pub fn admin_required<W, T, E>(obj: W) -> W::Output<T, E>
where
    W: Wrap<T, E>,
    T: 'static,
    E: From<HttpError> + 'static,
{
    AuthPolicy::Admin.apply(obj)
}

/// Require a valid signature under the key `resolver` returns.
pub fn signature_required<W, T, E>(resolver: KeyResolver, obj: W) -> W::Output<T, E>
where
    W: Wrap<T, E>,
    T: 'static,
    E: From<HttpError> + 'static,
{
    AuthPolicy::Signature(resolver).apply(obj)
}

/// Require a valid signature or, failing that, a logged-in session.
pub fn auth_required<W, T, E>(resolver: KeyResolver, obj: W) -> W::Output<T, E>
where
    W: Wrap<T, E>,
    T: 'static,
    E: From<HttpError> + 'static,
{
    AuthPolicy::Cascading(resolver).apply(obj)
}

// =============================================================================
// Tests
// =============================================================================
