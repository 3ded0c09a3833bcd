//! Transport-independent request model.
//!
//! A [`Request`] carries the verb, the query and body parameters, the
//! headers, and the current user. The HTTP adapter in [`crate::server`]
//! builds one per inbound request; tests build them directly through
//! [`Request::builder`].
//!
//! # Reserved parameters
//!
//! - `_method` overrides the transport verb. It is looked up in the query
//!   first, then in the body, and removed from whichever carried it.
//! - `_format` overrides content negotiation (see [`crate::negotiate`]).
//! - `sig` / `t` carry a request signature (see [`crate::auth`]).

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use http::header::{HeaderMap, HeaderValue, ACCEPT};
use url::form_urlencoded;

/// Parameter carrying an HTTP verb override.
pub const METHOD_OVERRIDE_PARAM: &str = "_method";

/// Parameter (or named route capture) carrying a response format override.
pub const FORMAT_PARAM: &str = "_format";

// =============================================================================
// Method
// =============================================================================

/// The HTTP verbs a resource can expose a handler for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
}

impl Method {
    /// Number of recognized verbs.
    pub const COUNT: usize = 8;

    /// Every recognized verb, in slot order.
    pub const ALL: [Method; Method::COUNT] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
        Method::Head,
        Method::Options,
        Method::Trace,
    ];

    /// Upper-case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no recognized verb.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unrecognized HTTP method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    /// Case-insensitive parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}

impl TryFrom<&http::Method> for Method {
    type Error = UnknownMethod;

    fn try_from(method: &http::Method) -> Result<Self, Self::Error> {
        method.as_str().parse()
    }
}

// =============================================================================
// Params
// =============================================================================

/// Insertion-ordered string parameters.
///
/// Inserting an existing key replaces its value in place, so the last write
/// wins while the original position is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `application/x-www-form-urlencoded` text.
    pub fn from_urlencoded(input: &str) -> Self {
        Self::from_urlencoded_bytes(input.as_bytes())
    }

    /// Parse a raw `application/x-www-form-urlencoded` body.
    pub fn from_urlencoded_bytes(input: &[u8]) -> Self {
        form_urlencoded::parse(input)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set `key`, replacing any existing value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    /// Remove `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.pairs.iter().position(|(k, _)| k == key)?;
        Some(self.pairs.remove(pos).1)
    }

    /// Merge `other` into `self`; values from `other` win.
    pub fn merge(&mut self, other: &Params) {
        for (k, v) in other.iter() {
            self.insert(k, v);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Encode as `application/x-www-form-urlencoded`, in insertion order.
    pub fn to_urlencoded(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (k, v) in self.iter() {
            serializer.append_pair(k, v);
        }
        serializer.finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

// =============================================================================
// Route Arguments
// =============================================================================

/// Arguments captured by the route that matched the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    /// Unnamed captures, in order
    pub positional: Vec<String>,

    /// Named captures
    pub named: Params,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named capture.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.named.insert(key, value);
        self
    }

    /// Add a positional capture.
    pub fn with_positional(mut self, value: impl Into<String>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.named.get(key)
    }
}

// =============================================================================
// Current User
// =============================================================================

/// The session user as seen by the auth gate.
///
/// Credential handling lives upstream; the gate only asks these two questions.
pub trait CurrentUser: Send + Sync + fmt::Debug {
    /// Whether the request belongs to a logged-in session.
    fn is_authenticated(&self) -> bool;

    /// Whether the user is flagged as a superuser.
    fn is_superuser(&self) -> bool;
}

/// A request without a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousUser;

impl CurrentUser for AnonymousUser {
    fn is_authenticated(&self) -> bool {
        false
    }

    fn is_superuser(&self) -> bool {
        false
    }
}

/// A user resolved from a session.
#[derive(Debug, Clone, Default)]
pub struct SessionUser {
    pub username: String,
    pub superuser: bool,
}

impl SessionUser {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            superuser: false,
        }
    }

    pub fn superuser(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            superuser: true,
        }
    }
}

impl CurrentUser for SessionUser {
    fn is_authenticated(&self) -> bool {
        true
    }

    fn is_superuser(&self) -> bool {
        self.superuser
    }
}

// =============================================================================
// Request
// =============================================================================

/// An inbound request, after verb override resolution.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    query: Params,
    body: Params,
    headers: HeaderMap,
    user: Arc<dyn CurrentUser>,
}

impl Request {
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn query(&self) -> &Params {
        &self.query
    }

    /// Parameters decoded from the message body.
    pub fn body(&self) -> &Params {
        &self.body
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn user(&self) -> &dyn CurrentUser {
        self.user.as_ref()
    }

    /// The raw `Accept` header, empty when absent or not valid text.
    pub fn accept(&self) -> &str {
        self.headers
            .get(ACCEPT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    /// Working copy of the request parameters: the query, plus the body for
    /// every verb other than GET (body values win).
    pub fn params(&self) -> Params {
        let mut data = self.query.clone();
        if self.method != Method::Get {
            data.merge(&self.body);
        }
        data
    }

    /// Look a parameter up in the query, then in the body.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query.get(key).or_else(|| self.body.get(key))
    }
}

/// Builder for [`Request`].
#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Option<Method>,
    query: Params,
    body: Params,
    headers: HeaderMap,
    user: Option<Arc<dyn CurrentUser>>,
}

impl RequestBuilder {
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Set the query parameters from a raw query string.
    pub fn query_string(mut self, query: &str) -> Self {
        self.query = Params::from_urlencoded(query);
        self
    }

    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key, value);
        self
    }

    /// Set the body parameters from a form-encoded body.
    pub fn form_body(mut self, body: impl AsRef<[u8]>) -> Self {
        self.body = Params::from_urlencoded_bytes(body.as_ref());
        self
    }

    pub fn body_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.body.insert(key, value);
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Set the `Accept` header. Values that are not valid header text are
    /// ignored.
    pub fn accept(mut self, accept: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(accept) {
            self.headers.insert(ACCEPT, value);
        }
        self
    }

    pub fn user(mut self, user: Arc<dyn CurrentUser>) -> Self {
        self.user = Some(user);
        self
    }

    /// Finish the request, applying any `_method` override.
    ///
    /// An override naming an unknown verb is dropped and the transport verb
    /// is kept.
    pub fn build(mut self) -> Request {
        let transport = self.method.unwrap_or(Method::Get);

        // An empty query value falls through to the body
        let override_value = self
            .query
            .remove(METHOD_OVERRIDE_PARAM)
            .filter(|v| !v.is_empty())
            .or_else(|| {
                self.body
                    .remove(METHOD_OVERRIDE_PARAM)
                    .filter(|v| !v.is_empty())
            });
        let method = match override_value {
            Some(v) => match v.parse::<Method>() {
                Ok(m) => m,
                Err(e) => {
                    tracing::debug!("Ignoring method override: {}", e);
                    transport
                }
            },
            None => transport,
        };

        Request {
            method,
            query: self.query,
            body: self.body,
            headers: self.headers,
            user: self.user.unwrap_or_else(|| Arc::new(AnonymousUser)),
        }
    }
}
