use http::StatusCode;
use thiserror::Error;

/// Boxed error for handler failures this crate does not recognize.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Structured HTTP error raised by handlers or by an auth guard.
///
/// The negotiator turns it into a `{"error": message}` payload (or an empty
/// payload when there is no message) served with `status`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("HTTP {status}: {}", message.as_deref().unwrap_or("<no message>"))]
pub struct HttpError {
    /// Optional human-readable message
    pub message: Option<String>,

    /// Status code to respond with
    pub status: StatusCode,
}

impl HttpError {
    /// Create an error with the given status and no message.
    pub fn new(status: StatusCode) -> Self {
        Self {
            message: None,
            status,
        }
    }

    /// Create an error with a message and status.
    pub fn with_message(message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            message: Some(message.into()),
            status,
        }
    }

    /// The error raised when an auth predicate does not hold.
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED)
    }
}

impl Default for HttpError {
    fn default() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Errors a handler can return.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Structured error, recovered by the negotiator
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Anything else; propagates past the negotiator unmodified
    #[error(transparent)]
    Other(BoxError),
}

impl HandlerError {
    /// Wrap an arbitrary error.
    pub fn other(err: impl Into<BoxError>) -> Self {
        HandlerError::Other(err.into())
    }
}

/// Errors raised while serializing a payload.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The payload could not be encoded as JSON
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The templating collaborator failed
    #[error("Template {template} failed to render: {message}")]
    Template { template: String, message: String },

    /// A template was registered but no template engine is configured
    #[error("No template engine configured to render {0}")]
    NoTemplateEngine(String),
}

/// Errors escaping a negotiated handler.
#[derive(Debug, Error)]
pub enum NegotiationError {
    /// Structured error raised outside the negotiation boundary (e.g. by a
    /// guard wrapped around an already-negotiated view)
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Unrecognized handler error, propagated unmodified
    #[error("Handler failed: {0}")]
    Handler(BoxError),

    /// A renderer failed while encoding the payload
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Errors converting an HTTP request into a [`crate::request::Request`].
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The verb is not one a resource can handle (e.g. `CONNECT`)
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// The body is larger than the configured limit
    #[error("Request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// The body could not be read
    #[error("Failed to read request body: {0}")]
    Body(String),
}

/// Errors from the CLI helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CliError {
    /// A data argument is not `key=value`
    #[error("Invalid parameter '{0}': expected key=value")]
    InvalidPair(String),

    /// The `t` argument is not an integer timestamp
    #[error("Invalid timestamp '{0}': expected Unix seconds")]
    InvalidTimestamp(String),
}
