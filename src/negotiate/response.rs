use bytes::Bytes;
use http::StatusCode;

/// A fully rendered response: status, content type and body.
///
/// Built once per request and not modified afterwards. The HTTP adapter
/// turns it into a wire response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedResponse {
    status: StatusCode,
    content_type: Option<String>,
    body: Bytes,
}

impl NegotiatedResponse {
    /// Empty response with `status` and no content type.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            content_type: None,
            body: Bytes::new(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// The 415 response for a request no renderer can satisfy.
    pub fn unsupported_media_type() -> Self {
        Self::new(StatusCode::UNSUPPORTED_MEDIA_TYPE)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Full `Content-Type` value, including the charset.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn into_parts(self) -> (StatusCode, Option<String>, Bytes) {
        (self.status, self.content_type, self.body)
    }
}
