//! Content negotiation.
//!
//! This module turns whatever a handler returns into a finished response:
//!
//! ```text
//! handler ──► Reply ──► status coercion ──► mimetype ──► renderer ──► NegotiatedResponse
//!   │                                          │
//!   └─ HttpError ──► {"error": msg} ───────────┘
//!                                              │
//!                          _format override (param, then route arg)
//!                          else Accept header vs. registered types
//!                          else 415
//! ```
//!
//! # Components
//!
//! - [`Negotiator`]: wraps views and resources, resolves the mimetype and
//!   renders the payload
//! - [`SerializerRegistry`]: mimetype → renderer, layered over the
//!   JSON/HTML/plain-text built-ins
//! - [`accept`]: `Accept` header matching
//! - [`mimetypes`]: format name → mimetype lookup
//! - [`highlight`]: JSON highlighting for the HTML renderer

pub mod accept;
pub mod highlight;
pub mod mimetypes;
pub mod negotiator;
pub mod payload;
pub mod response;
pub mod serializers;

pub use highlight::{Highlighter, JsonHighlighter};
pub use negotiator::{Negotiator, TemplateRenderer, DEFAULT_CHARSET, TEMPLATE_CONTEXT_KEY};
pub use payload::{coerce_status, Decimal, Payload, Record, Renderable, Reply, ResolvedReply};
pub use response::NegotiatedResponse;
pub use serializers::{
    to_html, to_html_with, to_json, to_text, RenderFn, Renderer, SerializerRegistry,
    BUILTIN_MIMETYPES,
};
