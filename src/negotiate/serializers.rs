//! Built-in renderers and the mimetype → renderer registry.
//!
//! # Lookup Rule
//!
//! A [`SerializerRegistry`] holds per-instance overrides on top of three
//! built-ins:
//!
//! | Mimetype           | Built-in renderer                               |
//! |--------------------|--------------------------------------------------|
//! | `application/json` | [`to_json`] (compact)                           |
//! | `text/html`        | [`to_html`] (4-space JSON in an HTML page)      |
//! | `text/plain`       | [`to_text`] (4-space JSON, else the raw string) |
//!
//! An override for a mimetype shadows the built-in for the same key. Keys
//! with neither an override nor a built-in have no renderer, which the
//! negotiator answers with 415. The registry is filled at setup and only
//! read while serving requests.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::debug;

use super::highlight::Highlighter;
use super::payload::Payload;
use crate::error::RenderError;

/// Mimetypes with a built-in renderer, in negotiation preference order.
pub const BUILTIN_MIMETYPES: [&str; 3] = ["application/json", "text/html", "text/plain"];

/// Indentation used by the human-readable renderers.
pub const PRETTY_INDENT: usize = 4;

/// Rendering function for one mimetype.
pub type RenderFn = Arc<dyn Fn(&Payload) -> Result<String, RenderError> + Send + Sync>;

/// How a mimetype is rendered.
#[derive(Clone)]
pub enum Renderer {
    /// Render through the templating collaborator with this template name
    Template(String),

    /// Render with a function
    Func(RenderFn),
}

impl Renderer {
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&Payload) -> Result<String, RenderError> + Send + Sync + 'static,
    {
        Renderer::Func(Arc::new(f))
    }

    pub fn template(name: impl Into<String>) -> Self {
        Renderer::Template(name.into())
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Renderer::Template(name) => f.debug_tuple("Template").field(name).finish(),
            Renderer::Func(_) => f.write_str("Func(..)"),
        }
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Per-negotiator mimetype → renderer overrides, layered over the
/// built-ins.
#[derive(Debug, Clone, Default)]
pub struct SerializerRegistry {
    overrides: Vec<(String, Renderer)>,
}

impl SerializerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the renderer for `mimetype`.
    pub fn insert(&mut self, mimetype: impl Into<String>, renderer: Renderer) {
        let mimetype = mimetype.into();
        match self.overrides.iter_mut().find(|(key, _)| *key == mimetype) {
            Some(slot) => slot.1 = renderer,
            None => self.overrides.push((mimetype, renderer)),
        }
    }

    /// Drop the override for `mimetype`. The built-in, if any, shows through
    /// again.
    pub fn remove(&mut self, mimetype: &str) -> Option<Renderer> {
        let pos = self.overrides.iter().position(|(key, _)| key == mimetype)?;
        Some(self.overrides.remove(pos).1)
    }

    /// Override first, then built-in.
    pub fn get(&self, mimetype: &str) -> Option<Renderer> {
        self.overrides
            .iter()
            .find(|(key, _)| key == mimetype)
            .map(|(_, renderer)| renderer.clone())
            .or_else(|| builtin(mimetype))
    }

    pub fn contains(&self, mimetype: &str) -> bool {
        self.get(mimetype).is_some()
    }

    /// Every mimetype with a renderer: built-ins first, then override-only
    /// keys in registration order.
    pub fn mimetypes(&self) -> Vec<String> {
        let mut keys: Vec<String> = BUILTIN_MIMETYPES.iter().map(|s| s.to_string()).collect();
        for (key, _) in &self.overrides {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
        keys
    }
}

/// The built-in renderer for `mimetype`, if there is one.
pub fn builtin(mimetype: &str) -> Option<Renderer> {
    match mimetype {
        "application/json" => Some(Renderer::func(|data: &Payload| to_json(data, None))),
        "text/html" => Some(Renderer::func(to_html)),
        "text/plain" => Some(Renderer::func(to_text)),
        _ => None,
    }
}

// =============================================================================
// Built-in Renderers
// =============================================================================

/// Serialize as JSON, indented by `indent` spaces if given.
///
/// Non-ASCII text is written as UTF-8, not escaped. Record collections are
/// written in their model layout (see [`Payload::Records`]).
pub fn to_json(data: &Payload, indent: Option<usize>) -> Result<String, RenderError> {
    let value = data.to_json_value()?;
    match indent {
        None => Ok(serde_json::to_string(&value)?),
        Some(width) => {
            let indent = vec![b' '; width];
            let mut buf = Vec::new();
            let mut serializer =
                serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(&indent));
            value.serialize(&mut serializer)?;
            Ok(String::from_utf8_lossy(&buf).into_owned())
        }
    }
}

/// Serialize as an HTML page showing indented JSON.
///
/// With the `highlight` feature the JSON is syntax highlighted; otherwise it
/// is shown as an escaped preformatted block.
pub fn to_html(data: &Payload) -> Result<String, RenderError> {
    to_html_with(data, default_highlighter())
}

/// [`to_html`] with an explicit highlighter (or none).
pub fn to_html_with(data: &Payload, highlighter: Option<&dyn Highlighter>) -> Result<String, RenderError> {
    let code = to_json(data, Some(PRETTY_INDENT))?;

    let (style, body) = match highlighter {
        Some(h) => (
            format!(
                "\n        <style type=\"text/css\">\n{}\n        </style>",
                h.style_defs()
            ),
            h.highlight(&code),
        ),
        None => (
            String::new(),
            format!("<pre><code>{}</code></pre>", escape_html(&code)),
        ),
    };

    Ok(format!(
        "<html>\n    <head>{}\n    </head>\n    <body>\n{}\n    </body>\n</html>\n",
        style, body
    ))
}

/// Serialize as indented JSON, or fall back to the raw string form when the
/// data cannot be JSON-encoded.
pub fn to_text(data: &Payload) -> Result<String, RenderError> {
    match to_json(data, Some(PRETTY_INDENT)) {
        Ok(text) => Ok(text),
        Err(e) => {
            debug!("Plain text falling back to raw form: {}", e);
            Ok(data.raw_string())
        }
    }
}

#[cfg(feature = "highlight")]
fn default_highlighter() -> Option<&'static dyn Highlighter> {
    Some(&super::highlight::JsonHighlighter)
}

#[cfg(not(feature = "highlight"))]
fn default_highlighter() -> Option<&'static dyn Highlighter> {
    None
}

/// Escape text for inclusion in HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}
