use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use serde_json::{Map, Value};
use tracing::debug;

use super::accept::best_match;
use super::mimetypes::guess_type;
use super::payload::{Payload, Reply, ResolvedReply};
use super::response::NegotiatedResponse;
use super::serializers::{Renderer, SerializerRegistry};
use crate::error::{HandlerError, NegotiationError, RenderError};
use crate::request::{Args, Request, FORMAT_PARAM};
use crate::resource::{HandlerFn, View, Wrap};

/// Key the payload is stored under in a template context.
pub const TEMPLATE_CONTEXT_KEY: &str = "context";

/// Default response charset.
pub const DEFAULT_CHARSET: &str = "utf-8";

/// External template engine used by [`Renderer::Template`] entries.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, context: &Map<String, Value>) -> Result<String, RenderError>;
}

impl<F> TemplateRenderer for F
where
    F: Fn(&str, &Map<String, Value>) -> Result<String, RenderError> + Send + Sync,
{
    fn render(&self, template: &str, context: &Map<String, Value>) -> Result<String, RenderError> {
        self(template, context)
    }
}

/// Converts handler replies into negotiated responses.
///
/// Configure it once at setup, then wrap views or resources with
/// [`Negotiator::apply`]. The negotiator is cheap to clone and every clone
/// shares nothing mutable.
#[derive(Clone)]
pub struct Negotiator {
    registry: SerializerRegistry,
    charset: String,
    templates: Option<Arc<dyn TemplateRenderer>>,
}

impl Default for Negotiator {
    fn default() -> Self {
        Self {
            registry: SerializerRegistry::new(),
            charset: DEFAULT_CHARSET.to_string(),
            templates: None,
        }
    }
}

impl fmt::Debug for Negotiator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Negotiator")
            .field("mimetypes", &self.registry.mimetypes())
            .field("charset", &self.charset)
            .field("templates", &self.templates.is_some())
            .finish()
    }
}

impl Negotiator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a renderer for `mimetype`, shadowing any built-in.
    pub fn with_renderer(mut self, mimetype: impl Into<String>, renderer: Renderer) -> Self {
        self.registry.insert(mimetype, renderer);
        self
    }

    /// Render `mimetype` through `template`.
    pub fn with_template(self, mimetype: impl Into<String>, template: impl Into<String>) -> Self {
        self.with_renderer(mimetype, Renderer::template(template))
    }

    pub fn with_template_engine(mut self, engine: Arc<dyn TemplateRenderer>) -> Self {
        self.templates = Some(engine);
        self
    }

    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    pub fn registry(&self) -> &SerializerRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SerializerRegistry {
        &mut self.registry
    }

    pub fn charset(&self) -> &str {
        &self.charset
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Pick the response mimetype.
    ///
    /// A format override that names a known extension wins. Otherwise the
    /// `Accept` header is matched against the registered mimetypes.
    pub fn resolve_mimetype(&self, request: &Request, format: Option<&str>) -> Option<String> {
        if let Some(mimetype) = format.filter(|f| !f.is_empty()).and_then(guess_type) {
            return Some(mimetype.to_string());
        }
        let mimetypes = self.registry.mimetypes();
        best_match(&mimetypes, request.accept()).map(str::to_string)
    }

    /// Render `data` for `request` with `status`.
    ///
    /// `format` is the route's format override; a `_format` request
    /// parameter takes precedence over it. Returns a bare 415 when no
    /// renderer exists for the resolved mimetype.
    pub fn render_to_response(
        &self,
        request: &Request,
        data: Option<&Payload>,
        status: StatusCode,
        format: Option<&str>,
    ) -> Result<NegotiatedResponse, RenderError> {
        let format = request.param(FORMAT_PARAM).filter(|f| !f.is_empty()).or(format);

        let Some((mimetype, renderer)) = self
            .resolve_mimetype(request, format)
            .and_then(|mimetype| self.registry.get(&mimetype).map(|r| (mimetype, r)))
        else {
            debug!(
                accept = request.accept(),
                format = format.unwrap_or(""),
                "No renderer for request"
            );
            return Ok(NegotiatedResponse::unsupported_media_type());
        };

        let content_type = format!("{}; charset={}", mimetype, self.charset);
        let response = NegotiatedResponse::new(status).with_content_type(content_type);

        let Some(data) = data else {
            return Ok(response);
        };

        let body = match renderer {
            Renderer::Func(render) => render(data)?,
            Renderer::Template(template) => self.render_template(&template, data)?,
        };
        Ok(response.with_body(body))
    }

    fn render_template(&self, template: &str, data: &Payload) -> Result<String, RenderError> {
        let engine = self
            .templates
            .as_ref()
            .ok_or_else(|| RenderError::NoTemplateEngine(template.to_string()))?;

        let mut context = Map::new();
        context.insert(TEMPLATE_CONTEXT_KEY.to_string(), data.to_json_value()?);
        engine.render(template, &context)
    }

    /// Turn a handler outcome into a response.
    ///
    /// Structured errors become `{"error": message}` replies; any other
    /// handler error propagates.
    pub fn respond(
        &self,
        request: &Request,
        args: &Args,
        outcome: Result<Reply, HandlerError>,
    ) -> Result<NegotiatedResponse, NegotiationError> {
        let reply = match outcome {
            Ok(reply) => reply,
            Err(HandlerError::Http(err)) => {
                debug!(status = err.status.as_u16(), "Handler raised {}", err);
                Reply::from_http_error(err)
            }
            Err(HandlerError::Other(err)) => return Err(NegotiationError::Handler(err)),
        };

        match reply.resolve() {
            ResolvedReply::Passthrough(response) => Ok(response),
            ResolvedReply::Render(payload, status) => Ok(self.render_to_response(
                request,
                payload.as_ref(),
                status,
                args.get(FORMAT_PARAM),
            )?),
        }
    }

    // =========================================================================
    // Wrapping
    // =========================================================================

    /// Wrap a single view.
    pub fn negotiate_view(
        &self,
        view: View<Reply, HandlerError>,
    ) -> View<NegotiatedResponse, NegotiationError> {
        let negotiator = self.clone();
        view.decorate(move |inner| {
            let wrapped: Arc<HandlerFn<NegotiatedResponse, NegotiationError>> =
                Arc::new(move |request: &Request, args: &Args| {
                    negotiator.respond(request, args, inner(request, args))
                });
            wrapped
        })
    }

    /// Wrap a view or every handler of a resource.
    pub fn apply<W>(&self, obj: W) -> W::Output<NegotiatedResponse, NegotiationError>
    where
        W: Wrap<Reply, HandlerError>,
    {
        obj.wrap(|view| self.negotiate_view(view))
    }
}
