//! Handlers and the per-verb resources that group them.
//!
//! A [`View`] is a single handler plus the metadata upstream tooling
//! introspects (name and doc). A [`Resource`] holds one optional view per
//! [`Method`]. Guards and content negotiation are applied through the
//! [`Wrap`] trait, which treats a lone view and a whole resource uniformly:
//! for a resource, every present verb slot is transformed and absent slots
//! stay absent.

use std::fmt;
use std::sync::Arc;

use crate::error::HandlerError;
use crate::request::{Args, Method, Request};

/// Shared handler function.
pub type HandlerFn<T, E> = dyn Fn(&Request, &Args) -> Result<T, E> + Send + Sync;

// =============================================================================
// View
// =============================================================================

/// A handler together with its externally visible metadata.
pub struct View<T, E = HandlerError> {
    name: String,
    doc: Option<String>,
    func: Arc<HandlerFn<T, E>>,
}

impl<T, E> View<T, E> {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Request, &Args) -> Result<T, E> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            doc: None,
            func: Arc::new(func),
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn call(&self, request: &Request, args: &Args) -> Result<T, E> {
        (self.func)(request, args)
    }

    /// Replace the handler, keeping name and doc.
    ///
    /// `wrap` receives the current handler and returns the new one.
    pub fn decorate<U, F, W>(self, wrap: W) -> View<U, F>
    where
        W: FnOnce(Arc<HandlerFn<T, E>>) -> Arc<HandlerFn<U, F>>,
    {
        View {
            name: self.name,
            doc: self.doc,
            func: wrap(self.func),
        }
    }
}

impl<T, E> Clone for View<T, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            doc: self.doc.clone(),
            func: Arc::clone(&self.func),
        }
    }
}

impl<T, E> fmt::Debug for View<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("name", &self.name)
            .field("doc", &self.doc)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Resource
// =============================================================================

/// One optional view per HTTP verb.
pub struct Resource<T, E = HandlerError> {
    name: String,
    slots: [Option<View<T, E>>; Method::COUNT],
}

impl<T, E> Resource<T, E> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slots: Default::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Install `view` in the slot for `method`.
    pub fn with(mut self, method: Method, view: View<T, E>) -> Self {
        self.slots[method.index()] = Some(view);
        self
    }

    /// Install a handler for `method`, named `<resource>.<verb>`.
    pub fn on<F>(self, method: Method, func: F) -> Self
    where
        F: Fn(&Request, &Args) -> Result<T, E> + Send + Sync + 'static,
    {
        let name = format!("{}.{}", self.name, method.as_str().to_lowercase());
        self.with(method, View::new(name, func))
    }

    pub fn get(self, func: impl Fn(&Request, &Args) -> Result<T, E> + Send + Sync + 'static) -> Self {
        self.on(Method::Get, func)
    }

    pub fn post(self, func: impl Fn(&Request, &Args) -> Result<T, E> + Send + Sync + 'static) -> Self {
        self.on(Method::Post, func)
    }

    pub fn put(self, func: impl Fn(&Request, &Args) -> Result<T, E> + Send + Sync + 'static) -> Self {
        self.on(Method::Put, func)
    }

    pub fn delete(self, func: impl Fn(&Request, &Args) -> Result<T, E> + Send + Sync + 'static) -> Self {
        self.on(Method::Delete, func)
    }

    pub fn view(&self, method: Method) -> Option<&View<T, E>> {
        self.slots[method.index()].as_ref()
    }

    /// Verbs with a handler installed.
    pub fn allowed_methods(&self) -> Vec<Method> {
        Method::ALL
            .into_iter()
            .filter(|m| self.slots[m.index()].is_some())
            .collect()
    }

    /// Call the view for the request's verb, or `None` if the resource has
    /// no handler for it.
    pub fn dispatch(&self, request: &Request, args: &Args) -> Option<Result<T, E>> {
        self.view(request.method()).map(|view| view.call(request, args))
    }

    /// Transform every present slot.
    pub fn map<U, F>(self, mut f: impl FnMut(View<T, E>) -> View<U, F>) -> Resource<U, F> {
        let Resource { name, slots } = self;
        Resource {
            name,
            slots: slots.map(|slot| slot.map(&mut f)),
        }
    }
}

impl<T, E> Clone for Resource<T, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            slots: self.slots.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Resource<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("methods", &self.allowed_methods())
            .finish()
    }
}

// =============================================================================
// Wrap
// =============================================================================

/// Something a view-level transformation can be applied to.
pub trait Wrap<T, E> {
    /// The same shape with the transformed view type.
    type Output<U, F>;

    fn wrap<U, F>(self, f: impl FnMut(View<T, E>) -> View<U, F>) -> Self::Output<U, F>;
}

impl<T, E> Wrap<T, E> for View<T, E> {
    type Output<U, F> = View<U, F>;

    fn wrap<U, F>(self, mut f: impl FnMut(View<T, E>) -> View<U, F>) -> View<U, F> {
        f(self)
    }
}

impl<T, E> Wrap<T, E> for Resource<T, E> {
    type Output<U, F> = Resource<U, F>;

    fn wrap<U, F>(self, f: impl FnMut(View<T, E>) -> View<U, F>) -> Resource<U, F> {
        self.map(f)
    }
}
