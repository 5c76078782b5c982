//! Component classes and their render lifecycle.
//!
//! A [`ComponentClass`] bundles a template, optional inlined JS/CSS, external media, an
//! optional [`ComponentSchema`] and a set of [`ComponentHooks`]. Each render creates a
//! [`Component`] instance that runs the pipeline in [`instance`]:
//!
//! 1. validate inputs, normalize slot fills, resolve the context
//! 2. push a render frame, build context data, cache inlined assets
//! 3. resolve and render the template inside a scoped context
//! 4. prefix the output with a dependency marker and, for outermost renders, aggregate
//!
//! Nested components are rendered from hooks with [`Component::render_child`], which
//! defers aggregation to the outermost render.
//!
//! # Examples
//!
//! ```rust,no_run
//! use serde_json::json;
//! use tera_components::{ComponentClass, ComponentEnv, RenderOptions};
//!
//! # fn example() -> anyhow::Result<()> {
//! let env = ComponentEnv::default();
//! let greeting = ComponentClass::builder("Greeting", "app.components.Greeting")
//!     .template("<html><head></head><body><p>Hello {{ name }}</p></body></html>")
//!     .css("p { color: teal; }")
//!     .context_data(|_component, _args, kwargs| Ok(kwargs.clone()))
//!     .build();
//!
//! let html = greeting.render(&env, RenderOptions::new().kwarg("name", json!("Ada")))?;
//! assert!(html.contains("<style>p { color: teal; }</style>"));
//! # Ok(())
//! # }
//! ```

mod context;
mod env;
pub mod instance;
mod media;
mod slots;
mod validation;

pub use context::{ContextScope, RenderContext, StateScope};
pub use env::ComponentEnv;
pub use instance::{Component, ComponentInput, ContextInput, RenderFrame, RenderOptions};
pub use media::{Media, MediaItem};
pub use slots::{Slot, SlotContent, SlotFn, SlotRef, is_filled_key, normalize_slot_fills};
pub use validation::{ArgsSchema, ComponentSchema, FieldSchema, MapSchema, ValueKind};

use regex::Regex;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::{Arc, LazyLock};

use crate::constants::CLASS_HASH_DIGEST_LEN;
use crate::core::RenderError;
use crate::dependencies::ScriptKind;
use crate::http::{ComponentView, Request, Response};
use crate::templating::{Template, TemplateInput};

/// Overridable steps of the render pipeline. Every method has a default.
pub trait ComponentHooks: Send + Sync {
    /// Build the variables the template sees. Defaults to no variables.
    fn get_context_data(
        &self,
        component: &Component,
        args: &[Value],
        kwargs: &Map<String, Value>,
    ) -> anyhow::Result<Map<String, Value>> {
        let _ = (component, args, kwargs);
        Ok(Map::new())
    }

    /// Name of the template to render, as an alternative to a fixed `template_name`.
    fn get_template_name(&self, context: &RenderContext) -> Option<String> {
        let _ = context;
        None
    }

    /// Template source to render, as an alternative to a fixed inline `template`.
    fn get_template(&self, context: &RenderContext) -> Option<TemplateInput> {
        let _ = context;
        None
    }

    /// Runs after the context is scoped and before the template renders. May adjust the
    /// context or the template.
    fn on_render_before(
        &self,
        component: &Component,
        context: &RenderContext,
        template: &mut Template,
    ) -> anyhow::Result<()> {
        let _ = (component, context, template);
        Ok(())
    }

    /// Runs after the template rendered. Returning `Some` replaces the output.
    fn on_render_after(
        &self,
        component: &Component,
        context: &RenderContext,
        template: &Template,
        content: &str,
    ) -> anyhow::Result<Option<String>> {
        let _ = (component, context, template, content);
        Ok(None)
    }

    /// Handle a `GET` request when the component is served as a view. `None` means the
    /// method is not handled and the view answers `405`.
    fn get(&self, component: &Component, request: &Request) -> anyhow::Result<Option<Response>> {
        let _ = (component, request);
        Ok(None)
    }

    /// Handle a `POST` request. See [`ComponentHooks::get`].
    fn post(&self, component: &Component, request: &Request) -> anyhow::Result<Option<Response>> {
        let _ = (component, request);
        Ok(None)
    }

    /// Handle a `PUT` request. See [`ComponentHooks::get`].
    fn put(&self, component: &Component, request: &Request) -> anyhow::Result<Option<Response>> {
        let _ = (component, request);
        Ok(None)
    }

    /// Handle a `PATCH` request. See [`ComponentHooks::get`].
    fn patch(&self, component: &Component, request: &Request) -> anyhow::Result<Option<Response>> {
        let _ = (component, request);
        Ok(None)
    }

    /// Handle a `DELETE` request. See [`ComponentHooks::get`].
    fn delete(&self, component: &Component, request: &Request) -> anyhow::Result<Option<Response>> {
        let _ = (component, request);
        Ok(None)
    }
}

/// Hooks that keep every default.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl ComponentHooks for DefaultHooks {}

type ContextDataFn =
    dyn Fn(&Component, &[Value], &Map<String, Value>) -> anyhow::Result<Map<String, Value>> + Send + Sync;

struct ContextDataHooks(Box<ContextDataFn>);

impl ComponentHooks for ContextDataHooks {
    fn get_context_data(
        &self,
        component: &Component,
        args: &[Value],
        kwargs: &Map<String, Value>,
    ) -> anyhow::Result<Map<String, Value>> {
        (self.0)(component, args, kwargs)
    }
}

/// Characters a class hash may not contain, so it always fits in a dependency marker.
static NON_MARKER_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\-\./]").expect("marker charset regex is valid"));

/// Derive the opaque class hash: short name plus a digest prefix of the import path.
///
/// Characters of `name` outside `[\w\-./]` are replaced with `_`.
///
/// # Examples
///
/// ```rust
/// use tera_components::component::class_hash;
///
/// let hash = class_hash("My Card", "app.components.MyCard");
/// assert!(hash.starts_with("My_Card_"));
/// assert_eq!(hash.len(), "My_Card_".len() + 6);
/// ```
pub fn class_hash(name: &str, import_path: &str) -> String {
    let digest = hex::encode(Sha256::digest(import_path.as_bytes()));
    let name = NON_MARKER_CHARS_RE.replace_all(name, "_");
    format!("{name}_{}", &digest[..CLASS_HASH_DIGEST_LEN])
}

/// Builds the response for [`ComponentClass::render_to_response`] from rendered HTML.
pub type ResponseFactory = fn(String) -> Response;

fn html_response(html: String) -> Response {
    Response::html(html)
}

/// A reusable component definition.
pub struct ComponentClass {
    name: String,
    import_path: String,
    class_hash: String,
    template_name: Option<String>,
    template: Option<String>,
    js: Option<String>,
    css: Option<String>,
    media: Media,
    schema: Option<ComponentSchema>,
    hooks: Box<dyn ComponentHooks>,
    response_factory: ResponseFactory,
}

impl fmt::Debug for ComponentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentClass")
            .field("name", &self.name)
            .field("class_hash", &self.class_hash)
            .field("template_name", &self.template_name)
            .field("has_template", &self.template.is_some())
            .field("media", &self.media)
            .finish_non_exhaustive()
    }
}

impl ComponentClass {
    /// Start defining a component.
    ///
    /// `import_path` identifies the class (module path plus name) and only ever appears
    /// hashed.
    pub fn builder(name: impl Into<String>, import_path: impl Into<String>) -> ComponentClassBuilder {
        ComponentClassBuilder {
            name: name.into(),
            import_path: import_path.into(),
            template_name: None,
            template: None,
            js: None,
            css: None,
            media: Media::default(),
            schema: None,
            hooks: Box::new(DefaultHooks),
            response_factory: html_response,
        }
    }

    /// Short display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully qualified identity.
    pub fn import_path(&self) -> &str {
        &self.import_path
    }

    /// Opaque hash used in markers, cache keys and URLs.
    pub fn class_hash(&self) -> &str {
        &self.class_hash
    }

    /// Fixed template name.
    pub fn template_name(&self) -> Option<&str> {
        self.template_name.as_deref()
    }

    /// Fixed inline template source.
    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    /// Inlined JS.
    pub fn js(&self) -> Option<&str> {
        self.js.as_deref()
    }

    /// Inlined CSS.
    pub fn css(&self) -> Option<&str> {
        self.css.as_deref()
    }

    /// Inlined content of the given kind.
    pub fn inlined(&self, kind: ScriptKind) -> Option<&str> {
        match kind {
            ScriptKind::Js => self.js(),
            ScriptKind::Css => self.css(),
        }
    }

    /// External media.
    pub fn media(&self) -> &Media {
        &self.media
    }

    /// Declared input/output shapes.
    pub fn schema(&self) -> Option<&ComponentSchema> {
        self.schema.as_ref()
    }

    /// Render hooks.
    pub fn hooks(&self) -> &dyn ComponentHooks {
        self.hooks.as_ref()
    }

    /// Wrap rendered HTML into a response, as [`ComponentClass::render_to_response`] does.
    pub fn make_response(&self, html: String) -> Response {
        (self.response_factory)(html)
    }

    /// Render with a fresh instance.
    pub fn render(self: &Arc<Self>, env: &ComponentEnv, options: RenderOptions) -> Result<String, RenderError> {
        Component::new(Arc::clone(self), env.clone()).render(options)
    }

    /// Render with a fresh instance into an HTML response, aggregating dependencies.
    pub fn render_to_response(
        self: &Arc<Self>,
        env: &ComponentEnv,
        options: RenderOptions,
    ) -> Result<Response, RenderError> {
        Component::new(Arc::clone(self), env.clone()).render_to_response(options)
    }

    /// Serve this component as an HTTP view that dispatches requests to the
    /// method handlers of its [`ComponentHooks`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tera_components::component::{Component, ComponentClass, ComponentHooks};
    /// use tera_components::http::{Request, Response};
    /// use tera_components::{ComponentEnv, RenderOptions};
    ///
    /// struct Greets;
    ///
    /// impl ComponentHooks for Greets {
    ///     fn get(&self, component: &Component, request: &Request) -> anyhow::Result<Option<Response>> {
    ///         let options = RenderOptions::new().request(request.clone());
    ///         Ok(Some(component.render_to_response(options)?))
    ///     }
    /// }
    ///
    /// let greeting = ComponentClass::builder("Greeting", "app.Greeting")
    ///     .template("<p>{{ request.method }}</p>")
    ///     .hooks(Greets)
    ///     .build();
    /// let view = greeting.as_view(ComponentEnv::default());
    ///
    /// let ok = view.handle(&Request::get("/greeting")).unwrap();
    /// assert!(ok.text().ends_with("<p>GET</p>"));
    /// assert_eq!(view.handle(&Request::new("POST", "/greeting")).unwrap().status, 405);
    /// ```
    pub fn as_view(self: &Arc<Self>, env: ComponentEnv) -> ComponentView {
        ComponentView::new(Arc::clone(self), env)
    }
}

/// Builder for [`ComponentClass`].
pub struct ComponentClassBuilder {
    name: String,
    import_path: String,
    template_name: Option<String>,
    template: Option<String>,
    js: Option<String>,
    css: Option<String>,
    media: Media,
    schema: Option<ComponentSchema>,
    hooks: Box<dyn ComponentHooks>,
    response_factory: ResponseFactory,
}

impl ComponentClassBuilder {
    /// Render the named template.
    pub fn template_name(mut self, name: impl Into<String>) -> Self {
        self.template_name = Some(name.into());
        self
    }

    /// Render this inline template source.
    pub fn template(mut self, source: impl Into<String>) -> Self {
        self.template = Some(source.into());
        self
    }

    /// Inlined JS.
    pub fn js(mut self, js: impl Into<String>) -> Self {
        self.js = Some(js.into());
        self
    }

    /// Inlined CSS.
    pub fn css(mut self, css: impl Into<String>) -> Self {
        self.css = Some(css.into());
        self
    }

    /// Replace all external media.
    pub fn media(mut self, media: Media) -> Self {
        self.media = media;
        self
    }

    /// Add an external script.
    pub fn media_js(mut self, item: MediaItem) -> Self {
        self.media.js.push(item);
        self
    }

    /// Add an external stylesheet.
    pub fn media_css(mut self, item: MediaItem) -> Self {
        self.media.css.push(item);
        self
    }

    /// Declare input/output shapes.
    pub fn schema(mut self, schema: ComponentSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Install custom hooks.
    pub fn hooks(mut self, hooks: impl ComponentHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    /// Install a closure as `get_context_data`, keeping the other hooks at their defaults.
    pub fn context_data<F>(mut self, f: F) -> Self
    where
        F: Fn(&Component, &[Value], &Map<String, Value>) -> anyhow::Result<Map<String, Value>>
            + Send
            + Sync
            + 'static,
    {
        self.hooks = Box::new(ContextDataHooks(Box::new(f)));
        self
    }

    /// Build responses with `factory` instead of a plain `200 text/html` response.
    pub fn response_factory(mut self, factory: ResponseFactory) -> Self {
        self.response_factory = factory;
        self
    }

    /// Finish the definition.
    pub fn build(self) -> Arc<ComponentClass> {
        let class_hash = class_hash(&self.name, &self.import_path);
        Arc::new(ComponentClass {
            name: self.name,
            import_path: self.import_path,
            class_hash,
            template_name: self.template_name,
            template: self.template,
            js: self.js,
            css: self.css,
            media: self.media,
            schema: self.schema,
            hooks: self.hooks,
            response_factory: self.response_factory,
        })
    }
}
