//! Per-render component instances and the render pipeline.
//!
//! A [`Component`] keeps a stack of [`RenderFrame`]s. A frame is pushed when a render
//! starts and popped by a guard when it ends, on success and on error alike. Hooks and
//! slot functions running inside the render read the innermost frame through
//! [`Component::input`], [`Component::is_filled`] and [`Component::inject`].
//!
//! One instance should only drive one render tree at a time. Recursive renders of the
//! same instance from within its own hooks are fine: they push onto the same stack.

use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use super::context::RenderContext;
use super::env::ComponentEnv;
use super::slots::{Slot, SlotContent, SlotRef, is_filled_key, normalize_slot_fills};
use super::ComponentClass;
use crate::config::ContextBehavior;
use crate::constants::{
    BLOCK_CONTEXT_KEY, COMPONENT_NAME_CONTEXT_KEY, COMPONENT_VARS_KEY, ROOT_CTX_CONTEXT_KEY, SLOTS_KEY,
};
use crate::core::{ComponentError, RenderError};
use crate::dependencies::{RenderType, ScriptKind, cache_inlined, embed_marker, render_dependencies};
use crate::http::{Request, Response};
use crate::templating::{Template, TemplateInput};

static COMPONENT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+$").expect("component id regex is valid"));

/// Where a render takes its context from.
#[derive(Debug, Clone)]
pub enum ContextInput {
    /// Raw variables, wrapped into a fresh context.
    Data(Map<String, Value>),
    /// An existing context, used as-is.
    Existing(RenderContext),
}

/// Inputs of a single render call.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Context source. Defaults to an empty context.
    pub context: Option<ContextInput>,
    /// Positional arguments.
    pub args: Vec<Value>,
    /// Keyword arguments.
    pub kwargs: Map<String, Value>,
    /// Slot fills by slot name.
    pub slots: BTreeMap<String, SlotContent>,
    /// Whether slot fill output is HTML-escaped.
    pub escape_slots_content: bool,
    /// How dependencies are delivered when aggregated.
    pub render_type: RenderType,
    /// Whether to run aggregation on the output. Only the outermost render should.
    pub render_dependencies: bool,
    /// Request to bind a fresh context to.
    pub request: Option<Request>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            context: None,
            args: Vec::new(),
            kwargs: Map::new(),
            slots: BTreeMap::new(),
            escape_slots_content: true,
            render_type: RenderType::Document,
            render_dependencies: true,
            request: None,
        }
    }
}

impl RenderOptions {
    /// Defaults: no inputs, escaped slots, document, aggregation on.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_json::json;
    /// use tera_components::{RenderOptions, RenderType};
    ///
    /// let options = RenderOptions::new()
    ///     .kwarg("title", "Orders")
    ///     .arg(json!(3))
    ///     .slot("footer", "<b>done</b>")
    ///     .render_type(RenderType::Fragment);
    ///
    /// assert_eq!(options.kwargs["title"], json!("Orders"));
    /// assert!(options.escape_slots_content);
    /// assert!(options.render_dependencies);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Render with these raw context variables.
    pub fn context(mut self, data: Map<String, Value>) -> Self {
        self.context = Some(ContextInput::Data(data));
        self
    }

    /// Render with an existing context.
    pub fn with_context(mut self, context: RenderContext) -> Self {
        self.context = Some(ContextInput::Existing(context));
        self
    }

    /// Set all positional arguments.
    pub fn args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Set all keyword arguments.
    pub fn kwargs(mut self, kwargs: Map<String, Value>) -> Self {
        self.kwargs = kwargs;
        self
    }

    /// Add a keyword argument.
    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    /// Fill a slot.
    pub fn slot(mut self, name: impl Into<String>, content: impl Into<SlotContent>) -> Self {
        self.slots.insert(name.into(), content.into());
        self
    }

    /// Whether slot fill output is escaped.
    pub fn escape_slots_content(mut self, escape: bool) -> Self {
        self.escape_slots_content = escape;
        self
    }

    /// Document or fragment.
    pub fn render_type(mut self, render_type: RenderType) -> Self {
        self.render_type = render_type;
        self
    }

    /// Whether to aggregate dependencies on the output.
    ///
    /// Turn this off for renders whose output is embedded in a larger page that is
    /// aggregated later; otherwise that page would receive the assets twice.
    pub fn render_dependencies(mut self, render_dependencies: bool) -> Self {
        self.render_dependencies = render_dependencies;
        self
    }

    /// Bind a fresh context to `request`.
    pub fn request(mut self, request: Request) -> Self {
        self.request = Some(request);
        self
    }
}

/// Normalized inputs of the render a frame belongs to.
#[derive(Debug, Clone)]
pub struct ComponentInput {
    /// The resolved context.
    pub context: RenderContext,
    /// Positional arguments.
    pub args: Vec<Value>,
    /// Keyword arguments.
    pub kwargs: Map<String, Value>,
    /// Normalized slot fills.
    pub slots: BTreeMap<String, Slot>,
    /// Document or fragment.
    pub render_type: RenderType,
    /// Whether this render aggregates.
    pub render_dependencies: bool,
}

/// State of one in-flight render.
#[derive(Debug, Clone)]
pub struct RenderFrame {
    /// Inputs of the render.
    pub input: ComponentInput,
    /// Which slots received a fill. `None` until the template is resolved.
    pub is_filled: Option<BTreeMap<String, bool>>,
}

/// Pops the frame it pushed when dropped.
struct FrameGuard<'a> {
    stack: &'a Mutex<Vec<RenderFrame>>,
    depth: usize,
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.stack.lock().unwrap_or_else(PoisonError::into_inner).truncate(self.depth);
    }
}

/// A component instance.
pub struct Component {
    class: Arc<ComponentClass>,
    env: ComponentEnv,
    registered_name: Option<String>,
    component_id: String,
    outer_context: Option<RenderContext>,
    stack: Mutex<Vec<RenderFrame>>,
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name())
            .field("component_id", &self.component_id)
            .field("render_depth", &self.frames().len())
            .finish_non_exhaustive()
    }
}

fn generate_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("c{}", &id[..6])
}

impl Component {
    /// New instance with a generated id.
    pub fn new(class: Arc<ComponentClass>, env: ComponentEnv) -> Self {
        Self {
            class,
            env,
            registered_name: None,
            component_id: generate_id(),
            outer_context: None,
            stack: Mutex::new(Vec::new()),
        }
    }

    /// Use a specific id.
    ///
    /// # Errors
    ///
    /// [`ComponentError::ImproperlyConfigured`] when the id is empty or contains anything
    /// other than word characters, since it could not be read back from a dependency marker.
    pub fn with_id(mut self, component_id: impl Into<String>) -> Result<Self, ComponentError> {
        let component_id = component_id.into();
        if !COMPONENT_ID_RE.is_match(&component_id) {
            return Err(improperly_configured(format!(
                "Invalid id '{component_id}' for Component {}. Ids may only contain word characters.",
                self.name()
            )));
        }
        self.component_id = component_id;
        Ok(self)
    }

    /// Name the component was registered under.
    pub fn with_registered_name(mut self, name: impl Into<String>) -> Self {
        self.registered_name = Some(name.into());
        self
    }

    /// Context of the template (or component) this instance is rendered from.
    pub fn with_outer_context(mut self, context: RenderContext) -> Self {
        self.outer_context = Some(context);
        self
    }

    /// Registered name, or the class name.
    pub fn name(&self) -> &str {
        self.registered_name.as_deref().unwrap_or_else(|| self.class.name())
    }

    /// Id of this instance, as used in dependency markers.
    pub fn component_id(&self) -> &str {
        &self.component_id
    }

    /// The component's class.
    pub fn class(&self) -> &Arc<ComponentClass> {
        &self.class
    }

    /// Shared services.
    pub fn env(&self) -> &ComponentEnv {
        &self.env
    }

    /// Context this instance was rendered from, if any.
    pub fn outer_context(&self) -> Option<&RenderContext> {
        self.outer_context.as_ref()
    }

    fn frames(&self) -> MutexGuard<'_, Vec<RenderFrame>> {
        self.stack.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of renders of this instance in flight.
    pub fn render_depth(&self) -> usize {
        self.frames().len()
    }

    fn push_frame(&self, frame: RenderFrame) -> FrameGuard<'_> {
        let mut frames = self.frames();
        let depth = frames.len();
        frames.push(frame);
        FrameGuard {
            stack: &self.stack,
            depth,
        }
    }

    fn current_frame(&self, accessor: &str) -> Result<RenderFrame, ComponentError> {
        self.frames().last().cloned().ok_or_else(|| ComponentError::OutsideRender {
            component: self.name().to_string(),
            accessor: accessor.to_string(),
        })
    }

    /// Inputs of the innermost active render.
    ///
    /// # Errors
    ///
    /// [`ComponentError::OutsideRender`] when no render is active.
    pub fn input(&self) -> Result<ComponentInput, ComponentError> {
        self.current_frame("input").map(|frame| frame.input)
    }

    /// Which slots received a fill in the innermost active render, keyed by
    /// [`is_filled_key`].
    ///
    /// # Errors
    ///
    /// [`ComponentError::OutsideRender`] when no render is active, and
    /// [`ComponentError::SlotsNotResolved`] before the template was resolved (for example
    /// inside `get_context_data`).
    pub fn is_filled(&self) -> Result<BTreeMap<String, bool>, ComponentError> {
        self.current_frame("is_filled")?
            .is_filled
            .ok_or_else(|| ComponentError::SlotsNotResolved {
                component: self.name().to_string(),
            })
    }

    /// Value published under `key` by an enclosing
    /// [`RenderContext::provide`], or `default` when there is none.
    ///
    /// # Errors
    ///
    /// [`ComponentError::OutsideRender`] when no render is active.
    pub fn inject(&self, key: &str, default: Option<Value>) -> Result<Option<Value>, ComponentError> {
        let frame = self.current_frame("inject")?;
        Ok(frame.input.context.injected(key).or(default))
    }

    /// Render a slot fill of the innermost active render. `None` when the slot was not
    /// filled.
    pub fn render_slot(&self, name: &str, slot_kwargs: &Map<String, Value>) -> anyhow::Result<Option<String>> {
        let frame = self.current_frame("render_slot")?;
        let Some(slot) = frame.input.slots.get(name) else {
            return Ok(None);
        };
        let context = self.outer_context.clone().unwrap_or_else(|| frame.input.context.clone());
        let slot_ref = SlotRef {
            name: name.to_string(),
            component: self.name().to_string(),
        };
        slot.render(&context, slot_kwargs, &slot_ref).map(Some)
    }

    /// Render a nested component from within this component's hooks.
    ///
    /// The child never aggregates and inherits this render's type. Unless `options`
    /// carries its own context, the child renders with the current context, or with an
    /// isolated copy of it under [`ContextBehavior::Isolated`].
    pub fn render_child(&self, class: &Arc<ComponentClass>, mut options: RenderOptions) -> anyhow::Result<String> {
        let frame = self.current_frame("render_child")?;
        let parent_context = frame.input.context;

        if options.context.is_none() {
            let context = match self.env.config().context_behavior {
                ContextBehavior::Django => parent_context.clone(),
                ContextBehavior::Isolated => parent_context.isolated_copy(),
            };
            options.context = Some(ContextInput::Existing(context));
        }
        options.render_type = frame.input.render_type;
        options.render_dependencies = false;

        let child = Component::new(Arc::clone(class), self.env.clone()).with_outer_context(parent_context);
        Ok(child.render(options)?)
    }

    /// Render the component.
    ///
    /// # Errors
    ///
    /// Any failure is returned as a [`RenderError`] whose breadcrumb starts with this
    /// component's name. Failures of nested components keep their own names after it.
    pub fn render(&self, options: RenderOptions) -> Result<String, RenderError> {
        self.render_impl(options).map_err(|e| RenderError::wrap(self.name(), e))
    }

    /// Render with aggregation into a response built by the class's
    /// [`ResponseFactory`](super::ResponseFactory), a plain HTML response by default.
    ///
    /// # Errors
    ///
    /// Same as [`Component::render`].
    pub fn render_to_response(&self, options: RenderOptions) -> Result<Response, RenderError> {
        let html = self.render(options.render_dependencies(true))?;
        Ok(self.class.make_response(html))
    }

    fn render_impl(&self, options: RenderOptions) -> anyhow::Result<String> {
        let RenderOptions {
            context,
            args,
            kwargs,
            slots,
            escape_slots_content,
            render_type,
            render_dependencies: aggregate,
            request,
        } = options;

        let schema = self.class.schema();
        if let Some(schema) = schema {
            schema.validate_inputs(self.name(), &args, &kwargs, slots.keys())?;
        }

        let slots = normalize_slot_fills(slots, escape_slots_content);

        // Existing contexts are reused as-is so scopes applied by the caller stay visible.
        let context = match context {
            Some(ContextInput::Existing(context)) => context,
            Some(ContextInput::Data(data)) => new_context(data, request),
            None => new_context(Map::new(), request),
        };

        // Inherit the enclosing block state so nested renders know they sit inside an
        // `{% extends %}` block.
        let in_block = context.in_block();
        let _block_state = context.push_state(BLOCK_CONTEXT_KEY, Value::Bool(in_block));

        let _frame = self.push_frame(RenderFrame {
            input: ComponentInput {
                context: context.clone(),
                args: args.clone(),
                kwargs: kwargs.clone(),
                slots: slots.clone(),
                render_type,
                render_dependencies: aggregate,
            },
            is_filled: None,
        });

        let hooks = self.class.hooks();
        let context_data = hooks.get_context_data(self, &args, &kwargs)?;
        if let Some(schema) = schema {
            schema.validate_data(self.name(), &context_data)?;
        }

        for kind in [ScriptKind::Js, ScriptKind::Css] {
            if let Some(content) = self.class.inlined(kind) {
                cache_inlined(self.env.cache().as_ref(), &self.class, kind, content);
            }
        }

        let mut template = self.resolve_template(&context)?;
        template.set_nested_in_extends(in_block);

        let is_filled: BTreeMap<String, bool> = slots.keys().map(|name| (is_filled_key(name), true)).collect();
        if let Some(frame) = self.frames().last_mut() {
            frame.is_filled = Some(is_filled.clone());
        }

        let rendered_slots = self.render_slots(&slots, &context)?;
        let scoped = self.scoped_data(context_data, is_filled, rendered_slots);
        let _scope = context.update(scoped);

        hooks.on_render_before(self, &context, &mut template)?;
        let mut html = template.render(&context)?;
        if let Some(replacement) = hooks.on_render_after(self, &context, &template, &html)? {
            html = replacement;
        }

        let html = embed_marker(self.env.registry(), &self.class, &self.component_id, &html);
        if aggregate {
            return Ok(render_dependencies(&self.env, html, render_type)?);
        }
        Ok(html)
    }

    fn render_slots(
        &self,
        slots: &BTreeMap<String, Slot>,
        context: &RenderContext,
    ) -> anyhow::Result<Map<String, Value>> {
        // Fills belong to the template that passed them, so they see the outer context.
        let fill_context = self.outer_context.as_ref().unwrap_or(context);
        let mut rendered = Map::new();
        for (name, slot) in slots {
            let slot_ref = SlotRef {
                name: name.clone(),
                component: self.name().to_string(),
            };
            let html = slot.render(fill_context, &Map::new(), &slot_ref)?;
            rendered.insert(name.clone(), Value::String(html));
        }
        Ok(rendered)
    }

    fn scoped_data(
        &self,
        context_data: Map<String, Value>,
        is_filled: BTreeMap<String, bool>,
        rendered_slots: Map<String, Value>,
    ) -> Map<String, Value> {
        let mut scoped = context_data;

        let is_filled: Map<String, Value> =
            is_filled.into_iter().map(|(name, filled)| (name, Value::Bool(filled))).collect();
        let mut component_vars = Map::new();
        component_vars.insert("is_filled".to_string(), Value::Object(is_filled));
        scoped.insert(COMPONENT_VARS_KEY.to_string(), Value::Object(component_vars));
        scoped.insert(SLOTS_KEY.to_string(), Value::Object(rendered_slots));

        scoped.insert(COMPONENT_NAME_CONTEXT_KEY.to_string(), Value::String(self.name().to_string()));
        if let Some(outer) = &self.outer_context {
            scoped.insert(ROOT_CTX_CONTEXT_KEY.to_string(), Value::Object(outer.flatten()));
        }
        scoped
    }

    /// Pick the template source. Exactly one of `template_name`, `get_template_name`,
    /// `template` and `get_template` may yield a value.
    fn resolve_template(&self, context: &RenderContext) -> Result<Template, ComponentError> {
        let hooks = self.class.hooks();
        let class_name = self.class.name();

        let template_name = match self.class.template_name() {
            Some(name) => {
                if hooks.get_template_name(context).is_some() {
                    return Err(improperly_configured(format!(
                        "Received non-null value from both 'template_name' and 'get_template_name' in \
                         Component {class_name}. Only one of the two must be set."
                    )));
                }
                Some(name.to_string())
            }
            None => hooks.get_template_name(context),
        };

        let template_input = match self.class.template() {
            Some(source) => {
                if hooks.get_template(context).is_some() {
                    return Err(improperly_configured(format!(
                        "Received non-null value from both 'template' and 'get_template' in \
                         Component {class_name}. Only one of the two must be set."
                    )));
                }
                Some(TemplateInput::Source(source.to_string()))
            }
            None => hooks.get_template(context),
        };

        let templates = self.env.templates();
        match (template_name, template_input) {
            (Some(_), Some(_)) => Err(improperly_configured(format!(
                "Received both 'template_name' and 'template' in Component {class_name}. \
                 Only one of the two must be set."
            ))),
            (Some(name), None) => templates.get_template(&name),
            (None, Some(TemplateInput::Source(source))) => templates.cached_template(&source),
            (None, Some(TemplateInput::Compiled(template))) => Ok(template),
            (None, None) => Err(improperly_configured(format!(
                "Either 'template_name' or 'template' must be set for Component {class_name}."
            ))),
        }
    }
}

fn new_context(data: Map<String, Value>, request: Option<Request>) -> RenderContext {
    match request {
        Some(request) => RenderContext::with_request(data, request),
        None => RenderContext::from_map(data),
    }
}

fn improperly_configured(message: String) -> ComponentError {
    ComponentError::ImproperlyConfigured { message }
}
