//! Layered rendering context.
//!
//! A [`RenderContext`] is a stack of variable layers. Components push their data as a
//! new layer for the duration of their template and the layer is popped when the
//! returned [`ContextScope`] guard drops, on every exit path. Cloning a context clones
//! the handle, not the data: nested components rendering with the parent's context see
//! (and scope onto) the same stack.

use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::constants::{BLOCK_CONTEXT_KEY, INJECT_CONTEXT_KEY_PREFIX};
use crate::http::Request;

#[derive(Debug, Default)]
struct ContextInner {
    layers: Vec<Map<String, Value>>,
    request: Option<Request>,
    render_state: Vec<(String, Value)>,
}

/// Shared handle to a layered variable scope.
#[derive(Debug, Clone)]
pub struct RenderContext {
    inner: Arc<Mutex<ContextInner>>,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderContext {
    /// Empty context with a single base layer.
    pub fn new() -> Self {
        Self::from_map(Map::new())
    }

    /// Context whose base layer is `data`.
    pub fn from_map(data: Map<String, Value>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ContextInner {
                layers: vec![data],
                ..ContextInner::default()
            })),
        }
    }

    /// Context bound to the request being served. The request is exposed to templates
    /// as `request.method` and `request.path`.
    pub fn with_request(data: Map<String, Value>, request: Request) -> Self {
        let context = Self::from_map(data);
        context.lock().request = Some(request);
        context
    }

    fn lock(&self) -> MutexGuard<'_, ContextInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether both handles point at the same context.
    pub fn same_as(&self, other: &RenderContext) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Look up a variable, innermost layer first.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().layers.iter().rev().find_map(|layer| layer.get(key).cloned())
    }

    /// Whether any layer defines `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set a variable on the innermost layer.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) {
        let mut inner = self.lock();
        if inner.layers.is_empty() {
            inner.layers.push(Map::new());
        }
        if let Some(top) = inner.layers.last_mut() {
            top.insert(key.into(), value.into());
        }
    }

    /// Push `data` as a new layer until the returned guard drops.
    #[must_use = "the layer is removed as soon as the guard is dropped"]
    pub fn update(&self, data: Map<String, Value>) -> ContextScope {
        let mut inner = self.lock();
        let depth = inner.layers.len();
        inner.layers.push(data);
        ContextScope {
            context: self.clone(),
            depth,
        }
    }

    /// Publish `value` under `key` for [`Component::inject`](super::Component::inject)
    /// in components rendered while the guard is alive.
    #[must_use = "the provided value is removed as soon as the guard is dropped"]
    pub fn provide(&self, key: &str, value: impl Into<Value>) -> ContextScope {
        let mut layer = Map::new();
        layer.insert(format!("{INJECT_CONTEXT_KEY_PREFIX}{key}"), value.into());
        self.update(layer)
    }

    /// The value published by the innermost enclosing [`RenderContext::provide`].
    pub fn injected(&self, key: &str) -> Option<Value> {
        self.get(&format!("{INJECT_CONTEXT_KEY_PREFIX}{key}"))
    }

    /// Number of layers.
    pub fn depth(&self) -> usize {
        self.lock().layers.len()
    }

    /// All visible variables merged into one map, inner layers overriding outer ones.
    pub fn flatten(&self) -> Map<String, Value> {
        let inner = self.lock();
        let mut merged = Map::new();
        for layer in &inner.layers {
            for (key, value) in layer {
                merged.insert(key.clone(), value.clone());
            }
        }
        merged
    }

    /// Tera context for the current scope.
    pub fn to_tera(&self) -> tera::Context {
        let mut context = tera::Context::new();
        for (key, value) in self.flatten() {
            context.insert(key, &value);
        }
        if let Some(request) = self.request() {
            context.insert("request", &request);
        }
        context
    }

    /// A new context holding only provided values, the request binding and the render
    /// state.
    ///
    /// Used for nested components under isolated context behavior.
    pub fn isolated_copy(&self) -> RenderContext {
        let provided: Map<String, Value> = self
            .flatten()
            .into_iter()
            .filter(|(key, _)| key.starts_with(INJECT_CONTEXT_KEY_PREFIX))
            .collect();
        let copy = Self::from_map(provided);
        {
            let source = self.lock();
            let mut target = copy.lock();
            target.request = source.request.clone();
            target.render_state = source.render_state.clone();
        }
        copy
    }

    /// The bound request, if any.
    pub fn request(&self) -> Option<Request> {
        self.lock().request.clone()
    }

    /// Set render-state `key` until the returned guard drops.
    ///
    /// Render state is not visible to templates. It carries engine flags such as
    /// whether rendering happens inside an `{% extends %}` chain (see
    /// [`RenderContext::enter_block`]).
    #[must_use = "the state is removed as soon as the guard is dropped"]
    pub fn push_state(&self, key: &str, value: Value) -> StateScope {
        let mut inner = self.lock();
        let depth = inner.render_state.len();
        inner.render_state.push((key.to_string(), value));
        StateScope {
            context: self.clone(),
            depth,
        }
    }

    /// Innermost render-state value for `key`.
    pub fn render_state(&self, key: &str) -> Option<Value> {
        self.lock()
            .render_state
            .iter()
            .rev()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.clone())
    }

    /// Mark everything rendered with this context as sitting inside an `{% extends %}`
    /// block until the guard drops.
    ///
    /// Components rendered meanwhile, and their nested components, get templates with
    /// [`Template::nested_in_extends`](crate::templating::Template::nested_in_extends) set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tera_components::RenderContext;
    ///
    /// let context = RenderContext::new();
    /// {
    ///     let _block = context.enter_block();
    ///     assert!(context.in_block());
    /// }
    /// assert!(!context.in_block());
    /// ```
    #[must_use = "the block state is removed as soon as the guard is dropped"]
    pub fn enter_block(&self) -> StateScope {
        self.push_state(BLOCK_CONTEXT_KEY, Value::Bool(true))
    }

    /// Whether the innermost block state says rendering happens inside an `{% extends %}` block.
    pub fn in_block(&self) -> bool {
        self.render_state(BLOCK_CONTEXT_KEY).and_then(|value| value.as_bool()).unwrap_or(false)
    }
}

/// Guard returned by [`RenderContext::update`] and [`RenderContext::provide`].
#[derive(Debug)]
pub struct ContextScope {
    context: RenderContext,
    depth: usize,
}

impl Drop for ContextScope {
    fn drop(&mut self) {
        self.context.lock().layers.truncate(self.depth);
    }
}

/// Guard returned by [`RenderContext::push_state`].
#[derive(Debug)]
pub struct StateScope {
    context: RenderContext,
    depth: usize,
}

impl Drop for StateScope {
    fn drop(&mut self) {
        self.context.lock().render_state.truncate(self.depth);
    }
}
