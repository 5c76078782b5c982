//! Slot fills passed to a component.
//!
//! Escaped fills go through [`tera::escape_html`], which also escapes `/` (as `&#x2F;`)
//! on top of `& < > " '`. The result is safe in text and attribute positions alike, but
//! differs byte-wise from escapers that leave `/` alone.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::context::RenderContext;

/// Identifies the slot a fill is rendered for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRef {
    /// Slot name.
    pub name: String,
    /// Name of the component that owns the slot.
    pub component: String,
}

/// Signature of a dynamic slot fill: `(outer_context, slot_kwargs, slot_ref) -> html`.
pub type SlotFn =
    Arc<dyn Fn(&RenderContext, &Map<String, Value>, &SlotRef) -> anyhow::Result<String> + Send + Sync>;

/// Content supplied for a slot.
#[derive(Clone)]
pub enum SlotContent {
    /// Fixed text.
    Static(String),
    /// Computed on each render.
    Func(SlotFn),
}

impl SlotContent {
    /// Wrap a closure as a dynamic fill.
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&RenderContext, &Map<String, Value>, &SlotRef) -> anyhow::Result<String>
            + Send
            + Sync
            + 'static,
    {
        Self::Func(Arc::new(f))
    }
}

impl fmt::Debug for SlotContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(text) => f.debug_tuple("Static").field(text).finish(),
            Self::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl From<&str> for SlotContent {
    fn from(text: &str) -> Self {
        Self::Static(text.to_string())
    }
}

impl From<String> for SlotContent {
    fn from(text: String) -> Self {
        Self::Static(text)
    }
}

/// A normalized fill: content plus the escaping decision made at render time.
#[derive(Debug, Clone)]
pub struct Slot {
    content: SlotContent,
    escape: bool,
}

impl Slot {
    /// Normalize `content`, escaping its output unless `escape` is false.
    pub fn new(content: SlotContent, escape: bool) -> Self {
        Self { content, escape }
    }

    /// Whether the output is HTML-escaped.
    pub fn escapes(&self) -> bool {
        self.escape
    }

    /// Render the fill.
    pub fn render(
        &self,
        context: &RenderContext,
        slot_kwargs: &Map<String, Value>,
        slot_ref: &SlotRef,
    ) -> anyhow::Result<String> {
        let content = match &self.content {
            SlotContent::Static(text) => text.clone(),
            SlotContent::Func(f) => f(context, slot_kwargs, slot_ref)?,
        };
        Ok(if self.escape {
            tera::escape_html(&content)
        } else {
            content
        })
    }
}

/// Wrap every fill into a [`Slot`].
pub fn normalize_slot_fills(
    fills: BTreeMap<String, SlotContent>,
    escape: bool,
) -> BTreeMap<String, Slot> {
    fills.into_iter().map(|(name, content)| (name, Slot::new(content, escape))).collect()
}

/// Key under which a slot appears in `component_vars.is_filled`.
///
/// Characters other than letters, digits and `_` become `_`, so names like `header-main`
/// are reachable as `is_filled.header_main`.
pub fn is_filled_key(slot_name: &str) -> String {
    slot_name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
