//! Host template engine integration (Tera).
//!
//! Components never parse templates themselves. They ask the [`TemplateEngine`] for a
//! [`Template`] handle, either by name (files loaded from `template_dirs`) or from an
//! inline source string, and render it against a
//! [`RenderContext`](crate::component::RenderContext).
//!
//! Inline sources are compiled once and reused, keyed by a digest of the source.
//!
//! # Template Variables
//!
//! Besides the component's context data, every component template sees:
//! - `component_vars.is_filled.<slot>`: whether a fill was passed for the slot
//! - `slots.<slot>`: the rendered fill. Fills are already escaped, so output them with
//!   `{{ slots.body | safe }}`.
//! - `request.method` / `request.path` when the context is bound to a request
//!
//! # Examples
//!
//! ```rust,no_run
//! use tera_components::templating::TemplateEngine;
//! use tera_components::component::RenderContext;
//!
//! # fn example() -> anyhow::Result<()> {
//! let engine = std::sync::Arc::new(TemplateEngine::empty(true));
//! let template = engine.cached_template("<p>{{ name }}</p>")?;
//!
//! let context = RenderContext::new();
//! context.insert("name", "Ada");
//! assert_eq!(template.render(&context)?, "<p>Ada</p>");
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;

pub use engine::{Template, TemplateEngine, TemplateInput};
pub use error::format_tera_error;
