//! tera-components - reusable template components for Tera
//!
//! Components bundle a template with inlined JS/CSS and external media. Rendering a
//! component tree produces HTML in which every component output is prefixed with a
//! marker comment; a single aggregation pass then collects the JS and CSS of every
//! marked component and inserts it into the page exactly once.
//!
//! # Architecture Overview
//!
//! - A [`ComponentClass`] is an immutable definition, identified by an opaque class hash
//! - A [`Component`] is one render of a class, with its own stack of render frames
//! - A [`RenderContext`] is the layered variable scope shared along a render tree
//! - [`render_dependencies`] turns marked HTML into HTML with its assets in place
//! - [`CacheEndpoint`] serves inlined assets by URL for fragments loaded on the client
//! - [`DependencyMiddleware`] runs aggregation once per outgoing HTML response
//! - [`ComponentView`] serves a component as an HTTP view, one handler hook per method
//!
//! # Core Modules
//!
//! - [`component`] - Component classes, instances, contexts, slots, media and validation
//! - [`dependencies`] - Markers, the class registry, the asset cache and aggregation
//! - [`templating`] - The shared Tera instance with named and inline templates
//! - [`http`] - Framework-neutral request/response types, endpoint, middleware and views
//! - [`manifest`] - Components declared in TOML
//! - [`config`] - `components.toml` settings
//! - [`core`] - Error types and user-facing error formatting
//! - [`cli`] - The `tcomp` command-line interface
//!
//! # Rendering Modes
//!
//! - **Document**: inlined JS/CSS become `<script>`/`<style>` tags placed at the
//!   placeholders, or at the end of `<head>` and `<body>`
//! - **Fragment**: nothing is inlined; a JSON manifest tells the client-side dependency
//!   manager which URLs to load
//!
//! # Example
//!
//! ```rust,no_run
//! use tera_components::{ComponentClass, ComponentEnv, RenderOptions, RenderType};
//!
//! # fn example() -> anyhow::Result<()> {
//! let env = ComponentEnv::default();
//! let card = ComponentClass::builder("Card", "app.components.Card")
//!     .template("<div class=\"card\">{{ slots.body | safe }}</div>")
//!     .js("console.log('card');")
//!     .build();
//!
//! let fragment = card.render(
//!     &env,
//!     RenderOptions::new().slot("body", "Hello").render_type(RenderType::Fragment),
//! )?;
//! assert!(fragment.contains("data-djc"));
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod component;
pub mod config;
pub mod constants;
pub mod core;
pub mod dependencies;
pub mod http;
pub mod manifest;
pub mod templating;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use component::{Component, ComponentClass, ComponentEnv, RenderContext, RenderOptions, SlotContent};
pub use config::ComponentsConfig;
pub use core::{ComponentError, RenderError};
pub use dependencies::{RenderType, SafeHtml, render_dependencies};
pub use http::{CacheEndpoint, ComponentView, DependencyMiddleware, Request, Response};
