//! JS/CSS dependency management for rendered components.
//!
//! Components render independently and nest arbitrarily, yet each component class must
//! contribute its scripts and styles to the final response exactly once, in a stable
//! order. No renderer holds a global view of the page while it is being assembled, so
//! the information travels inside the HTML itself:
//!
//! 1. **Cache** ([`cache`]) - when a class renders for the first time, its inlined JS/CSS
//!    is stored under a key derived from the class hash, so it can later be served by URL.
//! 2. **Mark** ([`marker`]) - every rendered fragment is prefixed with
//!    `<!-- _RENDERED {class_hash},{component_id} -->`, and the class is registered in the
//!    weak [`registry`].
//! 3. **Aggregate** ([`aggregate`]) - once, at the outermost render (or in the response
//!    middleware), the whole document is scanned for markers, markers are stripped, and
//!    deduplicated asset tags are inserted at placeholders or default locations. Fragments
//!    get a JSON manifest that a client-side manager uses to lazily load what is missing.
//!
//! # Example
//!
//! ```rust,no_run
//! use tera_components::{ComponentClass, ComponentEnv, RenderOptions};
//!
//! # fn example() -> anyhow::Result<()> {
//! let env = ComponentEnv::default();
//! let button = ComponentClass::builder("Button", "app.components.Button")
//!     .template("<button>{{ label }}</button>")
//!     .js("console.log('button');")
//!     .build();
//!
//! let html = button.render(&env, RenderOptions::new())?;
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod cache;
pub mod html;
pub mod manifest;
pub mod marker;
pub mod registry;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::ComponentError;

pub use aggregate::{DependencyContent, SafeHtml, render_dependencies};
pub use cache::{InMemoryMediaCache, MediaCache, cache_inlined, cache_key};
pub use marker::{embed_marker, extract_markers};
pub use registry::ClassRegistry;

/// How aggregated dependencies are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RenderType {
    /// Full page: assets are placed directly into the HTML.
    #[default]
    Document,
    /// Partial update: assets are listed in a manifest for the client to load lazily.
    Fragment,
}

impl RenderType {
    /// The wire name (`document` or `fragment`).
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Fragment => "fragment",
        }
    }
}

impl fmt::Display for RenderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderType {
    type Err = ComponentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "document" => Ok(Self::Document),
            "fragment" => Ok(Self::Fragment),
            other => Err(ComponentError::InvalidRenderType {
                value: other.to_string(),
            }),
        }
    }
}

/// Kind of component asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptKind {
    /// JavaScript
    Js,
    /// CSS
    Css,
}

impl ScriptKind {
    /// File extension and cache-key segment.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Js => "js",
            Self::Css => "css",
        }
    }

    /// `Content-Type` used when serving cached content.
    pub const fn content_type(&self) -> &'static str {
        match self {
            Self::Js => "text/javascript",
            Self::Css => "text/css",
        }
    }

    /// Attribute carrying the URL in a media tag.
    pub const fn url_attribute(&self) -> &'static str {
        match self {
            Self::Js => "src",
            Self::Css => "href",
        }
    }

    /// Tag wrapping inlined content.
    pub const fn inline_tag(&self) -> &'static str {
        match self {
            Self::Js => "script",
            Self::Css => "style",
        }
    }

    /// Parse an extension, returning `None` for anything but `js`/`css`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "js" => Some(Self::Js),
            "css" => Some(Self::Css),
            _ => None,
        }
    }
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
