//! Externally referenced JS/CSS files of a component.

use serde::{Deserialize, Serialize};

use crate::config::ComponentsConfig;

/// One media entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaItem {
    /// File path or URL. Relative paths are resolved against `static_url`.
    Path(String),
    /// A complete `<script>`/`<link>` tag, used as-is.
    Tag(String),
}

impl MediaItem {
    /// Parse a manifest entry: strings starting with `<` are tags, anything else a path.
    pub fn parse(entry: &str) -> Self {
        if entry.trim_start().starts_with('<') {
            Self::Tag(entry.trim().to_string())
        } else {
            Self::Path(entry.trim().to_string())
        }
    }
}

impl From<&str> for MediaItem {
    fn from(entry: &str) -> Self {
        Self::parse(entry)
    }
}

/// JS and CSS media declared by a component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    /// Scripts, in execution order.
    #[serde(default)]
    pub js: Vec<MediaItem>,
    /// Stylesheets, in cascade order.
    #[serde(default)]
    pub css: Vec<MediaItem>,
}

impl Media {
    /// Media from plain URL lists.
    pub fn from_urls(js: &[String], css: &[String]) -> Self {
        Self {
            js: js.iter().cloned().map(MediaItem::Path).collect(),
            css: css.iter().cloned().map(MediaItem::Path).collect(),
        }
    }

    /// Whether nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.js.is_empty() && self.css.is_empty()
    }

    /// `<script>` tags for all JS entries.
    ///
    /// Paths are resolved against the configured `static_url`; tags pass through unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tera_components::component::{Media, MediaItem};
    /// use tera_components::ComponentsConfig;
    ///
    /// let media = Media {
    ///     js: vec![MediaItem::parse("charts/chart.js"), MediaItem::parse("<script src=\"https://cdn.example.com/x.js\"></script>")],
    ///     css: Vec::new(),
    /// };
    /// assert_eq!(
    ///     media.render_js(&ComponentsConfig::default()),
    ///     [
    ///         r#"<script src="/static/charts/chart.js"></script>"#,
    ///         r#"<script src="https://cdn.example.com/x.js"></script>"#,
    ///     ]
    /// );
    /// ```
    pub fn render_js(&self, config: &ComponentsConfig) -> Vec<String> {
        self.js
            .iter()
            .map(|item| match item {
                MediaItem::Path(path) => {
                    format!(r#"<script src="{}"></script>"#, attr_escape(&config.static_path(path)))
                }
                MediaItem::Tag(tag) => tag.clone(),
            })
            .collect()
    }

    /// `<link>` tags for all CSS entries, resolved like [`Media::render_js`].
    pub fn render_css(&self, config: &ComponentsConfig) -> Vec<String> {
        self.css
            .iter()
            .map(|item| match item {
                MediaItem::Path(path) => format!(
                    r#"<link href="{}" media="all" rel="stylesheet">"#,
                    attr_escape(&config.static_path(path))
                ),
                MediaItem::Tag(tag) => tag.clone(),
            })
            .collect()
    }
}

fn attr_escape(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
