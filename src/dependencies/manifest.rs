//! The JSON data block consumed by the client-side dependency manager.
//!
//! ```html
//! <script type="application/json" data-djc>{"loadedCssUrls": [...], ...}</script>
//! ```
//!
//! Every entry is base64-encoded so that URLs and whole tags can travel inside a
//! `<script>` element without terminating it.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;

/// Assets the client should consider loaded, and assets it should load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyManifest {
    /// CSS URLs already present in the page.
    pub loaded_css_urls: Vec<String>,
    /// JS URLs already present in the page.
    pub loaded_js_urls: Vec<String>,
    /// `<link>` tags to insert if not yet loaded.
    pub to_load_css_tags: Vec<String>,
    /// `<script>` tags to insert if not yet loaded.
    pub to_load_js_tags: Vec<String>,
}

impl DependencyManifest {
    /// Whether all four sets are empty.
    pub fn is_empty(&self) -> bool {
        self.loaded_css_urls.is_empty()
            && self.loaded_js_urls.is_empty()
            && self.to_load_css_tags.is_empty()
            && self.to_load_js_tags.is_empty()
    }

    /// Copy with every entry base64-encoded.
    fn encoded(&self) -> Self {
        let encode = |items: &[String]| items.iter().map(|item| STANDARD.encode(item)).collect();
        Self {
            loaded_css_urls: encode(&self.loaded_css_urls),
            loaded_js_urls: encode(&self.loaded_js_urls),
            to_load_css_tags: encode(&self.to_load_css_tags),
            to_load_js_tags: encode(&self.to_load_js_tags),
        }
    }

    /// Render the `<script type="application/json" data-djc>` block.
    ///
    /// Returns `None` when there is nothing to tell the client.
    pub fn to_script(&self) -> Result<Option<String>, serde_json::Error> {
        if self.is_empty() {
            return Ok(None);
        }
        let json = serde_json::to_string(&self.encoded())?;
        Ok(Some(format!(r#"<script type="application/json" data-djc>{json}</script>"#)))
    }
}
