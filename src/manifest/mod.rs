//! Declarative component definitions.
//!
//! A component manifest describes components without writing Rust. Manifest components
//! expose their keyword arguments as template variables.
//!
//! # File Format
//!
//! ```toml
//! [components.card]
//! import_path = "app.components.Card"
//! template = "<div class=\"card\">{{ title }}</div>"
//! js = "console.log('card');"
//! css = ".card { padding: 1rem; }"
//!
//! [components.card.media]
//! js = ["card/extra.js"]
//! css = ["<link href=\"/print.css\" media=\"print\" rel=\"stylesheet\">"]
//!
//! [components.card.kwargs]
//! required = ["title"]
//!
//! [components.page]
//! template_name = "page.html"
//! ```
//!
//! Media entries starting with `<` are used as complete tags; anything else is a path.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;

use crate::component::{
    Component, ComponentClass, ComponentEnv, ComponentHooks, ComponentSchema, MapSchema, Media, MediaItem,
    ValueKind,
};
use crate::core::ComponentError;
use crate::dependencies::{ScriptKind, cache_inlined};

/// Parsed component manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentManifest {
    /// Components by name.
    #[serde(default)]
    pub components: BTreeMap<String, ComponentSpec>,
}

/// One `[components.<name>]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSpec {
    /// Class identity. Defaults to `manifest.<name>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_path: Option<String>,
    /// Named template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
    /// Inline template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Inlined JS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub js: Option<String>,
    /// Inlined CSS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
    /// External media.
    #[serde(default)]
    pub media: MediaSpec,
    /// Keyword argument requirements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kwargs: Option<KwargsSpec>,
}

/// `[components.<name>.media]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSpec {
    /// Script paths or tags.
    #[serde(default)]
    pub js: Vec<String>,
    /// Stylesheet paths or tags.
    #[serde(default)]
    pub css: Vec<String>,
}

/// `[components.<name>.kwargs]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KwargsSpec {
    /// Keys that must be passed.
    #[serde(default)]
    pub required: Vec<String>,
    /// Whether other keys are accepted.
    #[serde(default = "default_allow_extra")]
    pub allow_extra: bool,
}

fn default_allow_extra() -> bool {
    true
}

/// Hooks of manifest components: keyword arguments become the context data.
struct KwargsAsData;

impl ComponentHooks for KwargsAsData {
    fn get_context_data(
        &self,
        _component: &Component,
        _args: &[Value],
        kwargs: &Map<String, Value>,
    ) -> anyhow::Result<Map<String, Value>> {
        Ok(kwargs.clone())
    }
}

impl ComponentManifest {
    /// Parse a manifest from TOML.
    pub fn from_toml(content: &str) -> Result<Self> {
        let manifest: Self = toml::from_str(content).context("Failed to parse component manifest")?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Load a manifest file.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read component manifest {}", path.display()))?;
        let manifest = Self::from_toml(&content)
            .with_context(|| format!("Invalid component manifest {}", path.display()))?;
        tracing::debug!("Loaded {} components from {}", manifest.components.len(), path.display());
        Ok(manifest)
    }

    /// Check component names.
    ///
    /// Names end up in class hashes and markers, so they are limited to letters,
    /// digits, `_`, `-` and `.`.
    pub fn validate(&self) -> Result<(), ComponentError> {
        for name in self.components.keys() {
            let valid = !name.is_empty()
                && name.chars().all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'));
            if !valid {
                return Err(ComponentError::ConfigError {
                    message: format!(
                        "Invalid component name '{name}': use letters, digits, '_', '-' or '.'"
                    ),
                });
            }
        }
        Ok(())
    }

    /// Build the component classes.
    pub fn build(&self) -> BTreeMap<String, Arc<ComponentClass>> {
        self.components
            .iter()
            .map(|(name, spec)| (name.clone(), spec.build(name)))
            .collect()
    }

    /// Build the classes, register them and cache their inlined assets, so markers
    /// they produced elsewhere can be aggregated.
    ///
    /// The registry only holds weak references: keep the returned map alive for as
    /// long as the classes must resolve.
    pub fn register(&self, env: &ComponentEnv) -> BTreeMap<String, Arc<ComponentClass>> {
        let classes = self.build();
        for class in classes.values() {
            env.registry().register(class);
            for kind in [ScriptKind::Js, ScriptKind::Css] {
                if let Some(content) = class.inlined(kind) {
                    cache_inlined(env.cache().as_ref(), class, kind, content);
                }
            }
        }
        classes
    }
}

impl ComponentSpec {
    fn build(&self, name: &str) -> Arc<ComponentClass> {
        let import_path = self.import_path.clone().unwrap_or_else(|| format!("manifest.{name}"));
        let mut builder = ComponentClass::builder(name, import_path)
            .media(Media {
                js: self.media.js.iter().map(|entry| MediaItem::parse(entry)).collect(),
                css: self.media.css.iter().map(|entry| MediaItem::parse(entry)).collect(),
            })
            .hooks(KwargsAsData);

        if let Some(template_name) = &self.template_name {
            builder = builder.template_name(template_name);
        }
        if let Some(template) = &self.template {
            builder = builder.template(template);
        }
        if let Some(js) = &self.js {
            builder = builder.js(js);
        }
        if let Some(css) = &self.css {
            builder = builder.css(css);
        }
        if let Some(kwargs) = &self.kwargs {
            let mut schema = kwargs
                .required
                .iter()
                .fold(MapSchema::new(), |schema, key| schema.required(key, ValueKind::Any));
            if kwargs.allow_extra {
                schema = schema.allow_extra();
            }
            builder = builder.schema(ComponentSchema::default().with_kwargs(schema));
        }

        builder.build()
    }
}
