//! Component settings loaded from `components.toml`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::constants::{CONFIG_PATH_ENV, DEFAULT_CONFIG_FILE};
use crate::core::ComponentError;

/// How much of the enclosing context a nested component can see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContextBehavior {
    /// Nested components see the enclosing context plus their own data.
    #[default]
    Django,
    /// Nested components see only their own data and provided (injectable) values.
    Isolated,
}

fn default_true() -> bool {
    true
}

fn default_template_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("templates")]
}

fn default_static_url() -> String {
    "/static/".to_string()
}

fn default_cache_url_prefix() -> String {
    "/components/cache".to_string()
}

fn default_fragment_header() -> String {
    "HX-Request".to_string()
}

/// Settings shared by the render engine, aggregator, endpoint and middleware.
///
/// # File Format
///
/// ```toml
/// context_behavior = "isolated"
/// autoescape = true
/// template_dirs = ["templates", "components"]
/// static_url = "/static/"
/// cache_url_prefix = "/components/cache"
/// dependency_manager_script = "django_components/django_components.min.js"
/// fragment_header = "HX-Request"
/// ```
///
/// Every field is optional; missing fields take the defaults shown by
/// [`ComponentsConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentsConfig {
    /// Context visibility for nested components.
    #[serde(default)]
    pub context_behavior: ContextBehavior,

    /// Whether templates with an `.html` name are autoescaped.
    #[serde(default = "default_true")]
    pub autoescape: bool,

    /// Directories searched (recursively) for named templates.
    #[serde(default = "default_template_dirs")]
    pub template_dirs: Vec<PathBuf>,

    /// Prefix for relative media paths.
    #[serde(default = "default_static_url")]
    pub static_url: String,

    /// URL prefix of the cached-asset endpoint.
    #[serde(default = "default_cache_url_prefix")]
    pub cache_url_prefix: String,

    /// Static path of the client-side dependency manager, emitted first in documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency_manager_script: Option<String>,

    /// Request header whose value `true` marks a fragment (partial) request.
    #[serde(default = "default_fragment_header")]
    pub fragment_header: String,
}

impl Default for ComponentsConfig {
    fn default() -> Self {
        Self {
            context_behavior: ContextBehavior::default(),
            autoescape: true,
            template_dirs: default_template_dirs(),
            static_url: default_static_url(),
            cache_url_prefix: default_cache_url_prefix(),
            dependency_manager_script: None,
            fragment_header: default_fragment_header(),
        }
    }
}

impl ComponentsConfig {
    /// Resolve the configuration path.
    ///
    /// Priority: explicit path, then `TCOMP_CONFIG_PATH`, then `./components.toml`.
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }

    /// Load the configuration, falling back to defaults when the file is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, is not valid TOML,
    /// or fails [`ComponentsConfig::validate`].
    pub async fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_path(explicit);
        if path.exists() {
            Self::load_from(&path).await
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load the configuration from a specific file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read components config from {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse components config from {}", path.display()))?;
        config.validate()?;

        tracing::debug!("Loaded components config from {}", path.display());
        Ok(config)
    }

    /// Check values that would produce broken URLs.
    pub fn validate(&self) -> Result<(), ComponentError> {
        if self.cache_url_prefix.trim_end_matches('/').is_empty() {
            return Err(ComponentError::ConfigError {
                message: "'cache_url_prefix' must not be empty".into(),
            });
        }
        if !self.cache_url_prefix.starts_with('/') {
            return Err(ComponentError::ConfigError {
                message: format!(
                    "'cache_url_prefix' must start with '/', got '{}'",
                    self.cache_url_prefix
                ),
            });
        }
        if self.static_url.is_empty() {
            return Err(ComponentError::ConfigError {
                message: "'static_url' must not be empty".into(),
            });
        }
        if self.fragment_header.trim().is_empty() {
            return Err(ComponentError::ConfigError {
                message: "'fragment_header' must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Resolve a media path against `static_url`.
    ///
    /// Absolute paths and full URLs are returned unchanged.
    pub fn static_path(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") || path.starts_with('/') {
            return path.to_string();
        }
        if self.static_url.ends_with('/') {
            format!("{}{}", self.static_url, path)
        } else {
            format!("{}/{}", self.static_url, path)
        }
    }

    /// Cache prefix without a trailing slash.
    pub fn cache_prefix(&self) -> &str {
        self.cache_url_prefix.trim_end_matches('/')
    }
}
