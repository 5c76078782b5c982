//! Shared Tera instance with named and inline templates.

use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tera::Tera;
use walkdir::WalkDir;

use super::error::format_tera_error;
use crate::component::RenderContext;
use crate::core::ComponentError;

/// A template source as returned by a component's template provider.
#[derive(Debug, Clone)]
pub enum TemplateInput {
    /// Template text, compiled (once) on use.
    Source(String),
    /// An already resolved template.
    Compiled(Template),
}

impl From<&str> for TemplateInput {
    fn from(source: &str) -> Self {
        Self::Source(source.to_string())
    }
}

impl From<String> for TemplateInput {
    fn from(source: String) -> Self {
        Self::Source(source)
    }
}

impl From<Template> for TemplateInput {
    fn from(template: Template) -> Self {
        Self::Compiled(template)
    }
}

/// The template engine service.
///
/// Wraps one [`Tera`] instance behind a lock: renders take the read side, registering
/// a new inline template takes the write side once per distinct source.
pub struct TemplateEngine {
    tera: RwLock<Tera>,
}

impl std::fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEngine").field("templates", &self.template_names()).finish()
    }
}

impl TemplateEngine {
    /// Engine without any named templates.
    pub fn empty(autoescape: bool) -> Self {
        let mut tera = Tera::default();
        if !autoescape {
            tera.autoescape_on(Vec::new());
        }
        Self {
            tera: RwLock::new(tera),
        }
    }

    /// Engine with every file under `dirs` registered by its relative path.
    ///
    /// Directories that do not exist are skipped. When two directories contain the same
    /// relative path, the earlier directory wins.
    pub fn from_dirs(dirs: &[PathBuf], autoescape: bool) -> Result<Self, ComponentError> {
        let engine = Self::empty(autoescape);
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for dir in dirs {
            if !dir.is_dir() {
                tracing::debug!("Template directory {} does not exist, skipping", dir.display());
                continue;
            }
            for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
                let entry = entry.map_err(|e| ComponentError::TemplateError {
                    message: format!("Failed to read template directory {}: {e}", dir.display()),
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let name = template_name_for(dir, entry.path());
                if seen.insert(name.clone()) {
                    files.push((entry.path().to_path_buf(), Some(name)));
                }
            }
        }

        tracing::debug!("Loading {} named templates", files.len());
        engine.write().add_template_files(files).map_err(|e| ComponentError::TemplateError {
            message: format_tera_error(&e),
        })?;
        Ok(engine)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Tera> {
        self.tera.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Tera> {
        self.tera.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a named template from a string.
    pub fn add_template(&self, name: &str, source: &str) -> Result<(), ComponentError> {
        self.write().add_raw_template(name, source).map_err(|e| ComponentError::TemplateError {
            message: format_tera_error(&e),
        })
    }

    /// Whether a template with this name is registered.
    pub fn has_template(&self, name: &str) -> bool {
        self.read().get_template_names().any(|registered| registered == name)
    }

    /// Names of all registered templates, sorted.
    pub fn template_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().get_template_names().map(str::to_string).collect();
        names.sort();
        names
    }

    /// Handle to a named template.
    pub fn get_template(self: &Arc<Self>, name: &str) -> Result<Template, ComponentError> {
        if !self.has_template(name) {
            return Err(ComponentError::TemplateNotFound {
                name: name.to_string(),
            });
        }
        Ok(Template::new(Arc::clone(self), name.to_string()))
    }

    /// Handle to an inline template, compiling `source` on first use.
    pub fn cached_template(self: &Arc<Self>, source: &str) -> Result<Template, ComponentError> {
        let name = inline_template_name(source);
        if !self.has_template(&name) {
            self.add_template(&name, source)?;
            tracing::debug!("Compiled inline template {}", name);
        }
        Ok(Template::new(Arc::clone(self), name))
    }

    fn render(&self, name: &str, context: &tera::Context) -> Result<String, ComponentError> {
        self.read().render(name, context).map_err(|e| ComponentError::TemplateError {
            message: format_tera_error(&e),
        })
    }
}

fn template_name_for(dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(dir).unwrap_or(path);
    relative
        .components()
        .map(|part| part.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn inline_template_name(source: &str) -> String {
    let digest = hex::encode(Sha256::digest(source.as_bytes()));
    format!("__inline_{}.html", &digest[..16])
}

/// A resolved template that components render.
#[derive(Clone)]
pub struct Template {
    engine: Arc<TemplateEngine>,
    name: String,
    nested_in_extends: bool,
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("nested_in_extends", &self.nested_in_extends)
            .finish()
    }
}

impl Template {
    fn new(engine: Arc<TemplateEngine>, name: String) -> Self {
        Self {
            engine,
            name,
            nested_in_extends: false,
        }
    }

    /// Registered name (`__inline_*` for inline sources).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this template renders inside an `{% extends %}` chain.
    pub fn nested_in_extends(&self) -> bool {
        self.nested_in_extends
    }

    /// Mark the template as rendering inside an `{% extends %}` chain.
    ///
    /// Components set this from [`RenderContext::in_block`] right after resolving their
    /// template, so `on_render_before` hooks can tell whether the component sits inside
    /// an extends chain.
    pub fn set_nested_in_extends(&mut self, nested: bool) {
        self.nested_in_extends = nested;
    }

    /// Render against the current scope of `context`.
    pub fn render(&self, context: &RenderContext) -> Result<String, ComponentError> {
        self.engine.render(&self.name, &context.to_tera())
    }
}
