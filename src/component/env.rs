//! Services shared by components, the aggregator and the HTTP surface.

use std::sync::Arc;

use crate::config::ComponentsConfig;
use crate::core::ComponentError;
use crate::dependencies::{ClassRegistry, InMemoryMediaCache, MediaCache};
use crate::templating::TemplateEngine;

/// The process-wide services a render needs, passed explicitly.
///
/// Cloning is cheap: every service sits behind an [`Arc`], so clones share the same
/// cache, registry and template engine.
#[derive(Clone)]
pub struct ComponentEnv {
    cache: Arc<dyn MediaCache>,
    registry: Arc<ClassRegistry>,
    templates: Arc<TemplateEngine>,
    config: Arc<ComponentsConfig>,
}

impl std::fmt::Debug for ComponentEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentEnv")
            .field("registry", &self.registry)
            .field("templates", &self.templates)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for ComponentEnv {
    /// In-memory services, default configuration and no named templates.
    fn default() -> Self {
        Self::with_services(
            Arc::new(InMemoryMediaCache::new()),
            Arc::new(ClassRegistry::new()),
            Arc::new(TemplateEngine::empty(true)),
            Arc::new(ComponentsConfig::default()),
        )
    }
}

impl ComponentEnv {
    /// In-memory cache and registry, with named templates loaded from
    /// `config.template_dirs`.
    pub fn new(config: ComponentsConfig) -> Result<Self, ComponentError> {
        config.validate()?;
        let templates = TemplateEngine::from_dirs(&config.template_dirs, config.autoescape)?;
        Ok(Self::with_services(
            Arc::new(InMemoryMediaCache::new()),
            Arc::new(ClassRegistry::new()),
            Arc::new(templates),
            Arc::new(config),
        ))
    }

    /// Assemble an environment from existing services.
    pub fn with_services(
        cache: Arc<dyn MediaCache>,
        registry: Arc<ClassRegistry>,
        templates: Arc<TemplateEngine>,
        config: Arc<ComponentsConfig>,
    ) -> Self {
        Self {
            cache,
            registry,
            templates,
            config,
        }
    }

    /// Asset cache.
    pub fn cache(&self) -> &Arc<dyn MediaCache> {
        &self.cache
    }

    /// Class registry.
    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    /// Template engine.
    pub fn templates(&self) -> &Arc<TemplateEngine> {
        &self.templates
    }

    /// Settings.
    pub fn config(&self) -> &ComponentsConfig {
        &self.config
    }
}
