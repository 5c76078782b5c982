//! Test utilities for tera-components
//!
//! Helpers shared by unit tests and the integration suite: logging setup, a sample
//! component manifest and small component classes covering the common shapes
//! (plain, with inlined assets, with external media).
//!
//! # Example
//!
//! ```rust,no_run
//! use tera_components::test_utils::{document, init_test_logging, styled_component};
//! use tera_components::{ComponentEnv, RenderOptions};
//!
//! init_test_logging(None);
//! let env = ComponentEnv::default();
//! let card = styled_component("Card", "<div>card</div>");
//! let html = card.render(&env, RenderOptions::new()).unwrap();
//! ```

use serde_json::{Map, Value};
use std::sync::{Arc, Once};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::component::{ComponentClass, ComponentEnv, MediaItem};
use crate::config::{ComponentsConfig, ContextBehavior};

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise `RUST_LOG`;
/// with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=tera_components=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// Manifest with a card (inlined JS/CSS, external media, required `title`) and a
/// plain badge.
pub fn sample_manifest() -> &'static str {
    r#"
[components.card]
import_path = "tests.components.Card"
template = "<div class=\"card\">{{ title }}</div>"
js = "console.log('card');"
css = ".card { padding: 1rem; }"

[components.card.media]
js = ["card/extra.js"]
css = ["card/extra.css"]

[components.card.kwargs]
required = ["title"]

[components.badge]
import_path = "tests.components.Badge"
template = "<span class=\"badge\">{{ label | default(value='new') }}</span>"
"#
}

/// Wrap `body` in a minimal HTML document with `<head>` and `<body>`.
pub fn document(body: &str) -> String {
    format!("<!DOCTYPE html><html><head><title>t</title></head><body>{body}</body></html>")
}

/// Environment with the given context behavior and default everything else.
pub fn env_with_behavior(behavior: ContextBehavior) -> ComponentEnv {
    let config = ComponentsConfig {
        context_behavior: behavior,
        template_dirs: Vec::new(),
        ..ComponentsConfig::default()
    };
    ComponentEnv::with_services(
        Arc::new(crate::dependencies::InMemoryMediaCache::new()),
        Arc::new(crate::dependencies::ClassRegistry::new()),
        Arc::new(crate::templating::TemplateEngine::empty(config.autoescape)),
        Arc::new(config),
    )
}

/// Component whose template is `template` and whose context data are its kwargs.
pub fn plain_component(name: &str, template: &str) -> Arc<ComponentClass> {
    ComponentClass::builder(name, format!("tests.components.{name}"))
        .template(template)
        .context_data(kwargs_as_data)
        .build()
}

/// Like [`plain_component`], with inlined JS and CSS named after the component.
pub fn styled_component(name: &str, template: &str) -> Arc<ComponentClass> {
    ComponentClass::builder(name, format!("tests.components.{name}"))
        .template(template)
        .js(format!("console.log('{name}');"))
        .css(format!(".{} {{ display: block; }}", name.to_lowercase()))
        .context_data(kwargs_as_data)
        .build()
}

/// Like [`plain_component`], with one external script and stylesheet.
pub fn media_component(name: &str, template: &str, js: &str, css: &str) -> Arc<ComponentClass> {
    ComponentClass::builder(name, format!("tests.components.{name}"))
        .template(template)
        .media_js(MediaItem::parse(js))
        .media_css(MediaItem::parse(css))
        .context_data(kwargs_as_data)
        .build()
}

fn kwargs_as_data(
    _component: &crate::component::Component,
    _args: &[Value],
    kwargs: &Map<String, Value>,
) -> anyhow::Result<Map<String, Value>> {
    Ok(kwargs.clone())
}
