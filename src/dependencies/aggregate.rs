//! The aggregation pass: markers in, deduplicated asset tags out.
//!
//! [`render_dependencies`] runs once over a fully assembled response. It strips every
//! component marker, resolves the classes that rendered, and writes their assets into the
//! document. The function reads the cache and registry but never writes to them, so it
//! can run concurrently for independent responses.

use std::collections::HashMap;
use std::fmt;

use super::cache::get_cached;
use super::html::{self, Location};
use super::manifest::DependencyManifest;
use super::marker::{extract_markers, unique_class_hashes};
use super::{RenderType, ScriptKind};
use crate::component::{ComponentClass, ComponentEnv, Media};
use crate::constants::{CSS_DEPENDENCY_PLACEHOLDER, JS_DEPENDENCY_PLACEHOLDER};
use crate::core::ComponentError;

/// HTML that is already escaped and must not be escaped again.
///
/// Passing a `SafeHtml` through [`render_dependencies`] returns a `SafeHtml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SafeHtml(String);

impl SafeHtml {
    /// Mark `html` as safe.
    pub fn new(html: impl Into<String>) -> Self {
        Self(html.into())
    }

    /// Borrow the HTML.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unwrap into the HTML string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SafeHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SafeHtml {
    fn from(html: String) -> Self {
        Self(html)
    }
}

/// Content the aggregator accepts. Output is converted back into the input type.
pub trait DependencyContent: Sized {
    /// Raw bytes to scan.
    fn into_dependency_bytes(self) -> Vec<u8>;

    /// Rebuild the original type from processed bytes.
    fn from_dependency_bytes(bytes: Vec<u8>) -> Result<Self, ComponentError>;
}

impl DependencyContent for Vec<u8> {
    fn into_dependency_bytes(self) -> Vec<u8> {
        self
    }

    fn from_dependency_bytes(bytes: Vec<u8>) -> Result<Self, ComponentError> {
        Ok(bytes)
    }
}

impl DependencyContent for String {
    fn into_dependency_bytes(self) -> Vec<u8> {
        self.into_bytes()
    }

    fn from_dependency_bytes(bytes: Vec<u8>) -> Result<Self, ComponentError> {
        String::from_utf8(bytes).map_err(|e| ComponentError::InvalidContent {
            message: e.to_string(),
        })
    }
}

impl DependencyContent for SafeHtml {
    fn into_dependency_bytes(self) -> Vec<u8> {
        self.0.into_bytes()
    }

    fn from_dependency_bytes(bytes: Vec<u8>) -> Result<Self, ComponentError> {
        String::from_dependency_bytes(bytes).map(SafeHtml)
    }
}

/// Replace component markers in `content` with the JS and CSS of the components that
/// rendered.
///
/// - `Document`: inlined assets become `<script>`/`<style>` tags and declared media
///   become `<script src>`/`<link href>` tags. They go to the placeholders, or to the
///   end of `<head>` (CSS) and `<body>` (JS) when a placeholder is missing.
/// - `Fragment`: placeholders are removed and a JSON manifest listing everything to
///   load is appended.
///
/// # Errors
///
/// Fails on malformed markers, unknown class hashes, media tags without a URL and
/// inlined content that contains its own closing tag.
pub fn render_dependencies<C: DependencyContent>(
    env: &ComponentEnv,
    content: C,
    render_type: RenderType,
) -> Result<C, ComponentError> {
    let bytes = content.into_dependency_bytes();
    let processed = process_dep_declarations(env, &bytes, render_type)?;
    let output = insert_dependencies(processed, render_type);
    C::from_dependency_bytes(output)
}

struct ProcessedDependencies {
    content: Vec<u8>,
    js: String,
    css: String,
}

#[derive(Default)]
struct ComponentAssets {
    to_load_js_urls: Vec<String>,
    to_load_css_urls: Vec<String>,
    inlined_js_tags: Vec<String>,
    inlined_css_tags: Vec<String>,
    loaded_js_urls: Vec<String>,
    loaded_css_urls: Vec<String>,
}

fn process_dep_declarations(
    env: &ComponentEnv,
    content: &[u8],
    render_type: RenderType,
) -> Result<ProcessedDependencies, ComponentError> {
    let (content, markers) = extract_markers(content)?;
    let classes = unique_class_hashes(&markers)
        .iter()
        .map(|hash| env.registry().resolve(hash))
        .collect::<Result<Vec<_>, _>>()?;

    let assets = prepare_component_assets(env, &classes, render_type)?;
    let config = env.config();

    let mut css_tags = Vec::new();
    let mut js_tags = Vec::new();
    for class in &classes {
        css_tags.extend(class.media().render_css(config));
        js_tags.extend(class.media().render_js(config));
    }
    let component_media = Media::from_urls(&assets.to_load_js_urls, &assets.to_load_css_urls);
    css_tags.extend(component_media.render_css(config));
    js_tags.extend(component_media.render_js(config));

    // First tag per URL wins when components render the same file differently.
    let (css_tags, css_urls) = postprocess_media_tags(ScriptKind::Css, css_tags)?;
    let (js_tags, js_urls) = postprocess_media_tags(ScriptKind::Js, js_tags)?;

    let is_document = render_type == RenderType::Document;
    let mut loaded_css_urls = assets.loaded_css_urls;
    let mut loaded_js_urls = assets.loaded_js_urls;
    if is_document {
        loaded_css_urls.extend(css_urls.iter().cloned());
        loaded_js_urls.extend(js_urls.iter().cloned());
    }
    loaded_css_urls.sort();
    loaded_js_urls.sort();

    // Documents carry everything inline, so the client only needs to hear about it
    // when there are declared media files it could otherwise fetch twice.
    let manifest = if is_document && css_urls.is_empty() && js_urls.is_empty() {
        DependencyManifest::default()
    } else {
        DependencyManifest {
            loaded_css_urls,
            loaded_js_urls,
            to_load_css_tags: if is_document { Vec::new() } else { css_tags.clone() },
            to_load_js_tags: if is_document { Vec::new() } else { js_tags.clone() },
        }
    };
    let exec_script = manifest.to_script().map_err(|e| ComponentError::InvalidContent {
        message: format!("Failed to serialize dependency manifest: {e}"),
    })?;

    let core_script_tags = match (&config.dependency_manager_script, is_document) {
        (Some(script), true) => Media::from_urls(std::slice::from_ref(script), &[]).render_js(config),
        _ => Vec::new(),
    };

    let mut js = String::new();
    core_script_tags.iter().for_each(|tag| js.push_str(tag));
    if let Some(exec_script) = &exec_script {
        js.push_str(exec_script);
    }
    if is_document {
        js_tags.iter().for_each(|tag| js.push_str(tag));
    }
    assets.inlined_js_tags.iter().for_each(|tag| js.push_str(tag));

    let mut css = String::new();
    assets.inlined_css_tags.iter().for_each(|tag| css.push_str(tag));
    css_tags.iter().for_each(|tag| css.push_str(tag));

    tracing::debug!(
        "Aggregated {} component classes as {}: {} JS tags, {} CSS tags, manifest={}",
        classes.len(),
        render_type,
        js_tags.len() + assets.inlined_js_tags.len(),
        css_tags.len() + assets.inlined_css_tags.len(),
        exec_script.is_some()
    );

    Ok(ProcessedDependencies { content, js, css })
}

/// Split each class's inlined assets into inline tags (documents) or URLs to load
/// (fragments).
fn prepare_component_assets(
    env: &ComponentEnv,
    classes: &[std::sync::Arc<ComponentClass>],
    render_type: RenderType,
) -> Result<ComponentAssets, ComponentError> {
    let mut assets = ComponentAssets::default();

    for class in classes {
        for kind in [ScriptKind::Js, ScriptKind::Css] {
            let Some(script) = inlined_script(env, class, kind) else {
                continue;
            };
            let url = script_url(env, class, kind);

            match (render_type, kind) {
                (RenderType::Document, ScriptKind::Js) => {
                    assets.inlined_js_tags.push(inline_tag(class, kind, &script)?);
                    assets.loaded_js_urls.push(url);
                }
                (RenderType::Document, ScriptKind::Css) => {
                    assets.inlined_css_tags.push(inline_tag(class, kind, &script)?);
                    assets.loaded_css_urls.push(url);
                }
                (RenderType::Fragment, ScriptKind::Js) => assets.to_load_js_urls.push(url),
                (RenderType::Fragment, ScriptKind::Css) => assets.to_load_css_urls.push(url),
            }
        }
    }

    Ok(assets)
}

fn inlined_script(env: &ComponentEnv, class: &ComponentClass, kind: ScriptKind) -> Option<String> {
    let declared = class.inlined(kind)?;
    if declared.trim().is_empty() {
        return None;
    }
    get_cached(env.cache().as_ref(), class.class_hash(), kind).or_else(|| Some(declared.trim().to_string()))
}

/// URL under which the cache endpoint serves a class's inlined asset.
pub fn script_url(env: &ComponentEnv, class: &ComponentClass, kind: ScriptKind) -> String {
    format!("{}/{}.{}", env.config().cache_prefix(), class.class_hash(), kind)
}

fn inline_tag(class: &ComponentClass, kind: ScriptKind, script: &str) -> Result<String, ComponentError> {
    let tag = kind.inline_tag();
    if script.contains(&format!("</{tag}")) {
        return Err(ComponentError::ClosingTagInContent {
            component: class.name().to_string(),
            kind: kind.to_string(),
            tag: tag.to_string(),
        });
    }
    Ok(format!("<{tag}>{script}</{tag}>"))
}

/// Deduplicate tags by URL, keeping the first tag seen for each URL.
fn postprocess_media_tags(
    kind: ScriptKind,
    tags: Vec<String>,
) -> Result<(Vec<String>, Vec<String>), ComponentError> {
    let attribute = kind.url_attribute();
    let mut urls = Vec::new();
    let mut tags_by_url: HashMap<String, String> = HashMap::new();

    for tag in tags {
        let trimmed = tag.trim();
        let url = html::url_attribute(trimmed, kind)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ComponentError::MissingMediaUrl {
                kind: kind.to_string(),
                attribute: attribute.to_string(),
                tag_name: html::tag_name(trimmed),
                tag: tag.clone(),
            })?;

        if tags_by_url.contains_key(&url) {
            continue;
        }
        urls.push(url.clone());
        tags_by_url.insert(url, tag);
    }

    let tags = urls.iter().filter_map(|url| tags_by_url.remove(url)).collect();
    Ok((tags, urls))
}

fn insert_dependencies(processed: ProcessedDependencies, render_type: RenderType) -> Vec<u8> {
    let ProcessedDependencies { content, js, css } = processed;
    let is_document = render_type == RenderType::Document;

    let (css_replacement, js_replacement) = if is_document {
        (css.as_bytes(), js.as_bytes())
    } else {
        (&b""[..], &b""[..])
    };

    let (content, found_css) =
        html::replace_first_remove_rest(&content, CSS_DEPENDENCY_PLACEHOLDER.as_bytes(), css_replacement);
    let (mut content, found_js) =
        html::replace_first_remove_rest(&content, JS_DEPENDENCY_PLACEHOLDER.as_bytes(), js_replacement);

    if is_document {
        if !found_css {
            content = insert_default(content, &css, Location::HeadEnd);
        }
        if !found_js {
            content = insert_default(content, &js, Location::BodyEnd);
        }
    } else {
        content.extend_from_slice(js.as_bytes());
    }

    content
}

fn insert_default(content: Vec<u8>, insertion: &str, location: Location) -> Vec<u8> {
    if insertion.is_empty() {
        return content;
    }
    match html::insert_at(&content, insertion.as_bytes(), location) {
        Some(updated) => updated,
        None => {
            tracing::warn!(
                "No placeholder and no {} found, dependencies were not inserted",
                match location {
                    Location::HeadEnd => "</head>",
                    Location::BodyEnd => "</body>",
                }
            );
            content
        }
    }
}
