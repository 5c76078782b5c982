//! Dependency aggregation over rendered component output.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use std::sync::Arc;
use tera_components::component::ComponentClass;
use tera_components::constants::{CSS_DEPENDENCY_PLACEHOLDER, JS_DEPENDENCY_PLACEHOLDER};
use tera_components::test_utils::{document, media_component, styled_component};
use tera_components::{ComponentEnv, ComponentError, RenderOptions, RenderType, SafeHtml, render_dependencies};

/// Render without aggregation so the markers stay in place.
fn marked(env: &ComponentEnv, class: &Arc<ComponentClass>) -> String {
    class.render(env, RenderOptions::new().render_dependencies(false)).unwrap()
}

/// Decode the `data-djc` block appended to a fragment.
fn decode_manifest(html: &str) -> Value {
    let start = html.find("data-djc>").expect("manifest present") + "data-djc>".len();
    let end = start + html[start..].find("</script>").unwrap();
    let mut manifest: Value = serde_json::from_str(&html[start..end]).unwrap();
    for entries in manifest.as_object_mut().unwrap().values_mut() {
        for entry in entries.as_array_mut().unwrap() {
            let decoded = STANDARD.decode(entry.as_str().unwrap()).unwrap();
            *entry = Value::String(String::from_utf8(decoded).unwrap());
        }
    }
    manifest
}

#[test]
fn test_document_inlines_and_links_media() {
    let env = ComponentEnv::default();
    let card = styled_component("Card", "<div>card</div>");
    let chart = media_component("Chart", "<canvas></canvas>", "chart.js", "chart.css");

    let body = format!("{}{}", marked(&env, &card), marked(&env, &chart));
    let html = render_dependencies(&env, document(&body), RenderType::Document).unwrap();

    let head = &html[..html.find("</head>").unwrap()];
    assert!(head.contains("<style>.card { display: block; }</style>"));
    assert!(head.contains(r#"<link href="/static/chart.css" media="all" rel="stylesheet">"#));
    assert!(head.find("<style>").unwrap() < head.find("<link").unwrap());

    let body_end = html.find("</body>").unwrap();
    let manifest_at = html.find("data-djc").unwrap();
    let media_at = html.find(r#"<script src="/static/chart.js"></script>"#).unwrap();
    let inline_at = html.find("<script>console.log('Card');</script>").unwrap();
    assert!(manifest_at < media_at && media_at < inline_at && inline_at < body_end);

    // Media URLs exist, so the client hears about everything already in the page.
    let manifest = decode_manifest(&html);
    assert_eq!(manifest["loadedJsUrls"].as_array().unwrap().len(), 2);
    assert_eq!(manifest["toLoadJsTags"], Value::Array(Vec::new()));
}

#[test]
fn test_fragment_defers_everything_to_manifest() {
    let env = ComponentEnv::default();
    let card = styled_component("Card", "<div>card</div>");
    let chart = media_component("Chart", "<canvas></canvas>", "chart.js", "chart.css");

    let body = format!(
        "{CSS_DEPENDENCY_PLACEHOLDER}{}{}{JS_DEPENDENCY_PLACEHOLDER}",
        marked(&env, &card),
        marked(&env, &chart)
    );
    let html = render_dependencies(&env, body, RenderType::Fragment).unwrap();

    assert!(html.starts_with("<div>card</div><canvas></canvas><script type=\"application/json\" data-djc>"));
    assert!(!html.contains("CSS_PLACEHOLDER"));
    assert!(!html.contains("JS_PLACEHOLDER"));
    assert!(!html.contains("<style>"));

    let manifest = decode_manifest(&html);
    let to_load_js: Vec<&str> = manifest["toLoadJsTags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(
        to_load_js,
        [
            r#"<script src="/static/chart.js"></script>"#,
            format!(r#"<script src="/components/cache/{}.js"></script>"#, card.class_hash()).as_str(),
        ]
    );
    assert_eq!(manifest["loadedJsUrls"], Value::Array(Vec::new()));
}

#[test]
fn test_placeholders_take_precedence_over_head_and_body() {
    let env = ComponentEnv::default();
    let card = styled_component("Card", "<div>card</div>");

    let body = format!(
        "<header>{CSS_DEPENDENCY_PLACEHOLDER}</header>{}<footer>{JS_DEPENDENCY_PLACEHOLDER}</footer>{CSS_DEPENDENCY_PLACEHOLDER}",
        marked(&env, &card)
    );
    let html = render_dependencies(&env, document(&body), RenderType::Document).unwrap();

    assert!(html.contains("<header><style>.card { display: block; }</style></header>"));
    assert!(html.contains("<footer><script>console.log('Card');</script></footer>"));
    assert!(html.contains("<head><title>t</title></head>"));
    assert_eq!(html.matches("<style>").count(), 1);
    assert!(!html.contains("CSS_PLACEHOLDER"));
}

#[test]
fn test_media_deduplicated_by_url_first_tag_wins() {
    let env = ComponentEnv::default();
    let deferred = media_component(
        "Deferred",
        "<p>1</p>",
        r#"<script src="/static/shared.js" defer></script>"#,
        "shared.css",
    );
    let plain = media_component("Plain", "<p>2</p>", "shared.js", "shared.css");

    let body = format!("{}{}", marked(&env, &deferred), marked(&env, &plain));
    let html = render_dependencies(&env, document(&body), RenderType::Document).unwrap();

    assert_eq!(html.matches(r#"src="/static/shared.js""#).count(), 1);
    assert!(html.contains(r#"<script src="/static/shared.js" defer></script>"#));
    assert_eq!(html.matches(r#"href="/static/shared.css""#).count(), 1);
}

#[test]
fn test_content_type_is_preserved() {
    let env = ComponentEnv::default();
    let card = styled_component("Card", "<div>card</div>");
    let html = document(&marked(&env, &card));

    let bytes = render_dependencies(&env, html.clone().into_bytes(), RenderType::Document).unwrap();
    let text = render_dependencies(&env, html.clone(), RenderType::Document).unwrap();
    let safe = render_dependencies(&env, SafeHtml::new(html), RenderType::Document).unwrap();

    assert_eq!(String::from_utf8(bytes).unwrap(), text);
    assert_eq!(safe.as_str(), text);
}

#[test]
fn test_unknown_class_hash_fails() {
    let env = ComponentEnv::default();
    let html = "<!-- _RENDERED Ghost_abcdef,c123456 --><p>boo</p>";

    let err = render_dependencies(&env, html.to_string(), RenderType::Document).unwrap_err();
    assert!(matches!(err, ComponentError::UnknownComponentHash { ref hash } if hash == "Ghost_abcdef"));
}

#[test]
fn test_dropped_class_no_longer_resolves() {
    let env = ComponentEnv::default();
    let html = {
        let card = styled_component("Card", "<div>card</div>");
        marked(&env, &card)
    };

    let err = render_dependencies(&env, html, RenderType::Fragment).unwrap_err();
    assert!(matches!(err, ComponentError::UnknownComponentHash { .. }));
}

#[test]
fn test_malformed_marker_fails() {
    let env = ComponentEnv::default();
    let err = render_dependencies(&env, "<!-- _RENDERED nocomma -->".to_string(), RenderType::Document)
        .unwrap_err();
    assert!(matches!(err, ComponentError::MalformedMarker { ref data } if data == "nocomma"));
}

#[test]
fn test_media_tag_without_url_fails() {
    let env = ComponentEnv::default();
    let inline = media_component("Inline", "<p></p>", "<script>alert(1)</script>", "x.css");

    let err = render_dependencies(&env, marked(&env, &inline), RenderType::Document).unwrap_err();
    assert!(matches!(err, ComponentError::MissingMediaUrl { ref attribute, .. } if attribute == "src"));
}

#[test]
fn test_inlined_closing_tag_fails() {
    let env = ComponentEnv::default();
    let broken = ComponentClass::builder("Broken", "tests.Broken")
        .template("<p></p>")
        .js("document.write('</script>')")
        .build();

    let err = broken.render(&env, RenderOptions::new()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ComponentError>(),
        Some(ComponentError::ClosingTagInContent { .. })
    ));
}

#[test]
fn test_document_without_head_or_body_is_left_alone() {
    let env = ComponentEnv::default();
    let card = styled_component("Card", "<div>card</div>");

    let html = render_dependencies(&env, marked(&env, &card), RenderType::Document).unwrap();
    assert_eq!(html, "<div>card</div>");
}

#[test]
fn test_class_name_with_spaces_still_aggregates() {
    let env = ComponentEnv::default();
    let class = ComponentClass::builder("My Card", "tests.components.MyCard")
        .template("<div>c</div>")
        .css(".c{}")
        .build();

    let html = render_dependencies(&env, document(&marked(&env, &class)), RenderType::Document).unwrap();
    assert!(!html.contains("_RENDERED"), "{html}");
    assert!(html.contains("<style>.c{}</style></head>"), "{html}");
    assert!(html.contains("<div>c</div>"));
}
