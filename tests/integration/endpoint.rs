//! Cached asset endpoint fed by real renders.

use tera_components::dependencies::ScriptKind;
use tera_components::dependencies::aggregate::script_url;
use tera_components::test_utils::styled_component;
use tera_components::{CacheEndpoint, ComponentEnv, RenderOptions, RenderType, Request};

#[test]
fn test_assets_served_after_first_render() {
    let env = ComponentEnv::default();
    let endpoint = CacheEndpoint::new(env.clone());
    let card = styled_component("Card", "<div>card</div>");
    let js_url = script_url(&env, &card, ScriptKind::Js);
    let css_url = script_url(&env, &card, ScriptKind::Css);

    assert!(endpoint.matches(&js_url));
    assert_eq!(endpoint.handle(&Request::get(&js_url)).status, 404);

    let fragment = card
        .render(&env, RenderOptions::new().render_type(RenderType::Fragment))
        .unwrap();
    assert!(fragment.contains("data-djc"));

    let js = endpoint.handle(&Request::get(&js_url));
    assert_eq!(js.status, 200);
    assert_eq!(js.content_type, "text/javascript");
    assert_eq!(js.text(), "console.log('Card');");

    let css = endpoint.handle(&Request::get(&css_url));
    assert_eq!(css.status, 200);
    assert_eq!(css.content_type, "text/css");
    assert_eq!(css.text(), ".card { display: block; }");
}

#[test]
fn test_non_get_rejected_even_when_cached() {
    let env = ComponentEnv::default();
    let endpoint = CacheEndpoint::new(env.clone());
    let card = styled_component("Card", "<div>card</div>");
    card.render(&env, RenderOptions::new()).unwrap();

    let response = endpoint.handle(&Request::new("post", script_url(&env, &card, ScriptKind::Js)));
    assert_eq!(response.status, 405);
    assert_eq!(response.headers.get("Allow").map(String::as_str), Some("GET"));
}

#[test]
fn test_unknown_hash_is_not_found() {
    let env = ComponentEnv::default();
    let endpoint = CacheEndpoint::new(env);
    assert_eq!(endpoint.handle(&Request::get("/components/cache/Nope_000000.js")).status, 404);
}
