//! Response middleware over rendered component output.

use tera_components::http::HTML_CONTENT_TYPE;
use tera_components::test_utils::{document, styled_component};
use tera_components::{ComponentEnv, DependencyMiddleware, RenderOptions, Request, Response};

#[test]
fn test_full_page_response_gets_inlined_assets() {
    let env = ComponentEnv::default();
    let middleware = DependencyMiddleware::new(env.clone());
    let card = styled_component("Card", "<div>card</div>");
    let body = card.render(&env, RenderOptions::new().render_dependencies(false)).unwrap();

    let response = middleware
        .process_response(&Request::get("/"), Response::html(document(&body)))
        .unwrap();
    let html = response.text();

    assert!(html.contains("<style>.card { display: block; }</style></head>"));
    assert!(html.contains("<script>console.log('Card');</script></body>"));
    assert!(!html.contains("_RENDERED"));
    assert_eq!(response.content_type, HTML_CONTENT_TYPE);
}

#[test]
fn test_partial_request_gets_fragment() {
    let env = ComponentEnv::default();
    let middleware = DependencyMiddleware::new(env.clone());
    let card = styled_component("Card", "<div>card</div>");
    let body = card.render(&env, RenderOptions::new().render_dependencies(false)).unwrap();

    let request = Request::get("/cards").with_header("hx-request", "true");
    let response = middleware.process_response(&request, Response::html(body)).unwrap();
    let html = response.text();

    assert!(html.starts_with("<div>card</div><script type=\"application/json\" data-djc>"));
    assert!(!html.contains("<style>"));
}

#[test]
fn test_non_html_passes_through() {
    let env = ComponentEnv::default();
    let middleware = DependencyMiddleware::new(env);
    let body = "<!-- _RENDERED Ghost_abcdef,c1 -->";

    let response = middleware
        .process_response(&Request::get("/data.txt"), Response::new(200, "text/plain", body))
        .unwrap();
    assert_eq!(response.text(), body);
}

#[test]
fn test_unresolvable_marker_is_an_error() {
    let middleware = DependencyMiddleware::new(ComponentEnv::default());
    let result = middleware.process_response(
        &Request::get("/"),
        Response::html("<!-- _RENDERED Ghost_abcdef,c1 -->"),
    );
    assert!(result.is_err());
}
