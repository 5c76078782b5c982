//! Nested component renders through the full pipeline.

use anyhow::anyhow;
use serde_json::{Map, Value, json};
use std::sync::{Arc, Mutex};
use tera_components::component::{ComponentClass, ComponentHooks};
use tera_components::config::ContextBehavior;
use tera_components::templating::Template;
use tera_components::test_utils::{document, env_with_behavior, init_test_logging, styled_component};
use tera_components::{Component, ComponentEnv, RenderContext, RenderError, RenderOptions, RenderType};

/// Renders each child in order and exposes the joined HTML as `children`.
struct RendersChildren(Vec<Arc<ComponentClass>>);

impl ComponentHooks for RendersChildren {
    fn get_context_data(
        &self,
        component: &Component,
        _args: &[Value],
        _kwargs: &Map<String, Value>,
    ) -> anyhow::Result<Map<String, Value>> {
        let mut children = String::new();
        for child in &self.0 {
            children.push_str(&component.render_child(child, RenderOptions::new())?);
        }
        let mut data = Map::new();
        data.insert("children".into(), Value::String(children));
        Ok(data)
    }
}

fn page(children: Vec<Arc<ComponentClass>>) -> Arc<ComponentClass> {
    ComponentClass::builder("Page", "tests.pages.Page")
        .template(document("{{ children | safe }}"))
        .hooks(RendersChildren(children))
        .build()
}

#[test]
fn test_error_breadcrumb_lists_component_path() {
    init_test_logging(None);
    let env = ComponentEnv::default();

    let inner = ComponentClass::builder("Inner", "tests.Inner")
        .template("inner")
        .context_data(|_, _, _| Err(anyhow!("KeyError: 'x'")))
        .build();
    let outer = ComponentClass::builder("Outer", "tests.Outer")
        .template("{{ children | safe }}")
        .hooks(RendersChildren(vec![inner]))
        .build();

    let err = outer.render(&env, RenderOptions::new()).unwrap_err();
    assert_eq!(err.components(), ["Outer", "Inner"]);
    assert_eq!(
        err.to_string(),
        "An error occured while rendering components Outer > Inner:\nKeyError: 'x'"
    );
    assert_eq!(err.original().to_string(), "KeyError: 'x'");
}

#[test]
fn test_breadcrumb_is_not_repeated_for_deep_trees() {
    let env = ComponentEnv::default();
    let leaf = ComponentClass::builder("Leaf", "tests.Leaf")
        .template("{{ missing_variable }}")
        .build();
    let middle = ComponentClass::builder("Middle", "tests.Middle")
        .template("{{ children | safe }}")
        .hooks(RendersChildren(vec![leaf]))
        .build();
    let root = ComponentClass::builder("Root", "tests.Root")
        .template("{{ children | safe }}")
        .hooks(RendersChildren(vec![middle]))
        .build();

    let err: RenderError = root.render(&env, RenderOptions::new()).unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("An error occured while rendering components Root > Middle > Leaf:\n"));
    assert_eq!(message.matches("An error occured").count(), 1);
}

/// Provides `theme` to every child it renders.
struct ThemeProvider(Arc<ComponentClass>);

impl ComponentHooks for ThemeProvider {
    fn get_context_data(
        &self,
        component: &Component,
        _args: &[Value],
        _kwargs: &Map<String, Value>,
    ) -> anyhow::Result<Map<String, Value>> {
        let context = component.input()?.context;
        let _provided = context.provide("theme", json!("dark"));
        let child = component.render_child(&self.0, RenderOptions::new())?;

        let mut data = Map::new();
        data.insert("child".into(), Value::String(child));
        Ok(data)
    }
}

fn themed_child() -> Arc<ComponentClass> {
    ComponentClass::builder("Themed", "tests.Themed")
        .template("<i>{{ theme }}</i>")
        .context_data(|component, _, _| {
            let theme = component.inject("theme", Some(json!("light")))?;
            let mut data = Map::new();
            data.insert("theme".into(), theme.unwrap_or(Value::Null));
            Ok(data)
        })
        .build()
}

#[test]
fn test_provide_inject_reaches_nested_component() {
    for behavior in [ContextBehavior::Django, ContextBehavior::Isolated] {
        let env = env_with_behavior(behavior);
        let provider = ComponentClass::builder("Provider", "tests.Provider")
            .template("{{ child | safe }}")
            .hooks(ThemeProvider(themed_child()))
            .build();

        let html = provider
            .render(&env, RenderOptions::new().render_dependencies(false))
            .unwrap();
        assert!(html.contains("<i>dark</i>"), "{behavior:?}: {html}");
    }
}

#[test]
fn test_inject_falls_back_to_default_without_provider() {
    let env = ComponentEnv::default();
    let html = themed_child()
        .render(&env, RenderOptions::new().render_dependencies(false))
        .unwrap();
    assert!(html.ends_with("<i>light</i>"));
}

#[test]
fn test_context_behavior_controls_outer_variables() {
    let child = ComponentClass::builder("Child", "tests.Child")
        .template("<b>{{ color | default(value='none') }}</b>")
        .build();
    let parent = ComponentClass::builder("Parent", "tests.Parent")
        .template("{{ children | safe }}")
        .hooks(RendersChildren(vec![child]))
        .build();

    let mut outer = Map::new();
    outer.insert("color".into(), json!("red"));

    let django = parent
        .render(
            &env_with_behavior(ContextBehavior::Django),
            RenderOptions::new().context(outer.clone()),
        )
        .unwrap();
    assert!(django.contains("<b>red</b>"));

    let isolated = parent
        .render(
            &env_with_behavior(ContextBehavior::Isolated),
            RenderOptions::new().context(outer),
        )
        .unwrap();
    assert!(isolated.contains("<b>none</b>"));
}

#[test]
fn test_assets_follow_first_render_order() {
    let env = ComponentEnv::default();
    let a = styled_component("A", "<a-el></a-el>");
    let b = styled_component("B", "<b-el></b-el>");
    let c = styled_component("C", "<c-el></c-el>");
    let root = page(vec![a, Arc::clone(&b), c, b]);

    let html = root.render(&env, RenderOptions::new()).unwrap();

    let pos = |needle: &str| html.find(needle).unwrap_or_else(|| panic!("{needle} missing: {html}"));
    assert!(pos("console.log('A');") < pos("console.log('B');"));
    assert!(pos("console.log('B');") < pos("console.log('C');"));
    assert_eq!(html.matches("console.log('B');").count(), 1);
    assert_eq!(html.matches("<b-el></b-el>").count(), 2);
    assert!(!html.contains("_RENDERED"));
}

#[test]
fn test_nested_renders_aggregate_once_at_root() {
    let env = ComponentEnv::default();
    let card = styled_component("Card", "<div>card</div>");
    let root = page(vec![card]);

    let html = root.render(&env, RenderOptions::new()).unwrap();

    assert_eq!(html.matches("<style>.card { display: block; }</style>").count(), 1);
    assert_eq!(html.matches("<script>console.log('Card');</script>").count(), 1);
    let head_end = html.find("</head>").unwrap();
    assert!(html.find("<style>").unwrap() < head_end);
    assert!(html.find("<script>").unwrap() > html.find("<div>card</div>").unwrap());
}

#[test]
fn test_fragment_type_propagates_to_children() {
    let env = ComponentEnv::default();
    let card = styled_component("Card", "<div>card</div>");
    let root = ComponentClass::builder("Panel", "tests.Panel")
        .template("<section>{{ children | safe }}</section>")
        .hooks(RendersChildren(vec![Arc::clone(&card)]))
        .build();

    let html = root
        .render(&env, RenderOptions::new().render_type(RenderType::Fragment))
        .unwrap();

    assert!(html.starts_with("<section><div>card</div></section>"));
    assert!(html.contains(r#"<script type="application/json" data-djc>"#));
    assert!(!html.contains("<style>"));
}

#[test]
fn test_slots_render_with_outer_context() {
    let env = ComponentEnv::default();
    let frame = ComponentClass::builder("Frame", "tests.Frame")
        .template(
            "{% if component_vars.is_filled.title %}<h1>{{ slots.title | safe }}</h1>{% endif %}\
             <main>{{ slots.default | safe }}</main>",
        )
        .build();

    let html = frame
        .render(
            &env,
            RenderOptions::new()
                .slot("title", "<Welcome>")
                .slot("default", "body")
                .render_dependencies(false),
        )
        .unwrap();
    assert!(html.ends_with("<h1>&lt;Welcome&gt;</h1><main>body</main>"));

    let unescaped = frame
        .render(
            &env,
            RenderOptions::new()
                .slot("default", "<em>raw</em>")
                .escape_slots_content(false)
                .render_dependencies(false),
        )
        .unwrap();
    assert!(unescaped.ends_with("<main><em>raw</em></main>"));
    assert!(!unescaped.contains("<h1>"));
}

/// Wraps the output and adds a variable right before the template renders.
struct Decorates;

impl ComponentHooks for Decorates {
    fn on_render_before(
        &self,
        _component: &Component,
        context: &RenderContext,
        _template: &mut Template,
    ) -> anyhow::Result<()> {
        context.insert("greeting", "hi");
        Ok(())
    }

    fn on_render_after(
        &self,
        _component: &Component,
        _context: &RenderContext,
        _template: &Template,
        content: &str,
    ) -> anyhow::Result<Option<String>> {
        Ok(Some(format!("<wrap>{content}</wrap>")))
    }
}

#[test]
fn test_render_hooks_adjust_context_and_replace_output() {
    let env = ComponentEnv::default();
    let context = RenderContext::new();
    let class = ComponentClass::builder("Decorated", "tests.Decorated")
        .template("<p>{{ greeting }}</p>")
        .hooks(Decorates)
        .build();

    let html = class
        .render(&env, RenderOptions::new().with_context(context.clone()).render_dependencies(false))
        .unwrap();
    assert!(html.starts_with("<!-- _RENDERED Decorated_"));
    assert!(html.ends_with(" --><wrap><p>hi</p></wrap>"), "{html}");
    assert_eq!(context.get("greeting"), None);
}

#[test]
fn test_render_before_can_swap_template() {
    struct Swaps;
    impl ComponentHooks for Swaps {
        fn on_render_before(
            &self,
            component: &Component,
            _context: &RenderContext,
            template: &mut Template,
        ) -> anyhow::Result<()> {
            *template = component.env().templates().cached_template("<b>swapped</b>")?;
            Ok(())
        }
    }

    let env = ComponentEnv::default();
    let class = ComponentClass::builder("Swapped", "tests.Swapped").template("original").hooks(Swaps).build();
    let html = class.render(&env, RenderOptions::new().render_dependencies(false)).unwrap();
    assert!(html.ends_with("<b>swapped</b>"));
}

/// Records whether each template was flagged as nested in an extends chain.
struct RecordsNesting {
    children: Vec<Arc<ComponentClass>>,
    seen: Arc<Mutex<Vec<(String, bool)>>>,
}

impl ComponentHooks for RecordsNesting {
    fn get_context_data(
        &self,
        component: &Component,
        args: &[Value],
        kwargs: &Map<String, Value>,
    ) -> anyhow::Result<Map<String, Value>> {
        RendersChildren(self.children.clone()).get_context_data(component, args, kwargs)
    }

    fn on_render_before(
        &self,
        component: &Component,
        _context: &RenderContext,
        template: &mut Template,
    ) -> anyhow::Result<()> {
        self.seen
            .lock()
            .unwrap()
            .push((component.name().to_string(), template.nested_in_extends()));
        Ok(())
    }
}

#[test]
fn test_block_state_reaches_nested_templates() {
    for behavior in [ContextBehavior::Django, ContextBehavior::Isolated] {
        let env = env_with_behavior(behavior);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let inner = ComponentClass::builder("Inner", "tests.Inner")
            .template("inner")
            .hooks(RecordsNesting {
                children: Vec::new(),
                seen: Arc::clone(&seen),
            })
            .build();
        let outer = ComponentClass::builder("Outer", "tests.Outer")
            .template("{{ children | safe }}")
            .hooks(RecordsNesting {
                children: vec![inner],
                seen: Arc::clone(&seen),
            })
            .build();

        let context = RenderContext::new();
        {
            let _block = context.enter_block();
            outer
                .render(&env, RenderOptions::new().with_context(context.clone()).render_dependencies(false))
                .unwrap();
            assert!(context.in_block());
        }
        assert_eq!(
            *seen.lock().unwrap(),
            [("Inner".to_string(), true), ("Outer".to_string(), true)],
            "{behavior:?}"
        );

        seen.lock().unwrap().clear();
        outer
            .render(&env, RenderOptions::new().with_context(context.clone()).render_dependencies(false))
            .unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            [("Inner".to_string(), false), ("Outer".to_string(), false)],
            "{behavior:?}"
        );
        assert!(!context.in_block());
    }
}
