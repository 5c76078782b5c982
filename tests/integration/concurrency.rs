//! Renders and aggregations sharing one environment across threads.

use std::sync::Arc;
use tera_components::dependencies::{ScriptKind, cache_key};
use tera_components::test_utils::{document, styled_component};
use tera_components::{ComponentEnv, RenderOptions, RenderType};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_renders_share_cache_and_registry() {
    let env = ComponentEnv::default();
    let classes: Vec<_> = (0..8)
        .map(|i| styled_component(&format!("Widget{i}"), &document(&format!("<p>{i}</p>"))))
        .collect();

    let mut handles = Vec::new();
    for round in 0..4 {
        for class in &classes {
            let env = env.clone();
            let class = Arc::clone(class);
            let render_type = if round % 2 == 0 { RenderType::Document } else { RenderType::Fragment };
            handles.push(tokio::task::spawn_blocking(move || {
                let html = class.render(&env, RenderOptions::new().render_type(render_type))?;
                anyhow::Ok((class, render_type, html))
            }));
        }
    }

    for handle in handles {
        let (class, render_type, html) = handle.await.unwrap().unwrap();
        assert!(!html.contains("_RENDERED"));
        match render_type {
            RenderType::Document => {
                assert_eq!(html.matches(&format!("console.log('{}');", class.name())).count(), 1);
            }
            RenderType::Fragment => assert!(html.contains("data-djc")),
        }
    }

    for class in &classes {
        assert!(env.registry().get(class.class_hash()).is_some());
        assert!(env.cache().has(&cache_key(class.class_hash(), ScriptKind::Js)));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_component_instances_keep_frames_per_render() {
    let env = ComponentEnv::default();
    let class = styled_component("Counter", "<span>{{ n }}</span>");

    let tasks: Vec<_> = (0..16)
        .map(|n| {
            let env = env.clone();
            let class = Arc::clone(&class);
            tokio::task::spawn_blocking(move || {
                class
                    .render(&env, RenderOptions::new().kwarg("n", n).render_dependencies(false))
                    .map(|html| (n, html))
            })
        })
        .collect();

    for task in tasks {
        let (n, html) = task.await.unwrap().unwrap();
        assert!(html.ends_with(&format!("<span>{n}</span>")));
    }
}
