//! `components.toml` discovery and effect on rendering.

use anyhow::Result;
use serial_test::serial;
use std::fs;
use tempfile::TempDir;
use tera_components::config::{ComponentsConfig, ContextBehavior};
use tera_components::constants::CONFIG_PATH_ENV;
use tera_components::test_utils::styled_component;
use tera_components::{ComponentClass, ComponentEnv, RenderOptions, RenderType};

struct ConfigPathGuard;

impl ConfigPathGuard {
    fn set(value: &std::path::Path) -> Self {
        // SAFETY: tests touching the environment run under #[serial].
        unsafe { std::env::set_var(CONFIG_PATH_ENV, value) };
        Self
    }
}

impl Drop for ConfigPathGuard {
    fn drop(&mut self) {
        // SAFETY: see ConfigPathGuard::set.
        unsafe { std::env::remove_var(CONFIG_PATH_ENV) };
    }
}

#[tokio::test]
#[serial]
async fn test_env_var_locates_config() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("custom.toml");
    fs::write(
        &path,
        r#"
context_behavior = "isolated"
static_url = "https://cdn.example.com/assets/"
cache_url_prefix = "/_assets"
"#,
    )?;
    let _guard = ConfigPathGuard::set(&path);

    let config = ComponentsConfig::load(None).await?;
    assert_eq!(config.context_behavior, ContextBehavior::Isolated);
    assert_eq!(config.cache_prefix(), "/_assets");
    assert_eq!(config.static_path("a.js"), "https://cdn.example.com/assets/a.js");
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_explicit_path_wins_over_env_var() -> Result<()> {
    let temp = TempDir::new()?;
    let from_env = temp.path().join("env.toml");
    let explicit = temp.path().join("explicit.toml");
    fs::write(&from_env, "cache_url_prefix = \"/from-env\"\n")?;
    fs::write(&explicit, "cache_url_prefix = \"/explicit\"\n")?;
    let _guard = ConfigPathGuard::set(&from_env);

    let config = ComponentsConfig::load(Some(&explicit)).await?;
    assert_eq!(config.cache_url_prefix, "/explicit");
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_missing_file_uses_defaults() -> Result<()> {
    let temp = TempDir::new()?;
    let _guard = ConfigPathGuard::set(&temp.path().join("absent.toml"));

    let config = ComponentsConfig::load(None).await?;
    assert_eq!(config, ComponentsConfig::default());
    Ok(())
}

#[tokio::test]
async fn test_invalid_values_rejected() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("bad.toml");
    fs::write(&path, "cache_url_prefix = \"components\"\n")?;

    let err = ComponentsConfig::load(Some(&path)).await.unwrap_err();
    assert!(format!("{err:#}").contains("must start with '/'"));
    Ok(())
}

#[test]
fn test_template_dirs_and_urls_drive_rendering() -> Result<()> {
    let temp = TempDir::new()?;
    let templates = temp.path().join("templates");
    fs::create_dir_all(templates.join("cards"))?;
    fs::write(
        templates.join("cards/card.html"),
        "<div class=\"card\">{{ title }}</div>",
    )?;

    let config = ComponentsConfig {
        template_dirs: vec![templates],
        cache_url_prefix: "/_assets/".into(),
        ..ComponentsConfig::default()
    };
    let env = ComponentEnv::new(config)?;

    let card = ComponentClass::builder("Card", "tests.Card")
        .template_name("cards/card.html")
        .js("init();")
        .context_data(|_, _, kwargs| Ok(kwargs.clone()))
        .build();
    let html = card.render(
        &env,
        RenderOptions::new()
            .kwarg("title", "<b>")
            .render_type(RenderType::Fragment),
    )?;

    assert!(html.starts_with("<div class=\"card\">&lt;b&gt;</div>"));
    let encoded = base64_of(&format!("<script src=\"/_assets/{}.js\"></script>", card.class_hash()));
    assert!(html.contains(&encoded), "{html}");

    // Unrelated components keep working against the same env.
    let other = styled_component("Other", "<p>other</p>");
    assert!(other.render(&env, RenderOptions::new().render_dependencies(false)).is_ok());
    Ok(())
}

fn base64_of(value: &str) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(value)
}
