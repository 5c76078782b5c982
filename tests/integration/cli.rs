//! The `tcomp` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;
use tera_components::component::ComponentClass;
use tera_components::test_utils::sample_manifest;

fn tcomp(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tcomp").unwrap();
    cmd.current_dir(dir.path()).env_remove("TCOMP_CONFIG_PATH").env_remove("RUST_LOG");
    cmd
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("components.toml"), "static_url = \"/assets/\"\n").unwrap();
    fs::write(dir.path().join("manifest.toml"), sample_manifest()).unwrap();
    dir
}

#[test]
fn test_render_fragment() {
    let dir = project();
    tcomp(&dir)
        .args(["render", "manifest.toml", "card", "--kwargs", r#"{"title": "Hello"}"#, "--fragment"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(r#"<div class="card">Hello</div>"#))
        .stdout(predicate::str::contains("data-djc"))
        .stdout(predicate::str::contains("_RENDERED").not());
}

#[test]
fn test_render_reports_validation_errors() {
    let dir = project();
    tcomp(&dir)
        .args(["render", "manifest.toml", "card"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("An error occured while rendering components card"))
        .stderr(predicate::str::contains("Missing required key 'title'"));
}

#[test]
fn test_render_unknown_component() {
    let dir = project();
    tcomp(&dir)
        .args(["render", "manifest.toml", "table"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Component 'table' not found"))
        .stderr(predicate::str::contains("badge, card"));
}

#[test]
fn test_aggregate_document_with_manifest() {
    let dir = project();
    let card = ComponentClass::builder("card", "tests.components.Card").build();
    fs::write(
        dir.path().join("page.html"),
        format!(
            "<html><head></head><body><!-- _RENDERED {},c000001 --><div>card</div></body></html>",
            card.class_hash()
        ),
    )
    .unwrap();

    tcomp(&dir)
        .args(["aggregate", "page.html", "--manifest", "manifest.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<style>.card { padding: 1rem; }</style>"))
        .stdout(predicate::str::contains(r#"<link href="/assets/card/extra.css" media="all" rel="stylesheet">"#))
        .stdout(predicate::str::contains(r#"<script src="/assets/card/extra.js"></script>"#))
        .stdout(predicate::str::contains("<script>console.log('card');</script></body>"));
}

#[test]
fn test_aggregate_without_manifest_fails_on_unknown_hash() {
    let dir = project();
    fs::write(dir.path().join("page.html"), "<!-- _RENDERED card_abcdef,c1 -->").unwrap();

    tcomp(&dir)
        .args(["aggregate", "page.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("card_abcdef"))
        .stderr(predicate::str::contains("--manifest"));
}

#[test]
fn test_aggregate_writes_output_file() {
    let dir = project();
    fs::write(dir.path().join("page.html"), "<html><head></head><body>plain</body></html>").unwrap();

    tcomp(&dir)
        .args(["aggregate", "page.html", "--output", "out.html"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let out = fs::read_to_string(dir.path().join("out.html")).unwrap();
    assert_eq!(out, "<html><head></head><body>plain</body></html>");
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = project();
    fs::write(dir.path().join("components.toml"), "cache_url_prefix = \"nope\"\n").unwrap();

    tcomp(&dir)
        .args(["aggregate", "page.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cache_url_prefix"));
}
