//! `tcomp render`: render a manifest component to stdout.

use anyhow::{Context, Result, anyhow};
use clap::Args;
use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::component::{ComponentEnv, RenderOptions};
use crate::dependencies::RenderType;
use crate::manifest::ComponentManifest;

/// Render a component with its dependencies aggregated.
#[derive(Args, Debug)]
pub struct RenderCommand {
    /// Component manifest (TOML)
    manifest: PathBuf,

    /// Name of the component in the manifest
    component: String,

    /// Keyword arguments as a JSON object
    #[arg(short, long, default_value = "{}")]
    kwargs: String,

    /// Render as a fragment: assets go into a manifest for client-side loading
    #[arg(long)]
    fragment: bool,
}

impl RenderCommand {
    /// Run the command.
    pub async fn execute(self, env: &ComponentEnv) -> Result<()> {
        let html = self.render(env).await?;
        println!("{html}");
        Ok(())
    }

    /// Render and return the HTML.
    pub async fn render(&self, env: &ComponentEnv) -> Result<String> {
        let manifest = ComponentManifest::load(&self.manifest).await?;
        let classes = manifest.register(env);
        let class = classes.get(&self.component).ok_or_else(|| {
            anyhow!(
                "Component '{}' not found in {}. Available: {}",
                self.component,
                self.manifest.display(),
                classes.keys().cloned().collect::<Vec<_>>().join(", ")
            )
        })?;

        let kwargs: Map<String, Value> =
            serde_json::from_str(&self.kwargs).context("--kwargs must be a JSON object")?;
        let render_type = if self.fragment { RenderType::Fragment } else { RenderType::Document };

        tracing::debug!("Rendering {} as {}", self.component, render_type);
        Ok(class.render(env, RenderOptions::new().kwargs(kwargs).render_type(render_type))?)
    }
}
