//! `tcomp aggregate`: run the dependency aggregator over an HTML file.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tokio::fs;

use crate::component::ComponentEnv;
use crate::dependencies::{RenderType, render_dependencies};
use crate::manifest::ComponentManifest;

/// Replace component markers in an HTML file with the components' JS and CSS.
#[derive(Args, Debug)]
pub struct AggregateCommand {
    /// HTML file containing `<!-- _RENDERED ... -->` markers
    input: PathBuf,

    /// Component manifest whose classes the markers refer to
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Treat the input as a fragment
    #[arg(long)]
    fragment: bool,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl AggregateCommand {
    /// Run the command.
    pub async fn execute(self, env: &ComponentEnv) -> Result<()> {
        let content = fs::read(&self.input)
            .await
            .with_context(|| format!("Failed to read {}", self.input.display()))?;

        // Held until aggregation is done: the registry only keeps weak references.
        let _classes = match &self.manifest {
            Some(path) => ComponentManifest::load(path).await?.register(env),
            None => Default::default(),
        };

        let render_type = if self.fragment { RenderType::Fragment } else { RenderType::Document };
        let output = render_dependencies(env, content, render_type)
            .with_context(|| format!("Failed to aggregate dependencies in {}", self.input.display()))?;

        match &self.output {
            Some(path) => fs::write(path, &output)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?,
            None => {
                use std::io::Write;
                std::io::stdout().write_all(&output).context("Failed to write to stdout")?;
            }
        }
        Ok(())
    }
}
