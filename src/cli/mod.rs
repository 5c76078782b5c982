//! Command-line interface for tera-components.
//!
//! The `tcomp` binary renders components declared in a component manifest and runs the
//! dependency aggregator over existing HTML files.
//!
//! # Commands
//!
//! - [`render`]: render one manifest component with aggregated JS/CSS
//! - [`aggregate`]: replace dependency markers in an HTML file
//!
//! # Global Options
//!
//! - `--verbose` / `-v`: debug logging
//! - `--quiet` / `-q`: errors only
//! - `--config` / `-c`: path to `components.toml`
//!
//! # Examples
//!
//! ```bash
//! tcomp render components.toml card --kwargs '{"title": "Hello"}'
//! tcomp --verbose aggregate page.html --manifest components.toml
//! tcomp render components.toml card --fragment > fragment.html
//! ```

pub mod aggregate;
pub mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::component::ComponentEnv;
use crate::config::ComponentsConfig;

/// Runtime settings derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter. `None` keeps `RUST_LOG` (or `warn` when unset).
    pub log_level: Option<String>,
    /// Explicit path to `components.toml`.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log level.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// Set the configuration file path.
    #[must_use]
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Install the global tracing subscriber. Later calls are no-ops.
    pub fn init_logging(&self) {
        let filter = match &self.log_level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    /// Load the settings and build the component environment.
    pub async fn load_env(&self) -> Result<ComponentEnv> {
        let config = ComponentsConfig::load(self.config_path.as_deref()).await?;
        Ok(ComponentEnv::new(config)?)
    }
}

/// Reusable template components with JS/CSS dependency aggregation.
#[derive(Parser)]
#[command(name = "tcomp", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    ///
    /// Equivalent to `RUST_LOG=debug`. Conflicts with `--quiet`.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the components configuration file.
    ///
    /// Defaults to `$TCOMP_CONFIG_PATH`, then `./components.toml`. Built-in defaults
    /// apply when no file exists.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a component from a component manifest.
    Render(render::RenderCommand),

    /// Insert JS/CSS for the component markers in an HTML file.
    Aggregate(aggregate::AggregateCommand),
}

impl Cli {
    /// Run the selected command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translate the global flags into a [`CliConfig`].
    pub fn build_config(&self) -> CliConfig {
        let mut config = CliConfig::new();
        if self.verbose {
            config = config.with_log_level("debug");
        } else if self.quiet {
            config = config.with_log_level("error");
        }
        if let Some(path) = &self.config {
            config = config.with_config_path(path);
        }
        config
    }

    /// Run the selected command with an explicit configuration.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();
        let env = config.load_env().await?;

        match self.command {
            Commands::Render(cmd) => cmd.execute(&env).await,
            Commands::Aggregate(cmd) => cmd.execute(&env).await,
        }
    }
}
