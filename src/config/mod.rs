//! Configuration for tera-components.
//!
//! A single optional `components.toml` configures the render engine, the
//! dependency aggregator, the cached-asset endpoint and the response middleware.
//!
//! **Location** (first match wins):
//! 1. Path passed explicitly (CLI `--config`)
//! 2. `TCOMP_CONFIG_PATH` environment variable
//! 3. `./components.toml`
//!
//! A missing file is not an error; defaults are used.

mod settings;

pub use settings::{ComponentsConfig, ContextBehavior};
