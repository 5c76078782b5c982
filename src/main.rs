//! tcomp CLI entry point
//!
//! Renders manifest components and aggregates component dependencies in HTML files:
//! - `render` - Render a component from a component manifest
//! - `aggregate` - Insert JS/CSS for component markers in an HTML file

use anyhow::Result;
use clap::Parser;
use tera_components::cli;
use tera_components::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
