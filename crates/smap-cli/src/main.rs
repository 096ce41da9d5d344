//! smap CLI - XML sitemap generation from a content tree
//!
//! Entry point for the smap command-line interface. Command implementations
//! live in [`commands`].

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod utils;

use cli::{Cli, Commands};
use utils::logging::initialize_logging;

fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    let config = utils::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Generate(args) => commands::generate_sitemap(args, config)?,
        Commands::Sites { format } => commands::list_sites(&config, format)?,
    }

    Ok(())
}
