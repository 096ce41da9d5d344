//! Sites command implementation

use anyhow::Result;
use colored::Colorize;
use smap_core::{Config, SiteConfig, SiteSource};

use crate::cli::OutputFormat;

/// Execute the sites command
pub fn execute(config: &Config, format: OutputFormat) -> Result<()> {
    let sites = config.list_sites();

    match format {
        OutputFormat::Text => print_text_format(&sites),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&sites)?),
    }
    Ok(())
}

fn print_text_format(sites: &[SiteConfig]) {
    if sites.is_empty() {
        println!("No sites configured. Add [[sites]] entries to the config file.");
        return;
    }

    for site in sites {
        let name = if site.name.is_empty() { "-" } else { site.name.as_str() };
        println!(
            "{} - {} (start node {})",
            name.cyan(),
            site.site_url,
            site.start_node
        );
        for host in &site.hosts {
            let language = host.language.as_deref().unwrap_or("-");
            let host_name = if host.is_wildcard() { "*" } else { host.host_name.as_str() };
            println!("  {} {}", host_name, language.bright_black());
        }
        println!();
    }
}
