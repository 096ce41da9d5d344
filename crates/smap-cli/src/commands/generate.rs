//! Generate command implementation

use anyhow::{Context, Result, bail};
use colored::Colorize;
use serde_json::json;
use smap_core::{
    Config, ContentTree, FileSink, GenerationOutcome, MemorySink, SitemapBuilder, SitemapRequest,
    SitemapSink, UrlFilterRules,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::cli::{GenerateArgs, OutputFormat};

enum Destination {
    Files(Arc<FileSink>),
    Stdout(Arc<MemorySink>),
}

/// Execute the generate command
pub fn execute(args: GenerateArgs, mut config: Config) -> Result<()> {
    let tree = Arc::new(
        ContentTree::load(&args.tree)
            .with_context(|| format!("Failed to load content tree from {}", args.tree.display()))?,
    );
    debug!(nodes = tree.len(), tree = %args.tree.display(), "Loaded content tree");

    if let Some(dir) = &args.output {
        config.override_output(dir);
    }

    let destination = if args.stdout {
        Destination::Stdout(Arc::new(MemorySink::new()))
    } else {
        Destination::Files(Arc::new(FileSink::new(&config.paths.output).with_context(
            || format!("Failed to prepare {}", config.paths.output.display()),
        )?))
    };
    let sink: Arc<dyn SitemapSink> = match &destination {
        Destination::Files(sink) => sink.clone(),
        Destination::Stdout(sink) => sink.clone(),
    };

    let mut builder = SitemapBuilder::new(tree.clone(), tree, Arc::new(config.clone()), sink)
        .with_defaults(&config.defaults);
    if let Some(dialect) = args.dialect {
        builder = builder.with_dialect(dialect);
    }
    if let Some(policy) = args.on_unresolved {
        builder = builder.with_resolution_policy(policy);
    }
    if args.debug_info {
        builder = builder.with_debug_info(true);
    }

    let mut request = SitemapRequest::new(&args.site).with_filter_rules(UrlFilterRules {
        exclude: args.exclude,
        include: args.include,
    });
    if let Some(root) = args.root {
        request = request.with_raw_root(root);
    }

    let outcome = builder.generate(&request);
    if !outcome.success {
        bail!("Sitemap generation failed for {}", args.site);
    }

    match destination {
        Destination::Stdout(sink) => {
            let saved = sink.last().context("No sitemap was produced")?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&saved.xml)?;
            stdout.flush()?;
            if args.format == OutputFormat::Json {
                eprintln!("{}", summary_json(&args.site, outcome, None)?);
            }
        },
        Destination::Files(sink) => {
            let path = sink.sitemap_path(&args.site);
            match args.format {
                OutputFormat::Text => print_summary(&args.site, outcome, &path),
                OutputFormat::Json => println!("{}", summary_json(&args.site, outcome, Some(path))?),
            }
        },
    }

    Ok(())
}

fn print_summary(site: &str, outcome: GenerationOutcome, path: &std::path::Path) {
    println!(
        "{} {} {} for {}",
        "✓".green(),
        outcome.entry_count.to_string().bold(),
        if outcome.entry_count == 1 { "entry" } else { "entries" },
        site.cyan()
    );
    println!("  {}", path.display().to_string().bright_black());
    if outcome.exceeded_cap {
        println!(
            "  {} entry cap reached, remaining content was left out",
            "!".yellow()
        );
    }
}

fn summary_json(site: &str, outcome: GenerationOutcome, path: Option<PathBuf>) -> Result<String> {
    let value = json!({
        "site": site,
        "success": outcome.success,
        "entryCount": outcome.entry_count,
        "exceededCap": outcome.exceeded_cap,
        "path": path.map(|p| p.display().to_string()),
    });
    Ok(serde_json::to_string_pretty(&value)?)
}
