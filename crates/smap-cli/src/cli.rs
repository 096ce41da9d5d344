//! # CLI Structure and Argument Parsing
//!
//! Command-line interface for `smap`, built with `clap` derive macros.
//!
//! ## Usage Patterns
//!
//! ```bash
//! # Generate the sitemap for a host and store it under the output directory
//! smap generate --site https://example.com/ --tree content.toml
//!
//! # Print the document instead of storing it
//! smap generate --site https://example.fr/ --tree content.toml --stdout
//!
//! # Restrict to a subtree and skip some paths
//! smap generate --site https://example.com/ --tree content.toml --root 12 --exclude /private/
//!
//! # Inspect configured sites
//! smap sites --format json
//! ```
//!
//! ## Output Formats
//!
//! - **text**: Human-readable summary (default)
//! - **json**: Machine-readable JSON for scripting

use clap::{Args, Parser, Subcommand, ValueEnum};
use smap_core::{Dialect, ResolutionPolicy};
use std::path::PathBuf;

/// Main CLI structure for the `smap` command
#[derive(Parser, Clone, Debug)]
#[command(name = "smap")]
#[command(version)]
#[command(about = "smap - XML sitemaps from a content tree", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, env = "SMAP_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Output format for command results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available subcommands
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Generate the sitemap for one site URL
    Generate(GenerateArgs),

    /// List configured sites and their host bindings
    Sites {
        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

impl Commands {
    /// Output format selected for this command.
    pub const fn format(&self) -> OutputFormat {
        match self {
            Self::Generate(args) => args.format,
            Self::Sites { format } => *format,
        }
    }
}

/// Arguments for `smap generate`
#[derive(Args, Clone, Debug)]
pub struct GenerateArgs {
    /// Site URL as requested by clients (selects the site and host language)
    #[arg(long)]
    pub site: String,

    /// Content tree document (TOML, or JSON with a .json extension)
    #[arg(long)]
    pub tree: PathBuf,

    /// Root node id; negative values use the site's start node
    #[arg(long, allow_negative_numbers = true)]
    pub root: Option<i64>,

    /// Path prefix to leave out (repeatable)
    #[arg(long = "exclude", value_name = "PATH")]
    pub exclude: Vec<String>,

    /// Only keep paths under this prefix (repeatable)
    #[arg(long = "include", value_name = "PATH")]
    pub include: Vec<String>,

    /// Sitemap dialect (standard, mobile)
    #[arg(long)]
    pub dialect: Option<Dialect>,

    /// What to do with content whose URL cannot be resolved (skip, abort)
    #[arg(long)]
    pub on_unresolved: Option<ResolutionPolicy>,

    /// Precede each entry with a comment naming its node and language
    #[arg(long)]
    pub debug_info: bool,

    /// Output directory for stored sitemaps (ignored with --stdout)
    #[arg(short = 'o', long, env = "SMAP_OUTPUT_DIR")]
    pub output: Option<PathBuf>,

    /// Print the document to stdout instead of storing it
    #[arg(long)]
    pub stdout: bool,

    /// Output format for the run summary
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}
