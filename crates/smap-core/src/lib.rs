//! # smap-core
//!
//! Core functionality for smap - XML sitemap generation from a hierarchical
//! content tree.
//!
//! Given a root content node and a site configuration, the crate produces an
//! ordered, deduplicated, size-capped list of canonical URLs and serializes
//! them as a sitemap document.
//!
//! ## Architecture
//!
//! The generation pipeline, leaf first:
//!
//! - **URL normalization** ([`UrlNormalizer`]): resolver output forced onto the
//!   site's own origin, with the host's default language prefix removed
//! - **Language policy** ([`LanguageBranchPolicy`]): drops page variants that
//!   another host of the same site serves
//! - **Generation state** ([`GenerationState`]): emitted URL set and the
//!   50,000 entry budget, owned by exactly one run
//! - **Virtual children** ([`expand`]): synthetic sub-URLs a page advertises
//!   through [`VirtualChildProvider`]
//! - **Traversal** ([`ContentTreeWalker`]): drives the steps above per node
//!   and language variant
//! - **Orchestration** ([`SitemapBuilder`]): site resolution, dialect shaping,
//!   serialization, persistence
//!
//! Everything outside the pipeline is reached through the traits in
//! [`repository`]. [`ContentTree`], [`Config`], [`FileSink`] and
//! [`MemorySink`] are ready-made implementations.
//!
//! ## Quick Start
//!
//! ```rust
//! use smap_core::{Config, ContentTree, MemorySink, SitemapBuilder, SitemapRequest};
//! use std::sync::Arc;
//!
//! let config = Config::from_toml_str(r#"
//! [[sites]]
//! site_url = "https://example.com/"
//! start_node = 1
//! [[sites.hosts]]
//! host_name = "example.com"
//! language = "en"
//! "#)?;
//! let tree = Arc::new(ContentTree::from_toml_str(r#"
//! [[nodes]]
//! id = 1
//! [[nodes.variants]]
//! language = "en"
//! "#)?);
//!
//! let builder = SitemapBuilder::new(tree.clone(), tree, Arc::new(config.clone()), Arc::new(MemorySink::new()))
//!     .with_defaults(&config.defaults);
//! let outcome = builder.generate(&SitemapRequest::new("https://example.com/"));
//! assert_eq!(outcome.entry_count, 1);
//! # Ok::<(), smap_core::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Fallible operations return [`Result<T, Error>`]. [`SitemapBuilder::generate`]
//! is the exception: it never fails, it reports a failed
//! [`GenerationOutcome`] instead.
//!
//! ```rust
//! use smap_core::{Config, Error};
//!
//! match Config::from_toml_str("[[sites]]\nsite_url = \"nope\"\nstart_node = 1\n") {
//!     Ok(_) => unreachable!(),
//!     Err(Error::Config(msg)) => assert!(msg.contains("nope")),
//!     Err(e) => panic!("unexpected: {e}"),
//! }
//! ```

/// Sitemap generation orchestrator
pub mod builder;
/// Host-binding lookup cache
pub mod cache;
/// Configuration file and generation defaults
pub mod config;
/// Sitemap dialects
pub mod dialect;
/// Error types and result aliases
pub mod error;
/// Virtual child expansion
pub mod expand;
/// Path and page exclusion rules
pub mod filter;
/// Host language exclusion
pub mod language_filter;
/// Collaborator interfaces
pub mod repository;
/// Per-run emitted set and entry budget
pub mod state;
/// Persistence sinks
pub mod storage;
/// File-backed content tree
pub mod tree;
/// Core data types
pub mod types;
/// URL canonicalization
pub mod url_resolver;
/// Content tree traversal
pub mod walker;
/// XML element tree and serialization
pub mod xml;

// Re-export commonly used types
pub use builder::{GeneratedSitemap, SitemapBuilder};
pub use cache::{CacheStats, HostBindingCache};
pub use config::{Config, DefaultsConfig, PathsConfig};
pub use dialect::{Dialect, ElementStrategy};
pub use error::{Error, Result};
pub use filter::{PageFilter, PathFilter, PublishedPages, RequestRules};
pub use language_filter::{LanguageBranchPolicy, LanguageStats};
pub use repository::{
    ContentRepository, SiteSource, SitemapSink, UrlResolver, VirtualChildProvider,
};
pub use state::{GenerationState, MAX_SITEMAP_ENTRIES};
pub use storage::{FileSink, MemorySink, SitemapMetadata};
pub use tree::ContentTree;
pub use types::*;
pub use url_resolver::UrlNormalizer;
pub use walker::{ContentTreeWalker, ResolutionPolicy, WalkStats};
