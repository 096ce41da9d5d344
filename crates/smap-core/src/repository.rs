//! Interfaces to the collaborators that sit outside the generation pipeline.
//!
//! The pipeline only ever reads through these traits. Implementations must be
//! `Send + Sync` so one [`SitemapBuilder`](crate::SitemapBuilder) can serve
//! concurrent runs; every run still owns its own
//! [`GenerationState`](crate::GenerationState).

use crate::types::{LanguageVariant, NodeId, SiteConfig, VirtualChild};
use crate::Result;
use std::fmt;

/// Read access to the hierarchical content tree.
pub trait ContentRepository: Send + Sync {
    /// The absolute top of the tree. Never itself a sitemap entry.
    fn root_node(&self) -> NodeId;

    /// All descendants of `node`, excluding `node` itself.
    ///
    /// The order must be stable for a given tree so that deduplication is
    /// deterministic.
    fn descendants(&self, node: NodeId) -> Result<Vec<NodeId>>;

    /// Language variants of `node`.
    fn language_variants(&self, node: NodeId) -> Result<Vec<LanguageVariant>>;
}

/// Routing collaborator that turns content into a (possibly relative) URL.
pub trait UrlResolver: Send + Sync {
    /// Resolve `variant`, scoped to `language` when given.
    ///
    /// May return a relative path or an absolute URL on any host.
    fn resolve(&self, variant: &LanguageVariant, language: Option<&str>) -> Result<String>;
}

/// Source of site definitions.
pub trait SiteSource: Send + Sync {
    /// All configured sites.
    fn list_sites(&self) -> Vec<SiteConfig>;
}

impl SiteSource for Vec<SiteConfig> {
    fn list_sites(&self) -> Vec<SiteConfig> {
        self.clone()
    }
}

/// Capability implemented by pages that render synthetic sub-resources
/// (for example items pulled from an external system) under their own URL.
///
/// The parent is responsible for suffix uniqueness; the generated URLs are
/// not checked against already emitted entries.
pub trait VirtualChildProvider: Send + Sync + fmt::Debug {
    /// Suffixes and optional timestamps, in emission order.
    fn virtual_children(&self) -> Result<Vec<VirtualChild>>;
}

/// Persistence collaborator for the finished document.
pub trait SitemapSink: Send + Sync {
    /// Store `xml` for `site_url`. A failure fails the whole run.
    fn save(&self, site_url: &str, xml: &[u8], entry_count: usize, exceeded_cap: bool)
        -> Result<()>;
}
