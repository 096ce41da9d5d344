//! Host language exclusion for page variants.
//!
//! A site can bind several hosts, some of them to a specific language
//! (`example.com` → `en`, `example.fr` → `fr`). When generating the sitemap for
//! one host, a page variant in another language is left out only if some other
//! binding explicitly serves that language; otherwise this host stays the
//! fallback and keeps the variant.
//!
//! ```rust
//! use smap_core::{HostBinding, HostBindingCache, LanguageBranchPolicy, LanguageVariant, NodeId, SiteConfig};
//!
//! let site = SiteConfig {
//!     name: "main".into(),
//!     site_url: "https://example.com/".into(),
//!     start_node: NodeId(1),
//!     hosts: vec![
//!         HostBinding::new("example.com", Some("en")),
//!         HostBinding::new("example.fr", Some("fr")),
//!     ],
//! };
//! let cache = HostBindingCache::default();
//! let mut policy = LanguageBranchPolicy::new(&site, &cache);
//!
//! assert!(policy.should_exclude(&LanguageVariant::page(NodeId(2), "fr"), Some("en")));
//! assert!(!policy.should_exclude(&LanguageVariant::page(NodeId(2), "de"), Some("en")));
//! assert!(!policy.should_exclude(&LanguageVariant::page(NodeId(2), "en"), Some("en")));
//! ```

use crate::cache::HostBindingCache;
use crate::types::{LanguageVariant, SiteConfig};

/// Statistics about language exclusion decisions in one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LanguageStats {
    /// Page variants evaluated.
    pub total_processed: usize,
    /// Variants left in the sitemap.
    pub accepted: usize,
    /// Variants excluded because another host serves their language.
    pub rejected: usize,
}

impl LanguageStats {
    /// Rejection percentage, for reporting only.
    #[allow(clippy::cast_precision_loss)]
    pub fn rejection_percentage(&self) -> f64 {
        if self.total_processed == 0 {
            0.0
        } else {
            (self.rejected as f64 / self.total_processed as f64) * 100.0
        }
    }
}

/// Decides whether a page variant belongs on the current host's sitemap.
pub struct LanguageBranchPolicy<'a> {
    site: &'a SiteConfig,
    cache: &'a HostBindingCache,
    stats: LanguageStats,
}

impl<'a> LanguageBranchPolicy<'a> {
    /// Policy for `site`, memoizing binding lookups in `cache`.
    pub const fn new(site: &'a SiteConfig, cache: &'a HostBindingCache) -> Self {
        Self {
            site,
            cache,
            stats: LanguageStats {
                total_processed: 0,
                accepted: 0,
                rejected: 0,
            },
        }
    }

    /// `true` iff `host_language` is set, differs from the variant's language
    /// (case-insensitive), and some host binding of the site explicitly
    /// targets the variant's language.
    pub fn should_exclude(&mut self, variant: &LanguageVariant, host_language: Option<&str>) -> bool {
        self.stats.total_processed += 1;

        let excluded = match host_language {
            Some(host_lang) if !host_lang.eq_ignore_ascii_case(&variant.language) => {
                self.has_binding_for(&variant.language)
            },
            _ => false,
        };

        if excluded {
            self.stats.rejected += 1;
        } else {
            self.stats.accepted += 1;
        }
        excluded
    }

    fn has_binding_for(&self, language: &str) -> bool {
        let site = self.site;
        self.cache
            .get_or_insert_with(&site.site_url, language, || {
                site.has_binding_for_language(language)
            })
    }

    /// Decisions made so far.
    pub const fn stats(&self) -> &LanguageStats {
        &self.stats
    }
}
