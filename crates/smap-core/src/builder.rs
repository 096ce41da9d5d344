//! Top-level sitemap generation.
//!
//! [`SitemapBuilder`] resolves the site for a request, walks the content
//! tree, shapes the document through the configured dialect, serializes it,
//! and hands the bytes to the sink.
//!
//! Collaborators are held as `Arc<dyn Trait>` so one builder can serve
//! concurrent runs; every run allocates its own
//! [`GenerationState`](crate::GenerationState).
//!
//! ```rust
//! use smap_core::{
//!     ContentTree, HostBinding, MemorySink, NodeId, SiteConfig, SitemapBuilder, SitemapRequest,
//! };
//! use std::sync::Arc;
//!
//! let tree = Arc::new(ContentTree::from_toml_str(r#"
//! [[nodes]]
//! id = 1
//! [[nodes.variants]]
//! language = "en"
//!
//! [[nodes]]
//! id = 2
//! parent = 1
//! segment = "about"
//! [[nodes.variants]]
//! language = "en"
//! "#)?);
//! let sites = vec![SiteConfig {
//!     name: "main".into(),
//!     site_url: "https://example.com/".into(),
//!     start_node: NodeId(1),
//!     hosts: vec![HostBinding::new("example.com", Some("en"))],
//! }];
//! let sink = Arc::new(MemorySink::new());
//!
//! let builder = SitemapBuilder::new(tree.clone(), tree, Arc::new(sites), sink.clone());
//! let outcome = builder.generate(&SitemapRequest::new("https://example.com/"));
//!
//! assert!(outcome.success);
//! assert_eq!(outcome.entry_count, 2);
//! assert!(sink.last().unwrap().xml_str()?.contains("<loc>https://example.com/about/</loc>"));
//! # Ok::<(), smap_core::Error>(())
//! ```

use crate::cache::{DEFAULT_HOST_CACHE_TTL, HostBindingCache};
use crate::config::DefaultsConfig;
use crate::dialect::{Dialect, ElementStrategy};
use crate::filter::{PageFilter, PathFilter, PublishedPages, RequestRules};
use crate::language_filter::LanguageBranchPolicy;
use crate::repository::{ContentRepository, SiteSource, SitemapSink, UrlResolver};
use crate::state::{GenerationState, MAX_SITEMAP_ENTRIES};
use crate::types::{GenerationOutcome, SiteConfig, SitemapEntry, SitemapRequest};
use crate::url_resolver::UrlNormalizer;
use crate::walker::{ContentTreeWalker, ResolutionPolicy, WalkStats};
use crate::xml::{self, XmlElement};
use crate::{Error, Result};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument};
use url::Url;

/// A serialized sitemap and what went into it.
#[derive(Debug, Clone)]
pub struct GeneratedSitemap {
    /// UTF-8 XML document.
    pub xml: Vec<u8>,
    /// Number of entry elements.
    pub entry_count: usize,
    /// Whether eligible entries were dropped at the cap.
    pub exceeded_cap: bool,
    /// The site the request resolved to; `None` yields an empty document.
    pub site: Option<SiteConfig>,
    /// Language bound to the request's host.
    pub host_language: Option<String>,
    /// Traversal counters.
    pub stats: WalkStats,
}

impl GeneratedSitemap {
    /// The outcome reported to callers of [`SitemapBuilder::generate`].
    pub const fn outcome(&self) -> GenerationOutcome {
        GenerationOutcome {
            success: true,
            entry_count: self.entry_count,
            exceeded_cap: self.exceeded_cap,
        }
    }
}

/// Orchestrates one sitemap generation per call.
pub struct SitemapBuilder {
    repository: Arc<dyn ContentRepository>,
    resolver: Arc<dyn UrlResolver>,
    sites: Arc<dyn SiteSource>,
    sink: Arc<dyn SitemapSink>,
    strategy: Arc<dyn ElementStrategy>,
    page_filter: Arc<dyn PageFilter>,
    path_filter: Arc<dyn PathFilter>,
    resolution_policy: ResolutionPolicy,
    cache: Option<Arc<HostBindingCache>>,
    cache_ttl: Duration,
    include_debug_info: bool,
    entry_ceiling: usize,
}

impl SitemapBuilder {
    /// Builder with the standard dialect, [`PublishedPages`], the request's
    /// own path rules, [`ResolutionPolicy::Skip`], and a per-run cache.
    pub fn new(
        repository: Arc<dyn ContentRepository>,
        resolver: Arc<dyn UrlResolver>,
        sites: Arc<dyn SiteSource>,
        sink: Arc<dyn SitemapSink>,
    ) -> Self {
        Self {
            repository,
            resolver,
            sites,
            sink,
            strategy: Dialect::Standard.strategy(),
            page_filter: Arc::new(PublishedPages),
            path_filter: Arc::new(RequestRules),
            resolution_policy: ResolutionPolicy::Skip,
            cache: None,
            cache_ttl: DEFAULT_HOST_CACHE_TTL,
            include_debug_info: false,
            entry_ceiling: MAX_SITEMAP_ENTRIES,
        }
    }

    /// Apply configured defaults. The cache stays per run; only its TTL is
    /// taken from `defaults`.
    #[must_use]
    pub fn with_defaults(self, defaults: &DefaultsConfig) -> Self {
        self.with_dialect(defaults.dialect)
            .with_resolution_policy(defaults.resolution_policy)
            .with_debug_info(defaults.include_debug_info)
            .with_cache_ttl(Duration::from_secs(defaults.host_cache_ttl_secs))
    }

    /// Use a named dialect.
    #[must_use]
    pub fn with_dialect(self, dialect: Dialect) -> Self {
        self.with_strategy(dialect.strategy())
    }

    /// Use a custom element strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Arc<dyn ElementStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Replace the page exclusion rules.
    #[must_use]
    pub fn with_page_filter(mut self, filter: Arc<dyn PageFilter>) -> Self {
        self.page_filter = filter;
        self
    }

    /// Replace the path exclusion rules.
    #[must_use]
    pub fn with_path_filter(mut self, filter: Arc<dyn PathFilter>) -> Self {
        self.path_filter = filter;
        self
    }

    /// Set the policy for content whose URL cannot be produced.
    #[must_use]
    pub const fn with_resolution_policy(mut self, policy: ResolutionPolicy) -> Self {
        self.resolution_policy = policy;
        self
    }

    /// TTL of the cache created for each run.
    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Share a host-binding cache across runs instead of one per run.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<HostBindingCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Precede each entry with a comment naming its node and language.
    #[must_use]
    pub const fn with_debug_info(mut self, enabled: bool) -> Self {
        self.include_debug_info = enabled;
        self
    }

    #[cfg(test)]
    pub(crate) const fn with_entry_ceiling(mut self, ceiling: usize) -> Self {
        self.entry_ceiling = ceiling;
        self
    }

    /// Generate and persist the sitemap for `request`.
    ///
    /// Never fails and never panics: any error or collaborator panic is
    /// logged and reported as [`GenerationOutcome::failed`].
    pub fn generate(&self, request: &SitemapRequest) -> GenerationOutcome {
        match panic::catch_unwind(AssertUnwindSafe(|| self.try_generate(request))) {
            Ok(Ok(sitemap)) => sitemap.outcome(),
            Ok(Err(err)) => {
                error!(
                    site = %request.site_url,
                    category = err.category(),
                    recoverable = err.is_recoverable(),
                    error = %err,
                    "Sitemap generation failed"
                );
                GenerationOutcome::failed()
            },
            Err(payload) => {
                error!(
                    site = %request.site_url,
                    category = "panic",
                    panic = panic_message(payload.as_ref()),
                    "Sitemap generation panicked"
                );
                GenerationOutcome::failed()
            },
        }
    }

    /// Generate and persist the sitemap for `request`, returning the document.
    #[instrument(skip(self, request), fields(site = %request.site_url, root = ?request.root))]
    pub fn try_generate(&self, request: &SitemapRequest) -> Result<GeneratedSitemap> {
        let request_url = Url::parse(&request.site_url)
            .map_err(|e| Error::InvalidUrl(format!("request URL '{}': {e}", request.site_url)))?;
        let host = request_url
            .host_str()
            .ok_or_else(|| Error::InvalidUrl(format!("request URL '{}' has no host", request.site_url)))?;
        let authority = request_url
            .port()
            .map_or_else(|| host.to_string(), |port| format!("{host}:{port}"));

        let Some(site) = self.resolve_site(request, host, &authority) else {
            debug!("No site configured for request, writing empty sitemap");
            return self.persist(request, Vec::new(), false, None, None, WalkStats::default());
        };

        let host_language = site
            .host_language(&authority)
            .or_else(|| site.host_language(host));
        let root = request.root.unwrap_or(site.start_node);
        debug!(
            site_name = %site.name,
            host_language = ?host_language,
            root = %root,
            "Resolved site"
        );

        let run_cache;
        let cache: &HostBindingCache = if let Some(shared) = &self.cache {
            shared
        } else {
            run_cache = HostBindingCache::new(self.cache_ttl);
            &run_cache
        };

        let mut state = GenerationState::with_ceiling(host_language.clone(), self.entry_ceiling);
        let normalizer = UrlNormalizer::new(self.resolver.as_ref(), &site)?;
        let mut walker = ContentTreeWalker::new(
            self.repository.as_ref(),
            normalizer,
            LanguageBranchPolicy::new(&site, cache),
            request,
        )
        .with_filters(self.page_filter.as_ref(), self.path_filter.as_ref())
        .with_resolution_policy(self.resolution_policy);

        let entries = walker.walk(root, &mut state)?;
        let stats = *walker.stats();
        debug!(
            emitted = state.emitted_count(),
            distinct = state.distinct_urls(),
            exceeded_cap = state.exceeded_cap(),
            duplicates = stats.duplicates,
            language_excluded = walker.language_stats().rejected,
            "Walk complete"
        );

        let exceeded_cap = state.exceeded_cap();
        self.persist(request, entries, exceeded_cap, Some(site), host_language, stats)
    }

    /// Site whose host bindings match the request host, else whose site URL
    /// equals the request URL.
    fn resolve_site(&self, request: &SitemapRequest, host: &str, authority: &str) -> Option<SiteConfig> {
        let sites = self.sites.list_sites();
        let wanted = request.site_url.trim_end_matches('/');

        let by_host = sites.iter().position(|site| {
            site.hosts
                .iter()
                .any(|h| h.matches_host(authority) || h.matches_host(host))
        });
        let index = by_host
            .or_else(|| sites.iter().position(|site| site.site_url.trim_end_matches('/') == wanted))?;
        sites.into_iter().nth(index)
    }

    fn persist(
        &self,
        request: &SitemapRequest,
        entries: Vec<SitemapEntry>,
        exceeded_cap: bool,
        site: Option<SiteConfig>,
        host_language: Option<String>,
        stats: WalkStats,
    ) -> Result<GeneratedSitemap> {
        let document = self.build_document(&entries);
        let xml = xml::to_document(&document)?;
        let entry_count = entries.len();

        self.sink
            .save(&request.site_url, &xml, entry_count, exceeded_cap)?;

        Ok(GeneratedSitemap {
            xml,
            entry_count,
            exceeded_cap,
            site,
            host_language,
            stats,
        })
    }

    fn build_document(&self, entries: &[SitemapEntry]) -> XmlElement {
        let mut root = self.strategy.root_element();
        for entry in entries {
            if self.include_debug_info {
                root.push_comment(format!(
                    "node {} language {}",
                    entry.variant.node,
                    if entry.variant.language.is_empty() {
                        "-"
                    } else {
                        entry.variant.language.as_str()
                    }
                ));
            }
            root.push_child(self.strategy.entry_element(
                &entry.variant,
                &entry.url,
                entry.lastmod_override,
            ));
        }
        root
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
