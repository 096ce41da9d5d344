//! Traversal of the content tree into an ordered list of sitemap entries.
//!
//! For every node (the root first unless it is the tree's absolute top, then
//! its descendants in repository order) and every language variant of it, the
//! walker runs the pipeline:
//!
//! 1. language exclusion (page-kind variants only)
//! 2. page exclusion rules
//! 3. URL normalization
//! 4. path exclusion rules on the normalized path
//! 5. deduplication, then cap reservation
//! 6. virtual child expansion
//!
//! Steps 1, 2, 4 and the duplicate half of 5 drop the variant silently and
//! cost no budget. Once the budget is spent, traversal ends before the next
//! node or variant is looked at.

use crate::expand::{expand_virtual_children, Flow};
use crate::filter::{PageFilter, PathFilter, PublishedPages, RequestRules};
use crate::language_filter::{LanguageBranchPolicy, LanguageStats};
use crate::repository::ContentRepository;
use crate::state::{Admission, GenerationState};
use crate::types::{LanguageVariant, NodeId, SitemapEntry, SitemapRequest};
use crate::url_resolver::UrlNormalizer;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// What to do when a single content item cannot be given a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionPolicy {
    /// Log a warning, drop the item, and keep walking.
    #[default]
    Skip,
    /// Fail the whole run.
    Abort,
}

impl std::str::FromStr for ResolutionPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "abort" => Ok(Self::Abort),
            _ => Err(Error::Parse(format!("Invalid resolution policy: {s}"))),
        }
    }
}

/// Counters describing one traversal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WalkStats {
    /// Nodes whose variants were enumerated.
    pub nodes_visited: usize,
    /// Variants offered to the pipeline.
    pub variants_seen: usize,
    /// Page variants left out because another host serves their language.
    pub language_excluded: usize,
    /// Variants rejected by the page filter.
    pub page_excluded: usize,
    /// Variants whose normalized path was filtered.
    pub path_filtered: usize,
    /// Variants whose URL had already been emitted.
    pub duplicates: usize,
    /// Variants skipped because their URL could not be produced.
    pub unresolved: usize,
}

/// Drives the generation pipeline over one content subtree.
pub struct ContentTreeWalker<'a> {
    repository: &'a dyn ContentRepository,
    normalizer: UrlNormalizer<'a>,
    language_policy: LanguageBranchPolicy<'a>,
    request: &'a SitemapRequest,
    page_filter: &'a dyn PageFilter,
    path_filter: &'a dyn PathFilter,
    resolution_policy: ResolutionPolicy,
    stats: WalkStats,
}

impl<'a> ContentTreeWalker<'a> {
    /// Walker using [`PublishedPages`], the request's own path rules, and
    /// [`ResolutionPolicy::Skip`].
    pub fn new(
        repository: &'a dyn ContentRepository,
        normalizer: UrlNormalizer<'a>,
        language_policy: LanguageBranchPolicy<'a>,
        request: &'a SitemapRequest,
    ) -> Self {
        Self {
            repository,
            normalizer,
            language_policy,
            request,
            page_filter: &PublishedPages,
            path_filter: &RequestRules,
            resolution_policy: ResolutionPolicy::Skip,
            stats: WalkStats::default(),
        }
    }

    /// Replace the page and path exclusion rules.
    #[must_use]
    pub fn with_filters(
        mut self,
        page_filter: &'a dyn PageFilter,
        path_filter: &'a dyn PathFilter,
    ) -> Self {
        self.page_filter = page_filter;
        self.path_filter = path_filter;
        self
    }

    /// Set the policy for items whose URL cannot be produced.
    #[must_use]
    pub const fn with_resolution_policy(mut self, policy: ResolutionPolicy) -> Self {
        self.resolution_policy = policy;
        self
    }

    /// Walk `root` and its descendants, recording emissions in `state`.
    ///
    /// Returns the entries accumulated up to the point the cap was hit, or
    /// all of them when it never was.
    pub fn walk(&mut self, root: NodeId, state: &mut GenerationState) -> Result<Vec<SitemapEntry>> {
        let mut nodes = Vec::new();
        if root != self.repository.root_node() {
            nodes.push(root);
        }
        nodes.extend(self.repository.descendants(root)?);

        debug!(root = %root, nodes = nodes.len(), "Walking content tree");

        let mut entries = Vec::new();
        for node in nodes {
            if state.close_if_full() {
                log_cap_reached(node, state);
                return Ok(entries);
            }
            self.stats.nodes_visited += 1;
            for variant in self.repository.language_variants(node)? {
                if state.close_if_full()
                    || self.visit(variant, state, &mut entries)? == Flow::Stop
                {
                    log_cap_reached(node, state);
                    return Ok(entries);
                }
            }
        }

        Ok(entries)
    }

    fn visit(
        &mut self,
        variant: LanguageVariant,
        state: &mut GenerationState,
        entries: &mut Vec<SitemapEntry>,
    ) -> Result<Flow> {
        self.stats.variants_seen += 1;

        if variant.is_page()
            && self
                .language_policy
                .should_exclude(&variant, state.host_language())
        {
            self.stats.language_excluded += 1;
            return Ok(Flow::Continue);
        }

        if self.page_filter.should_exclude(&variant) {
            self.stats.page_excluded += 1;
            return Ok(Flow::Continue);
        }

        let url = match self.normalizer.resolve(&variant, state.host_language()) {
            Ok(url) => url,
            Err(err) => return self.on_unresolved(&variant, err),
        };

        if self.path_filter.is_filtered(url.path(), self.request) {
            self.stats.path_filtered += 1;
            return Ok(Flow::Continue);
        }

        match state.admit(url.as_str()) {
            Admission::Admitted => {},
            Admission::Duplicate => {
                self.stats.duplicates += 1;
                return Ok(Flow::Continue);
            },
            Admission::CapReached => return Ok(Flow::Stop),
        }

        let url = String::from(url);
        if variant.virtual_child_provider().is_none() {
            entries.push(SitemapEntry {
                url,
                lastmod_override: None,
                variant,
            });
            return Ok(Flow::Continue);
        }

        entries.push(SitemapEntry {
            url: url.clone(),
            lastmod_override: None,
            variant: variant.clone(),
        });
        match expand_virtual_children(&variant, &url, state, entries) {
            Ok(flow) => Ok(flow),
            Err(err) => self.on_unresolved(&variant, err),
        }
    }

    fn on_unresolved(&mut self, variant: &LanguageVariant, err: Error) -> Result<Flow> {
        if self.resolution_policy == ResolutionPolicy::Abort || !err.is_entry_level() {
            return Err(err);
        }
        self.stats.unresolved += 1;
        warn!(
            node = %variant.node,
            language = %variant.language,
            error = %err,
            "Skipping content item without a usable URL"
        );
        Ok(Flow::Continue)
    }

    /// Traversal counters so far.
    pub const fn stats(&self) -> &WalkStats {
        &self.stats
    }

    /// Language exclusion counters so far.
    pub const fn language_stats(&self) -> &LanguageStats {
        self.language_policy.stats()
    }
}

fn log_cap_reached(node: NodeId, state: &GenerationState) {
    debug!(
        node = %node,
        emitted = state.emitted_count(),
        "Entry cap reached, stopping traversal"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cache::HostBindingCache;
    use crate::repository::{UrlResolver, VirtualChildProvider};
    use crate::types::{HostBinding, SiteConfig, UrlFilterRules, VirtualChild};
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Flat fixture: `children` lists descendants per root in order, and
    /// every variant resolves to its `url` field.
    #[derive(Default)]
    struct Fixture {
        top: NodeId,
        children: HashMap<NodeId, Vec<NodeId>>,
        variants: HashMap<NodeId, Vec<LanguageVariant>>,
    }

    impl Fixture {
        fn page(mut self, node: u64, lang: &str, url: &str) -> Self {
            let mut variant = LanguageVariant::page(NodeId(node), lang);
            variant.url = Some(url.to_string());
            self.variants.entry(NodeId(node)).or_default().push(variant);
            self
        }

        fn variant(mut self, variant: LanguageVariant) -> Self {
            self.variants.entry(variant.node).or_default().push(variant);
            self
        }

        fn under(mut self, root: u64, nodes: &[u64]) -> Self {
            self.children
                .insert(NodeId(root), nodes.iter().copied().map(NodeId).collect());
            self
        }
    }

    impl ContentRepository for Fixture {
        fn root_node(&self) -> NodeId {
            self.top
        }

        fn descendants(&self, node: NodeId) -> Result<Vec<NodeId>> {
            Ok(self.children.get(&node).cloned().unwrap_or_default())
        }

        fn language_variants(&self, node: NodeId) -> Result<Vec<LanguageVariant>> {
            Ok(self.variants.get(&node).cloned().unwrap_or_default())
        }
    }

    impl UrlResolver for Fixture {
        fn resolve(&self, variant: &LanguageVariant, _: Option<&str>) -> Result<String> {
            variant.url.clone().ok_or(Error::Resolution {
                node: variant.node.0,
                reason: "no route".into(),
            })
        }
    }

    #[derive(Debug)]
    struct TwoChildren;

    impl VirtualChildProvider for TwoChildren {
        fn virtual_children(&self) -> Result<Vec<VirtualChild>> {
            Ok(vec![
                VirtualChild {
                    suffix: "/a".into(),
                    lastmod: None,
                },
                VirtualChild {
                    suffix: "/b".into(),
                    lastmod: None,
                },
            ])
        }
    }

    fn site() -> SiteConfig {
        SiteConfig {
            name: "main".into(),
            site_url: "https://example.com/".into(),
            start_node: NodeId(1),
            hosts: vec![
                HostBinding::new("example.com", Some("en")),
                HostBinding::new("example.fr", Some("fr")),
            ],
        }
    }

    fn run(
        fixture: &Fixture,
        request: &SitemapRequest,
        root: u64,
        state: &mut GenerationState,
        policy: ResolutionPolicy,
    ) -> Result<(Vec<String>, WalkStats)> {
        let site = site();
        let cache = HostBindingCache::default();
        let normalizer = UrlNormalizer::new(fixture, &site)?;
        let mut walker = ContentTreeWalker::new(
            fixture,
            normalizer,
            LanguageBranchPolicy::new(&site, &cache),
            request,
        )
        .with_resolution_policy(policy);
        let entries = walker.walk(NodeId(root), state)?;
        Ok((entries.into_iter().map(|e| e.url).collect(), *walker.stats()))
    }

    fn urls(fixture: &Fixture, root: u64, host_lang: Option<&str>) -> Vec<String> {
        let request = SitemapRequest::new("https://example.com/");
        let mut state = GenerationState::new(host_lang.map(str::to_string));
        run(fixture, &request, root, &mut state, ResolutionPolicy::Skip)
            .unwrap()
            .0
    }

    #[test]
    fn test_root_is_included_unless_absolute_top() {
        let fixture = Fixture::default()
            .page(1, "en", "/r/")
            .page(2, "en", "/r/one/")
            .page(3, "en", "/r/two/")
            .under(1, &[2, 3]);

        assert_eq!(
            urls(&fixture, 1, None),
            [
                "https://example.com/r/",
                "https://example.com/r/one/",
                "https://example.com/r/two/"
            ]
        );

        let fixture = Fixture {
            top: NodeId(1),
            ..fixture
        };
        assert_eq!(
            urls(&fixture, 1, None),
            ["https://example.com/r/one/", "https://example.com/r/two/"]
        );
    }

    #[test]
    fn test_language_prefix_and_exclusion() {
        let fixture = Fixture::default()
            .page(2, "en", "/en/about/")
            .page(2, "fr", "/fr/a-propos/")
            .page(2, "de", "/de/ueber/");

        assert_eq!(
            urls(&fixture, 2, Some("en")),
            ["https://example.com/about/", "https://example.com/de/ueber/"]
        );
    }

    #[test]
    fn test_assets_skip_language_exclusion() {
        let mut asset = LanguageVariant::asset(NodeId(4));
        asset.language = "fr".into();
        asset.url = Some("/assets/doc.pdf".into());
        let fixture = Fixture::default().variant(asset);

        assert_eq!(
            urls(&fixture, 4, Some("en")),
            ["https://example.com/assets/doc.pdf"]
        );
    }

    #[test]
    fn test_duplicates_and_filters_cost_no_budget() {
        let mut hidden = LanguageVariant::page(NodeId(5), "en");
        hidden.published = false;
        hidden.url = Some("/hidden/".into());
        let fixture = Fixture::default()
            .page(1, "en", "/a/")
            .page(2, "en", "https://other.com/a/")
            .page(3, "en", "/private/x/")
            .page(4, "en", "/b/")
            .variant(hidden)
            .under(1, &[2, 3, 5, 4]);

        let request = SitemapRequest::new("https://example.com/")
            .with_filter_rules(UrlFilterRules::excluding(["/private/"]));
        let mut state = GenerationState::with_ceiling(None, 2);
        let (urls, stats) = run(&fixture, &request, 1, &mut state, ResolutionPolicy::Skip).unwrap();

        assert_eq!(urls, ["https://example.com/a/", "https://example.com/b/"]);
        assert!(!state.exceeded_cap());
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.path_filtered, 1);
        assert_eq!(stats.page_excluded, 1);
    }

    #[test]
    fn test_cap_stops_traversal() {
        let fixture = Fixture::default()
            .page(1, "en", "/a/")
            .page(2, "en", "/b/")
            .page(3, "en", "/c/")
            .under(1, &[2, 3]);

        let request = SitemapRequest::new("https://example.com/");
        let mut state = GenerationState::with_ceiling(None, 2);
        let (urls, _) = run(&fixture, &request, 1, &mut state, ResolutionPolicy::Skip).unwrap();

        assert_eq!(urls.len(), 2);
        assert!(state.exceeded_cap());
        assert_eq!(state.emitted_count(), 2);
    }

    #[test]
    fn test_full_budget_stops_before_next_node() {
        let fixture = Fixture::default()
            .page(1, "en", "/a/")
            .variant(LanguageVariant::page(NodeId(2), "en"))
            .under(1, &[2]);

        let request = SitemapRequest::new("https://example.com/");
        let mut state = GenerationState::with_ceiling(None, 1);
        let (urls, stats) =
            run(&fixture, &request, 1, &mut state, ResolutionPolicy::Abort).unwrap();

        assert_eq!(urls, ["https://example.com/a/"]);
        assert!(state.exceeded_cap());
        assert_eq!(stats.nodes_visited, 1);
        assert_eq!(stats.unresolved, 0);
    }

    #[test]
    fn test_full_budget_stops_before_next_variant() {
        let fixture = Fixture::default()
            .page(1, "en", "/a/")
            .variant(LanguageVariant::page(NodeId(1), "de"));

        let request = SitemapRequest::new("https://example.com/");
        let mut state = GenerationState::with_ceiling(None, 1);
        let (urls, stats) =
            run(&fixture, &request, 1, &mut state, ResolutionPolicy::Abort).unwrap();

        assert_eq!(urls, ["https://example.com/a/"]);
        assert!(state.exceeded_cap());
        assert_eq!(stats.variants_seen, 1);
    }

    #[test]
    fn test_exactly_full_without_more_content_is_not_exceeded() {
        let fixture = Fixture::default()
            .page(1, "en", "/a/")
            .page(2, "en", "/b/")
            .under(1, &[2]);

        let request = SitemapRequest::new("https://example.com/");
        let mut state = GenerationState::with_ceiling(None, 2);
        let (urls, _) = run(&fixture, &request, 1, &mut state, ResolutionPolicy::Skip).unwrap();

        assert_eq!(urls.len(), 2);
        assert!(!state.exceeded_cap());
    }

    #[test]
    fn test_virtual_children_follow_parent() {
        let mut parent = LanguageVariant::page(NodeId(2), "en");
        parent.url = Some("/page/".into());
        parent.virtual_children = Some(Arc::new(TwoChildren));
        let fixture = Fixture::default()
            .page(1, "en", "/")
            .variant(parent)
            .page(3, "en", "/after/")
            .under(1, &[2, 3]);

        assert_eq!(
            urls(&fixture, 1, None),
            [
                "https://example.com/",
                "https://example.com/page/",
                "https://example.com/page/a/",
                "https://example.com/page/b/",
                "https://example.com/after/"
            ]
        );
    }

    #[test]
    fn test_virtual_children_hit_cap() {
        let mut parent = LanguageVariant::page(NodeId(2), "en");
        parent.url = Some("/page/".into());
        parent.virtual_children = Some(Arc::new(TwoChildren));
        let fixture = Fixture::default()
            .variant(parent)
            .page(3, "en", "/after/")
            .under(2, &[3]);

        let request = SitemapRequest::new("https://example.com/");
        let mut state = GenerationState::with_ceiling(None, 2);
        let (urls, _) = run(&fixture, &request, 2, &mut state, ResolutionPolicy::Skip).unwrap();

        assert_eq!(
            urls,
            ["https://example.com/page/", "https://example.com/page/a/"]
        );
        assert!(state.exceeded_cap());
    }

    #[test]
    fn test_unresolvable_item_is_skipped_by_default() {
        let fixture = Fixture::default()
            .page(1, "en", "/a/")
            .variant(LanguageVariant::page(NodeId(2), "en"))
            .page(3, "en", "/c/")
            .under(1, &[2, 3]);

        let request = SitemapRequest::new("https://example.com/");
        let mut state = GenerationState::new(None);
        let (urls, stats) = run(&fixture, &request, 1, &mut state, ResolutionPolicy::Skip).unwrap();

        assert_eq!(urls, ["https://example.com/a/", "https://example.com/c/"]);
        assert_eq!(stats.unresolved, 1);
    }

    #[test]
    fn test_unresolvable_item_aborts_when_configured() {
        let fixture = Fixture::default()
            .page(1, "en", "/a/")
            .variant(LanguageVariant::page(NodeId(2), "en"))
            .under(1, &[2]);

        let request = SitemapRequest::new("https://example.com/");
        let mut state = GenerationState::new(None);
        let err = run(&fixture, &request, 1, &mut state, ResolutionPolicy::Abort).unwrap_err();

        assert!(matches!(err, Error::Resolution { node: 2, .. }));
    }

    #[test]
    fn test_resolution_policy_parsing() {
        assert_eq!("skip".parse::<ResolutionPolicy>().unwrap(), ResolutionPolicy::Skip);
        assert_eq!("ABORT".parse::<ResolutionPolicy>().unwrap(), ResolutionPolicy::Abort);
        assert!("retry".parse::<ResolutionPolicy>().is_err());
        assert_eq!(ResolutionPolicy::default(), ResolutionPolicy::Skip);
    }
}
