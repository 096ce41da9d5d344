//! Core data types shared across the generation pipeline.

use crate::repository::VirtualChildProvider;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identifier of a node in the content tree.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a content item is a routable page or some other kind of content.
///
/// Only pages are scoped to a language branch when their URL is resolved,
/// and only pages are subject to host language exclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// A routable page.
    #[default]
    Page,
    /// Media, documents, and other non-page content.
    Asset,
}

/// Change frequency hints for sitemap entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    /// The page changes every time it is accessed.
    Always,
    /// The page changes hourly.
    Hourly,
    /// The page changes daily.
    Daily,
    /// The page changes weekly.
    Weekly,
    /// The page changes monthly.
    Monthly,
    /// The page changes yearly.
    Yearly,
    /// The page is archived and will not change.
    Never,
}

impl ChangeFrequency {
    /// The lowercase token used in the `<changefreq>` element.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

impl std::str::FromStr for ChangeFrequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "never" => Ok(Self::Never),
            _ => Err(Error::Parse(format!("Invalid changefreq value: {s}"))),
        }
    }
}

/// A per-language rendition of a content node.
///
/// The optional [`VirtualChildProvider`] is the statically typed capability
/// through which a page advertises synthetic sub-URLs.
#[derive(Clone, Default)]
pub struct LanguageVariant {
    /// Node this variant belongs to.
    pub node: NodeId,
    /// Language branch, e.g. `en` or `sv`. Empty for unlocalized assets.
    pub language: String,
    /// Page or non-page content.
    pub kind: ContentKind,
    /// Whether the variant is published.
    pub published: bool,
    /// Whether anonymous visitors are denied access.
    pub access_restricted: bool,
    /// Explicit editorial opt-out from sitemaps.
    pub exclude_from_sitemap: bool,
    /// Last modification time, used for `<lastmod>`.
    pub changed: Option<DateTime<Utc>>,
    /// Change frequency hint.
    pub changefreq: Option<ChangeFrequency>,
    /// Priority hint (0.0 to 1.0).
    pub priority: Option<f32>,
    /// Explicit URL override handed to the resolver (may be absolute).
    pub url: Option<String>,
    /// Virtual child capability, if this variant opts in.
    pub virtual_children: Option<Arc<dyn VirtualChildProvider>>,
}

impl LanguageVariant {
    /// Create a published page variant for `language`.
    pub fn page(node: NodeId, language: impl Into<String>) -> Self {
        Self {
            node,
            language: language.into(),
            kind: ContentKind::Page,
            published: true,
            ..Self::default()
        }
    }

    /// Create a published, unlocalized asset variant.
    pub fn asset(node: NodeId) -> Self {
        Self {
            node,
            kind: ContentKind::Asset,
            published: true,
            ..Self::default()
        }
    }

    /// Whether the variant is page-kind content.
    #[must_use]
    pub fn is_page(&self) -> bool {
        self.kind == ContentKind::Page
    }

    /// Capability query for virtual children.
    #[must_use]
    pub fn virtual_child_provider(&self) -> Option<&dyn VirtualChildProvider> {
        self.virtual_children.as_deref()
    }
}

impl fmt::Debug for LanguageVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageVariant")
            .field("node", &self.node)
            .field("language", &self.language)
            .field("kind", &self.kind)
            .field("published", &self.published)
            .field("access_restricted", &self.access_restricted)
            .field("exclude_from_sitemap", &self.exclude_from_sitemap)
            .field("changed", &self.changed)
            .field("url", &self.url)
            .field("virtual_children", &self.virtual_children.is_some())
            .finish_non_exhaustive()
    }
}

/// A synthetic sub-resource advertised by a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualChild {
    /// Path suffix appended to the parent's canonical URL.
    pub suffix: String,
    /// Timestamp override for the generated entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<DateTime<Utc>>,
}

/// Maps a host name to an optional language within one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostBinding {
    /// Host name, optionally with port. `*` marks the wildcard binding.
    pub host_name: String,
    /// Language branch served by default on this host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Whether this is the site's catch-all binding.
    #[serde(default)]
    pub wildcard: bool,
}

impl HostBinding {
    /// Binding for a concrete host.
    pub fn new(host_name: impl Into<String>, language: Option<&str>) -> Self {
        Self {
            host_name: host_name.into(),
            language: language.map(str::to_string),
            wildcard: false,
        }
    }

    /// Catch-all binding.
    pub fn wildcard(language: Option<&str>) -> Self {
        Self {
            host_name: "*".to_string(),
            language: language.map(str::to_string),
            wildcard: true,
        }
    }

    /// Whether this binding is the catch-all binding.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.wildcard || self.host_name == "*"
    }

    /// Case-insensitive host comparison.
    #[must_use]
    pub fn matches_host(&self, host: &str) -> bool {
        !self.is_wildcard() && self.host_name.eq_ignore_ascii_case(host)
    }

    /// Whether this binding targets `language` (case-insensitive).
    #[must_use]
    pub fn targets_language(&self, language: &str) -> bool {
        self.language
            .as_deref()
            .is_some_and(|lang| lang.eq_ignore_ascii_case(language))
    }
}

/// A site definition: canonical URL, start node, and host bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Canonical public URL of the site.
    pub site_url: String,
    /// Start node used when a request does not name a root.
    pub start_node: NodeId,
    /// Host bindings in declaration order.
    #[serde(default)]
    pub hosts: Vec<HostBinding>,
}

impl SiteConfig {
    /// Parse the canonical site URL.
    pub fn base_url(&self) -> Result<url::Url> {
        let url = url::Url::parse(&self.site_url)
            .map_err(|e| Error::InvalidUrl(format!("site URL '{}': {e}", self.site_url)))?;
        if url.host_str().is_none() {
            return Err(Error::InvalidUrl(format!(
                "site URL '{}' has no host",
                self.site_url
            )));
        }
        Ok(url)
    }

    /// Whether any host binding explicitly targets `language`.
    #[must_use]
    pub fn has_binding_for_language(&self, language: &str) -> bool {
        self.hosts.iter().any(|h| h.targets_language(language))
    }

    /// Language bound to `host`, falling back to the wildcard binding.
    #[must_use]
    pub fn host_language(&self, host: &str) -> Option<String> {
        self.hosts
            .iter()
            .find(|h| h.matches_host(host))
            .or_else(|| self.hosts.iter().find(|h| h.is_wildcard()))
            .and_then(|h| h.language.clone())
    }
}

/// Path inclusion and exclusion rules applied to normalized URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlFilterRules {
    /// Ordered exclusion path prefixes.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Ordered inclusion path prefixes. Empty means "everything".
    #[serde(default)]
    pub include: Vec<String>,
}

impl UrlFilterRules {
    /// Rules with only exclusion patterns.
    pub fn excluding<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            exclude: patterns.into_iter().map(Into::into).collect(),
            include: Vec::new(),
        }
    }

    /// Whether no rule is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exclude.is_empty() && self.include.is_empty()
    }
}

/// Input for one generation run. Immutable for the duration of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapRequest {
    /// Absolute URL identifying the site being generated.
    pub site_url: String,
    /// Root node; `None` selects the site's start node.
    pub root: Option<NodeId>,
    /// Path filter rules.
    pub url_filter_rules: UrlFilterRules,
}

impl SitemapRequest {
    /// Request rooted at the site's start node with no filter rules.
    pub fn new(site_url: impl Into<String>) -> Self {
        Self {
            site_url: site_url.into(),
            root: None,
            url_filter_rules: UrlFilterRules::default(),
        }
    }

    /// Set the root node.
    #[must_use]
    pub const fn with_root(mut self, root: NodeId) -> Self {
        self.root = Some(root);
        self
    }

    /// Set the root from a raw identifier where negative means "site start node".
    #[must_use]
    pub fn with_raw_root(mut self, raw: i64) -> Self {
        self.root = u64::try_from(raw).ok().map(NodeId);
        self
    }

    /// Set the path filter rules.
    #[must_use]
    pub fn with_filter_rules(mut self, rules: UrlFilterRules) -> Self {
        self.url_filter_rules = rules;
        self
    }
}

/// One emitted sitemap entry.
#[derive(Debug, Clone)]
pub struct SitemapEntry {
    /// Absolute canonical URL.
    pub url: String,
    /// Timestamp that overrides the variant's own `changed` time.
    pub lastmod_override: Option<DateTime<Utc>>,
    /// The content item the entry was derived from.
    pub variant: LanguageVariant,
}

impl SitemapEntry {
    /// Effective last modification time.
    #[must_use]
    pub fn lastmod(&self) -> Option<DateTime<Utc>> {
        self.lastmod_override.or(self.variant.changed)
    }
}

/// Result of a generation run as seen by callers.
///
/// A failed run is always `success = false, entry_count = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GenerationOutcome {
    /// Whether a sitemap was produced and persisted.
    pub success: bool,
    /// Number of entries in the persisted document.
    pub entry_count: usize,
    /// Whether eligible entries were dropped at the cap.
    pub exceeded_cap: bool,
}

impl GenerationOutcome {
    /// The failure outcome.
    #[must_use]
    pub const fn failed() -> Self {
        Self {
            success: false,
            entry_count: 0,
            exceeded_cap: false,
        }
    }
}
