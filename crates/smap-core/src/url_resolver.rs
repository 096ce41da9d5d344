//! Canonicalization of resolver output into absolute, site-scoped URLs.
//!
//! Whatever the routing collaborator returns, the emitted URL always lives on
//! the site's own origin:
//!
//! - relative output (`/foo/bar`) is joined onto the site's scheme and host
//! - absolute output on another host (`https://other.com/foo/bar`) keeps only
//!   its path and query, re-rooted on the site's origin
//! - when the host's default language equals the variant's language, the
//!   first `/{language}/` path segment is removed
//!
//! ```rust
//! use smap_core::{LanguageVariant, NodeId, Result, SiteConfig, UrlNormalizer, UrlResolver};
//!
//! struct Fixed(&'static str);
//! impl UrlResolver for Fixed {
//!     fn resolve(&self, _: &LanguageVariant, _: Option<&str>) -> Result<String> {
//!         Ok(self.0.to_string())
//!     }
//! }
//!
//! let site = SiteConfig {
//!     name: String::new(),
//!     site_url: "https://example.com".into(),
//!     start_node: NodeId(1),
//!     hosts: vec![],
//! };
//! let variant = LanguageVariant::page(NodeId(2), "en");
//!
//! let normalizer = UrlNormalizer::new(&Fixed("https://other.com/foo/bar"), &site)?;
//! assert_eq!(normalizer.resolve(&variant, None)?.as_str(), "https://example.com/foo/bar");
//!
//! let normalizer = UrlNormalizer::new(&Fixed("/en/about/"), &site)?;
//! assert_eq!(normalizer.resolve(&variant, Some("en"))?.as_str(), "https://example.com/about/");
//! # Ok::<(), smap_core::Error>(())
//! ```

use crate::repository::UrlResolver;
use crate::types::{LanguageVariant, SiteConfig};
use crate::{Error, Result};
use url::{ParseError, Position, Url};

/// Turns content items into canonical absolute URLs for one site.
pub struct UrlNormalizer<'a> {
    resolver: &'a dyn UrlResolver,
    base: Url,
}

impl<'a> UrlNormalizer<'a> {
    /// Normalizer bound to `site`'s scheme and host.
    pub fn new(resolver: &'a dyn UrlResolver, site: &SiteConfig) -> Result<Self> {
        let mut base = site.base_url()?;
        base.set_path("/");
        base.set_query(None);
        base.set_fragment(None);
        Ok(Self { resolver, base })
    }

    /// The origin every emitted URL is forced onto.
    pub const fn base(&self) -> &Url {
        &self.base
    }

    /// Resolve `variant` into its canonical absolute URL.
    ///
    /// Page-kind content is resolved within its own language branch; other
    /// content is resolved without language scoping.
    pub fn resolve(&self, variant: &LanguageVariant, host_language: Option<&str>) -> Result<Url> {
        let language = (variant.is_page() && !variant.language.is_empty())
            .then_some(variant.language.as_str());
        let raw = self.resolver.resolve(variant, language)?;
        let mut url = self.rebase(raw.trim())?;

        if let (Some(lang), Some(host_lang)) = (language, host_language) {
            if lang.eq_ignore_ascii_case(host_lang) {
                let stripped = strip_language_segment(url.path(), lang);
                url.set_path(&stripped);
            }
        }

        Ok(url)
    }

    /// Re-root `raw` onto the site origin.
    fn rebase(&self, raw: &str) -> Result<Url> {
        if raw.is_empty() {
            return Err(Error::InvalidUrl("resolver returned an empty URL".into()));
        }

        let joined = match Url::parse(raw) {
            Ok(absolute) => {
                if absolute.cannot_be_a_base() || absolute.host_str().is_none() {
                    return Err(Error::InvalidUrl(format!("'{raw}' is not a web URL")));
                }
                self.base.join(&absolute[Position::BeforePath..Position::AfterQuery])?
            },
            Err(ParseError::RelativeUrlWithoutBase) => self.base.join(raw)?,
            Err(e) => return Err(Error::InvalidUrl(format!("'{raw}': {e}"))),
        };

        // A protocol-relative reference would otherwise escape the site origin.
        let mut url = self.base.clone();
        url.set_path(joined.path());
        url.set_query(joined.query());
        Ok(url)
    }
}

/// Replace the first `/{language}/` segment of `path` with `/`.
///
/// A path consisting of just `/{language}` becomes `/`.
fn strip_language_segment(path: &str, language: &str) -> String {
    let needle = format!("/{}/", language.to_ascii_lowercase());
    let lowered = path.to_ascii_lowercase();

    if let Some(idx) = lowered.find(&needle) {
        let mut out = String::with_capacity(path.len());
        out.push_str(&path[..idx]);
        out.push('/');
        out.push_str(&path[idx + needle.len()..]);
        return out;
    }
    if lowered == needle.trim_end_matches('/') {
        return "/".to_string();
    }
    path.to_string()
}
