//! Path and page exclusion rules.
//!
//! Two independent checks keep content out of a sitemap:
//!
//! - [`PageFilter`] looks at the content item itself (unpublished,
//!   access-restricted, editorially excluded) before its URL is resolved.
//! - [`PathFilter`] looks at the normalized URL path against the request's
//!   [`UrlFilterRules`].
//!
//! Both are silent: a filtered item is dropped like a duplicate and consumes no
//! entry budget.
//!
//! ```rust
//! use smap_core::filter::matches_path_prefix;
//!
//! assert!(matches_path_prefix("/news/2024/", "/news"));
//! assert!(matches_path_prefix("/NEWS/", "news/"));
//! assert!(!matches_path_prefix("/newsletter/", "/news"));
//! ```

use crate::types::{LanguageVariant, SitemapRequest, UrlFilterRules};

/// Decides whether a normalized URL path is left out of the sitemap.
pub trait PathFilter: Send + Sync {
    /// `true` if `path` must be dropped for `request`.
    fn is_filtered(&self, path: &str, request: &SitemapRequest) -> bool;
}

/// Decides whether a content item is left out before its URL is resolved.
pub trait PageFilter: Send + Sync {
    /// `true` if `variant` must be dropped.
    fn should_exclude(&self, variant: &LanguageVariant) -> bool;
}

/// Applies the request's own [`UrlFilterRules`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestRules;

impl PathFilter for RequestRules {
    fn is_filtered(&self, path: &str, request: &SitemapRequest) -> bool {
        is_path_filtered(path, &request.url_filter_rules)
    }
}

/// Excludes unpublished, access-restricted, and opted-out variants.
#[derive(Debug, Default, Clone, Copy)]
pub struct PublishedPages;

impl PageFilter for PublishedPages {
    fn should_exclude(&self, variant: &LanguageVariant) -> bool {
        !variant.published || variant.access_restricted || variant.exclude_from_sitemap
    }
}

/// Evaluate `rules` against a URL path.
///
/// A path is filtered when it matches any exclusion prefix, or when inclusion
/// prefixes are configured and it matches none of them.
#[must_use]
pub fn is_path_filtered(path: &str, rules: &UrlFilterRules) -> bool {
    if rules
        .exclude
        .iter()
        .any(|pattern| matches_path_prefix(path, pattern))
    {
        return true;
    }

    !rules.include.is_empty()
        && !rules
            .include
            .iter()
            .any(|pattern| matches_path_prefix(path, pattern))
}

/// Case-insensitive path prefix match on segment boundaries.
///
/// Patterns are treated as rooted (`news/` behaves like `/news/`). A pattern
/// without a trailing slash only matches whole segments, so `/news` matches
/// `/news`, `/news/` and `/news?x`, but not `/newsletter/`. Empty patterns
/// never match.
#[must_use]
pub fn matches_path_prefix(path: &str, pattern: &str) -> bool {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return false;
    }

    let pattern = if pattern.starts_with('/') {
        pattern.to_lowercase()
    } else {
        format!("/{}", pattern.to_lowercase())
    };
    let path = path.to_lowercase();

    if pattern.ends_with('/') {
        return path.starts_with(&pattern);
    }

    path.strip_prefix(&pattern).is_some_and(|rest| {
        rest.is_empty() || rest.starts_with('/') || rest.starts_with('?') || rest.starts_with('#')
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeId;

    fn request(exclude: &[&str], include: &[&str]) -> SitemapRequest {
        SitemapRequest::new("https://example.com").with_filter_rules(UrlFilterRules {
            exclude: exclude.iter().map(ToString::to_string).collect(),
            include: include.iter().map(ToString::to_string).collect(),
        })
    }

    #[test]
    fn test_no_rules_filters_nothing() {
        let req = request(&[], &[]);
        assert!(!RequestRules.is_filtered("/anything/", &req));
        assert!(!RequestRules.is_filtered("/", &req));
    }

    #[test]
    fn test_exclusion_prefix() {
        let req = request(&["/internal/"], &[]);
        assert!(RequestRules.is_filtered("/internal/", &req));
        assert!(RequestRules.is_filtered("/internal/tools/", &req));
        assert!(!RequestRules.is_filtered("/internals/", &req));
        assert!(!RequestRules.is_filtered("/about/internal/", &req));
    }

    #[test]
    fn test_exclusion_is_case_insensitive() {
        let req = request(&["/Search"], &[]);
        assert!(RequestRules.is_filtered("/search/", &req));
        assert!(RequestRules.is_filtered("/SEARCH", &req));
    }

    #[test]
    fn test_segment_boundaries_without_trailing_slash() {
        assert!(matches_path_prefix("/news", "/news"));
        assert!(matches_path_prefix("/news/", "/news"));
        assert!(matches_path_prefix("/news?page=2", "/news"));
        assert!(!matches_path_prefix("/newsletter/", "/news"));
    }

    #[test]
    fn test_unrooted_patterns() {
        assert!(matches_path_prefix("/shop/cart/", "shop/"));
        assert!(!matches_path_prefix("/about/shop/", "shop/"));
    }

    #[test]
    fn test_empty_pattern_never_matches() {
        assert!(!matches_path_prefix("/", ""));
        assert!(!matches_path_prefix("/a/", "   "));
    }

    #[test]
    fn test_inclusion_restricts_to_prefixes() {
        let req = request(&[], &["/products/", "/support"]);
        assert!(!RequestRules.is_filtered("/products/widget/", &req));
        assert!(!RequestRules.is_filtered("/support/", &req));
        assert!(RequestRules.is_filtered("/about/", &req));
        assert!(RequestRules.is_filtered("/", &req));
    }

    #[test]
    fn test_exclusion_wins_over_inclusion() {
        let req = request(&["/products/legacy/"], &["/products/"]);
        assert!(RequestRules.is_filtered("/products/legacy/x/", &req));
        assert!(!RequestRules.is_filtered("/products/current/", &req));
    }

    #[test]
    fn test_published_pages_filter() {
        let mut variant = LanguageVariant::page(NodeId(1), "en");
        assert!(!PublishedPages.should_exclude(&variant));

        variant.published = false;
        assert!(PublishedPages.should_exclude(&variant));

        variant.published = true;
        variant.access_restricted = true;
        assert!(PublishedPages.should_exclude(&variant));

        variant.access_restricted = false;
        variant.exclude_from_sitemap = true;
        assert!(PublishedPages.should_exclude(&variant));
    }
}
