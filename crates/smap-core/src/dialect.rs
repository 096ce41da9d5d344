//! Sitemap dialects: how the root element and each entry element look.
//!
//! The builder never shapes XML itself. It asks an [`ElementStrategy`] for the
//! root element and for one element per entry, so a new dialect is a new
//! strategy value rather than a new builder.
//!
//! ```rust
//! use smap_core::dialect::{Dialect, ElementStrategy};
//! use smap_core::{LanguageVariant, NodeId};
//!
//! let strategy = Dialect::Mobile.strategy();
//! let root = strategy.root_element();
//! assert_eq!(root.name(), "urlset");
//!
//! let entry = strategy.entry_element(&LanguageVariant::page(NodeId(1), "en"), "https://example.com/", None);
//! assert!(entry.find("mobile:mobile").is_some());
//! ```

use crate::types::LanguageVariant;
use crate::xml::XmlElement;
use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Namespace of the sitemaps.org 0.9 schema.
pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Namespace of the mobile sitemap extension.
pub const MOBILE_NS: &str = "http://www.google.com/schemas/sitemap-mobile/1.0";

/// Produces the elements of one sitemap dialect.
pub trait ElementStrategy: Send + Sync {
    /// The document's root element, without entries.
    fn root_element(&self) -> XmlElement;

    /// The element for one entry. `lastmod_override` wins over the variant's
    /// own modification time.
    fn entry_element(
        &self,
        variant: &LanguageVariant,
        url: &str,
        lastmod_override: Option<DateTime<Utc>>,
    ) -> XmlElement;
}

/// Plain `<urlset>` with `<url>` entries.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardDialect;

impl ElementStrategy for StandardDialect {
    fn root_element(&self) -> XmlElement {
        XmlElement::new("urlset").with_attribute("xmlns", SITEMAP_NS)
    }

    fn entry_element(
        &self,
        variant: &LanguageVariant,
        url: &str,
        lastmod_override: Option<DateTime<Utc>>,
    ) -> XmlElement {
        let mut element = XmlElement::new("url").with_child(XmlElement::new("loc").with_text(url));

        if let Some(lastmod) = lastmod_override.or(variant.changed) {
            element.push_child(XmlElement::new("lastmod").with_text(format_lastmod(lastmod)));
        }
        if let Some(freq) = variant.changefreq {
            element.push_child(XmlElement::new("changefreq").with_text(freq.as_str()));
        }
        if let Some(priority) = variant.priority {
            element.push_child(XmlElement::new("priority").with_text(format_priority(priority)));
        }
        element
    }
}

/// Standard entries tagged with the mobile extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct MobileDialect;

impl ElementStrategy for MobileDialect {
    fn root_element(&self) -> XmlElement {
        StandardDialect
            .root_element()
            .with_attribute("xmlns:mobile", MOBILE_NS)
    }

    fn entry_element(
        &self,
        variant: &LanguageVariant,
        url: &str,
        lastmod_override: Option<DateTime<Utc>>,
    ) -> XmlElement {
        StandardDialect
            .entry_element(variant, url, lastmod_override)
            .with_child(XmlElement::new("mobile:mobile"))
    }
}

/// Named dialects selectable from configuration and the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// sitemaps.org 0.9.
    #[default]
    Standard,
    /// sitemaps.org 0.9 plus the mobile extension.
    Mobile,
}

impl Dialect {
    /// The strategy implementing this dialect.
    pub fn strategy(self) -> Arc<dyn ElementStrategy> {
        match self {
            Self::Standard => Arc::new(StandardDialect),
            Self::Mobile => Arc::new(MobileDialect),
        }
    }

    /// Lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Mobile => "mobile",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "mobile" => Ok(Self::Mobile),
            _ => Err(Error::Parse(format!("Unknown sitemap dialect: {s}"))),
        }
    }
}

/// RFC 3339 with whole seconds and a `Z` suffix.
pub fn format_lastmod(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn format_priority(priority: f32) -> String {
    format!("{:.1}", priority.clamp(0.0, 1.0))
}
