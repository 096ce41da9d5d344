#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use smap_core::{
    ContentRepository, ContentTree, HostBinding, LanguageVariant, MemorySink, NodeId, Result,
    SiteConfig, SitemapBuilder, UrlResolver,
};
use std::sync::Arc;

/// A small multilingual site: home, about, a shop with virtual children,
/// a French-only page, an asset and an unpublished draft.
pub const SAMPLE_TREE: &str = r#"
[[nodes]]
id = 1
segment = "home"
[[nodes.variants]]
language = "en"
[[nodes.variants]]
language = "fr"

[[nodes]]
id = 2
parent = 1
segment = "about"
[[nodes.variants]]
language = "en"
changed = "2024-05-01T09:00:00Z"
changefreq = "monthly"
[[nodes.variants]]
language = "fr"
segment = "a-propos"

[[nodes]]
id = 3
parent = 1
segment = "shop"
sort_order = 1
[[nodes.variants]]
language = "en"
[[nodes.variants.virtual_children]]
suffix = "widgets"
lastmod = "2024-03-01T00:00:00Z"
[[nodes.variants.virtual_children]]
suffix = "gadgets"

[[nodes]]
id = 4
parent = 1
segment = "nouvelles"
sort_order = 2
[[nodes.variants]]
language = "fr"

[[nodes]]
id = 5
parent = 1
segment = "brochure.pdf"
sort_order = 3
[[nodes.variants]]
kind = "asset"

[[nodes]]
id = 6
parent = 1
segment = "draft"
sort_order = 4
[[nodes.variants]]
language = "en"
published = false
"#;

pub fn sample_tree() -> Arc<ContentTree> {
    Arc::new(ContentTree::from_toml_str(SAMPLE_TREE).expect("sample tree parses"))
}

/// `example.com` serves English, `example.fr` serves French.
pub fn bilingual_site() -> SiteConfig {
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

/// Only `example.com` is bound, so French content is served there too.
pub fn english_only_site() -> SiteConfig {
    SiteConfig {
        hosts: vec![HostBinding::new("example.com", Some("en"))],
        ..bilingual_site()
    }
}

pub fn builder(site: SiteConfig, sink: Arc<MemorySink>) -> SitemapBuilder {
    let tree = sample_tree();
    SitemapBuilder::new(tree.clone(), tree, Arc::new(vec![site]), sink)
}

/// Text of every `<loc>` element, in document order.
pub fn locs(xml: &[u8]) -> Vec<String> {
    let text = std::str::from_utf8(xml).expect("sitemap is UTF-8");
    text.split("<loc>")
        .skip(1)
        .map(|s| s.split("</loc>").next().unwrap_or_default().to_string())
        .collect()
}

/// Flat site with one start node and `pages` English children, each
/// resolving to `/p{id}/`.
#[derive(Debug)]
pub struct FlatSite {
    pages: u64,
}

pub const FLAT_START: NodeId = NodeId(1);

impl FlatSite {
    pub const fn new(pages: u64) -> Self {
        Self { pages }
    }

    pub fn site() -> SiteConfig {
        SiteConfig {
            name: "flat".into(),
            site_url: "https://flat.example/".into(),
            start_node: FLAT_START,
            hosts: vec![HostBinding::new("flat.example", Some("en"))],
        }
    }

    pub fn builder(pages: u64, sink: Arc<MemorySink>) -> SitemapBuilder {
        let repo = Arc::new(Self::new(pages));
        SitemapBuilder::new(repo.clone(), repo, Arc::new(vec![Self::site()]), sink)
    }
}

impl ContentRepository for FlatSite {
    fn root_node(&self) -> NodeId {
        NodeId(0)
    }

    fn descendants(&self, node: NodeId) -> Result<Vec<NodeId>> {
        if node == FLAT_START {
            Ok((2..self.pages + 2).map(NodeId).collect())
        } else {
            Ok(Vec::new())
        }
    }

    fn language_variants(&self, node: NodeId) -> Result<Vec<LanguageVariant>> {
        Ok(vec![LanguageVariant::page(node, "en")])
    }
}

impl UrlResolver for FlatSite {
    fn resolve(&self, variant: &LanguageVariant, _language: Option<&str>) -> Result<String> {
        if variant.node == FLAT_START {
            Ok("/".to_string())
        } else {
            Ok(format!("/p{}/", variant.node))
        }
    }
}
