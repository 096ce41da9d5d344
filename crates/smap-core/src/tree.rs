//! File-backed content tree.
//!
//! [`ContentTree`] is the repository and URL resolver used by the CLI. It is
//! loaded from a TOML or JSON document listing nodes and their language
//! variants:
//!
//! ```toml
//! [[nodes]]
//! id = 1
//! segment = "home"
//!
//! [[nodes.variants]]
//! language = "en"
//!
//! [[nodes]]
//! id = 2
//! parent = 1
//! segment = "about"
//! sort_order = 10
//!
//! [[nodes.variants]]
//! language = "en"
//! changed = "2024-05-01T09:00:00Z"
//!
//! [[nodes.variants]]
//! language = "sv"
//! segment = "om"
//! ```
//!
//! Node `0` is the implicit top of the tree; nodes without a parent hang off
//! it and act as site start nodes. A page resolves to
//! `/{language}/{segments}/`, where `segments` are the path segments below its
//! start node (a variant's own `segment` replaces the node's for that
//! language). Assets resolve to `/assets/{segments}`. A variant `url` is
//! returned verbatim and may be absolute.

use crate::repository::{ContentRepository, UrlResolver, VirtualChildProvider};
use crate::types::{ChangeFrequency, ContentKind, LanguageVariant, NodeId, VirtualChild};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// The implicit top of every [`ContentTree`].
pub const TREE_ROOT: NodeId = NodeId(0);

/// Serialized form of a content tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeDocument {
    /// All nodes, in any order.
    #[serde(default)]
    pub nodes: Vec<NodeDocument>,
}

/// Serialized form of one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    /// Unique, non-zero identifier.
    pub id: NodeId,
    /// Parent node; absent or `0` for start nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    /// URL path segment.
    #[serde(default)]
    pub segment: String,
    /// Position among siblings; ties are broken by id.
    #[serde(default)]
    pub sort_order: i64,
    /// Language variants.
    #[serde(default)]
    pub variants: Vec<VariantDocument>,
}

/// Serialized form of one language variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantDocument {
    /// Language branch; empty for unlocalized content.
    #[serde(default)]
    pub language: String,
    /// Page or asset.
    #[serde(default)]
    pub kind: ContentKind,
    /// Localized segment replacing the node's segment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
    /// Publication flag.
    #[serde(default = "default_published")]
    pub published: bool,
    /// Whether anonymous access is denied.
    #[serde(default)]
    pub access_restricted: bool,
    /// Editorial sitemap opt-out.
    #[serde(default)]
    pub exclude_from_sitemap: bool,
    /// Last modification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed: Option<DateTime<Utc>>,
    /// Change frequency hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changefreq: Option<ChangeFrequency>,
    /// Priority hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<f32>,
    /// Explicit URL, returned verbatim by the resolver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Synthetic sub-URLs rendered under this variant.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub virtual_children: Vec<VirtualChild>,
}

const fn default_published() -> bool {
    true
}

impl Default for VariantDocument {
    fn default() -> Self {
        Self {
            language: String::new(),
            kind: ContentKind::Page,
            segment: None,
            published: true,
            access_restricted: false,
            exclude_from_sitemap: false,
            changed: None,
            changefreq: None,
            priority: None,
            url: None,
            virtual_children: Vec::new(),
        }
    }
}

/// Fixed list of virtual children declared in the tree document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticChildren(Vec<VirtualChild>);

impl StaticChildren {
    /// Provider advertising `children` in order.
    pub const fn new(children: Vec<VirtualChild>) -> Self {
        Self(children)
    }
}

impl VirtualChildProvider for StaticChildren {
    fn virtual_children(&self) -> Result<Vec<VirtualChild>> {
        Ok(self.0.clone())
    }
}

#[derive(Debug)]
struct TreeNode {
    parent: NodeId,
    segment: String,
    localized_segments: HashMap<String, String>,
    variants: Vec<LanguageVariant>,
}

/// In-memory content tree.
#[derive(Debug)]
pub struct ContentTree {
    nodes: HashMap<NodeId, TreeNode>,
    children: HashMap<NodeId, Vec<NodeId>>,
}

impl ContentTree {
    /// Load from `path`; `.json` files are JSON, anything else TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let tree = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }?;
        debug!(path = %path.display(), nodes = tree.len(), "Loaded content tree");
        Ok(tree)
    }

    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let document: TreeDocument = toml::from_str(content)?;
        Self::from_document(document)
    }

    /// Parse a JSON document.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let document: TreeDocument = serde_json::from_str(content)
            .map_err(|e| Error::Parse(format!("Invalid content tree JSON: {e}")))?;
        Self::from_document(document)
    }

    /// Build and validate a tree.
    ///
    /// Rejects id `0`, duplicate ids, unknown parents, and cycles.
    pub fn from_document(document: TreeDocument) -> Result<Self> {
        let mut nodes = HashMap::with_capacity(document.nodes.len());
        let mut order: Vec<(NodeId, i64, NodeId)> = Vec::with_capacity(document.nodes.len());

        for node in document.nodes {
            if node.id == TREE_ROOT {
                return Err(Error::Parse("node id 0 is reserved for the tree root".into()));
            }
            let id = node.id;
            let parent = node.parent.unwrap_or(TREE_ROOT);
            let mut localized_segments = HashMap::new();
            let variants = node
                .variants
                .into_iter()
                .map(|doc| {
                    if let Some(segment) = &doc.segment {
                        localized_segments.insert(doc.language.to_ascii_lowercase(), segment.clone());
                    }
                    into_variant(id, doc)
                })
                .collect();

            let tree_node = TreeNode {
                parent,
                segment: node.segment,
                localized_segments,
                variants,
            };
            if nodes.insert(id, tree_node).is_some() {
                return Err(Error::Parse(format!("duplicate node id {id}")));
            }
            order.push((parent, node.sort_order, id));
        }

        for (parent, _, id) in &order {
            if *parent != TREE_ROOT && !nodes.contains_key(parent) {
                return Err(Error::Parse(format!("node {id} has unknown parent {parent}")));
            }
        }

        order.sort_by_key(|&(parent, sort_order, id)| (parent, sort_order, id));
        let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for (parent, _, id) in order {
            children.entry(parent).or_default().push(id);
        }

        let tree = Self { nodes, children };
        tree.check_acyclic()?;
        Ok(tree)
    }

    fn check_acyclic(&self) -> Result<()> {
        let reachable: HashSet<NodeId> = self.collect_descendants(TREE_ROOT).into_iter().collect();
        if reachable.len() == self.nodes.len() {
            return Ok(());
        }
        let stranded = self
            .nodes
            .keys()
            .filter(|id| !reachable.contains(id))
            .min()
            .copied()
            .unwrap_or_default();
        Err(Error::Parse(format!(
            "cycle in content tree involving node {stranded}"
        )))
    }

    /// Number of nodes, excluding the implicit root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `node` exists. The implicit root always does.
    pub fn contains(&self, node: NodeId) -> bool {
        node == TREE_ROOT || self.nodes.contains_key(&node)
    }

    /// Start nodes, in sibling order.
    pub fn start_nodes(&self) -> &[NodeId] {
        self.children.get(&TREE_ROOT).map_or(&[], Vec::as_slice)
    }

    /// Pre-order traversal below `node`, excluding `node`.
    fn collect_descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self
            .children
            .get(&node)
            .map(|c| c.iter().rev().copied().collect())
            .unwrap_or_default();

        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(kids) = self.children.get(&id) {
                stack.extend(kids.iter().rev().copied());
            }
        }
        out
    }

    /// Segments from the start node (exclusive) down to `node` (inclusive).
    fn path_segments(&self, node: NodeId, language: Option<&str>) -> Result<Vec<&str>> {
        let mut segments = Vec::new();
        let mut current = node;

        loop {
            let tree_node = self.nodes.get(&current).ok_or_else(|| Error::Resolution {
                node: node.0,
                reason: format!("node {current} is not in the content tree"),
            })?;
            if tree_node.parent == TREE_ROOT {
                break;
            }
            let segment = language
                .and_then(|lang| tree_node.localized_segments.get(&lang.to_ascii_lowercase()))
                .unwrap_or(&tree_node.segment);
            let segment = segment.trim_matches('/');
            if !segment.is_empty() {
                segments.push(segment);
            }
            current = tree_node.parent;
        }

        segments.reverse();
        Ok(segments)
    }
}

fn into_variant(node: NodeId, doc: VariantDocument) -> LanguageVariant {
    let virtual_children = (!doc.virtual_children.is_empty()).then(|| {
        Arc::new(StaticChildren::new(doc.virtual_children)) as Arc<dyn VirtualChildProvider>
    });

    LanguageVariant {
        node,
        language: doc.language,
        kind: doc.kind,
        published: doc.published,
        access_restricted: doc.access_restricted,
        exclude_from_sitemap: doc.exclude_from_sitemap,
        changed: doc.changed,
        changefreq: doc.changefreq,
        priority: doc.priority,
        url: doc.url,
        virtual_children,
    }
}

impl ContentRepository for ContentTree {
    fn root_node(&self) -> NodeId {
        TREE_ROOT
    }

    fn descendants(&self, node: NodeId) -> Result<Vec<NodeId>> {
        if !self.contains(node) {
            return Err(Error::NotFound(format!("node {node}")));
        }
        Ok(self.collect_descendants(node))
    }

    fn language_variants(&self, node: NodeId) -> Result<Vec<LanguageVariant>> {
        if node == TREE_ROOT {
            return Ok(Vec::new());
        }
        self.nodes
            .get(&node)
            .map(|n| n.variants.clone())
            .ok_or_else(|| Error::NotFound(format!("node {node}")))
    }
}

impl UrlResolver for ContentTree {
    fn resolve(&self, variant: &LanguageVariant, language: Option<&str>) -> Result<String> {
        if let Some(url) = &variant.url {
            return Ok(url.clone());
        }

        match variant.kind {
            ContentKind::Page => {
                let segments = self.path_segments(variant.node, language)?;
                let mut path = String::from("/");
                for part in language.into_iter().chain(segments) {
                    path.push_str(part);
                    path.push('/');
                }
                Ok(path)
            },
            ContentKind::Asset => {
                let segments = self.path_segments(variant.node, None)?;
                if segments.is_empty() {
                    return Err(Error::Resolution {
                        node: variant.node.0,
                        reason: "asset has no path segment".into(),
                    });
                }
                Ok(format!("/assets/{}", segments.join("/")))
            },
        }
    }
}
