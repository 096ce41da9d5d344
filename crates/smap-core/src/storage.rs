//! Persistence sinks for generated sitemaps.
//!
//! [`FileSink`] lays documents out as
//!
//! ```text
//! <root>/<site-slug>/sitemap.xml
//! <root>/<site-slug>/sitemap.json
//! ```
//!
//! where `sitemap.json` records entry count, cap flag, content hash, and the
//! generation time. Both files are written to a temp path and renamed into
//! place, so readers never observe a half-written document.

use crate::repository::SitemapSink;
use crate::{Error, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Sidecar metadata stored next to each `sitemap.xml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapMetadata {
    /// Site the document was generated for.
    pub site_url: String,
    /// Number of entries in the document.
    pub entry_count: usize,
    /// Whether eligible entries were dropped at the cap.
    pub exceeded_cap: bool,
    /// Base64 SHA-256 of the XML bytes.
    pub sha256: String,
    /// Generation time. The only time-dependent value of a run.
    pub generated_at: DateTime<Utc>,
}

/// Writes sitemaps below a root directory, one subdirectory per site.
#[derive(Debug, Clone)]
pub struct FileSink {
    root_dir: PathBuf,
}

impl FileSink {
    /// Sink rooted at `root_dir`, created if missing.
    pub fn new(root_dir: impl Into<PathBuf>) -> Result<Self> {
        let root_dir = root_dir.into();
        fs::create_dir_all(&root_dir)
            .map_err(|e| Error::Storage(format!("Failed to create output directory: {e}")))?;
        Ok(Self { root_dir })
    }

    /// Root output directory.
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Directory holding `site_url`'s files.
    pub fn site_dir(&self, site_url: &str) -> PathBuf {
        self.root_dir.join(site_slug(site_url))
    }

    /// Path of `site_url`'s `sitemap.xml`.
    pub fn sitemap_path(&self, site_url: &str) -> PathBuf {
        self.site_dir(site_url).join("sitemap.xml")
    }

    /// Path of `site_url`'s `sitemap.json`.
    pub fn metadata_path(&self, site_url: &str) -> PathBuf {
        self.site_dir(site_url).join("sitemap.json")
    }

    /// Load the sidecar for `site_url`, if one was written.
    pub fn load_metadata(&self, site_url: &str) -> Result<Option<SitemapMetadata>> {
        let path = self.metadata_path(site_url);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)
            .map_err(|e| Error::Storage(format!("Failed to read sitemap metadata: {e}")))?;
        let metadata = serde_json::from_str(&json)
            .map_err(|e| Error::Storage(format!("Failed to parse sitemap metadata: {e}")))?;
        Ok(Some(metadata))
    }
}

impl SitemapSink for FileSink {
    fn save(
        &self,
        site_url: &str,
        xml: &[u8],
        entry_count: usize,
        exceeded_cap: bool,
    ) -> Result<()> {
        let dir = self.site_dir(site_url);
        fs::create_dir_all(&dir)
            .map_err(|e| Error::Storage(format!("Failed to create site directory: {e}")))?;

        let path = self.sitemap_path(site_url);
        write_atomic(&path, xml, "sitemap.xml")?;

        let metadata = SitemapMetadata {
            site_url: site_url.to_string(),
            entry_count,
            exceeded_cap,
            sha256: calculate_sha256(xml),
            generated_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&metadata)
            .map_err(|e| Error::Storage(format!("Failed to serialize metadata: {e}")))?;
        write_atomic(&self.metadata_path(site_url), json.as_bytes(), "sitemap.json")?;

        debug!(
            site = site_url,
            path = %path.display(),
            entries = entry_count,
            exceeded_cap,
            "Saved sitemap"
        );
        Ok(())
    }
}

fn write_atomic(path: &Path, bytes: &[u8], what: &str) -> Result<()> {
    let tmp_path = path.with_file_name(format!("{what}.tmp"));
    fs::write(&tmp_path, bytes)
        .map_err(|e| Error::Storage(format!("Failed to write {what}: {e}")))?;

    #[cfg(target_os = "windows")]
    if path.exists() {
        fs::remove_file(path)
            .map_err(|e| Error::Storage(format!("Failed to remove existing {what}: {e}")))?;
    }

    fs::rename(&tmp_path, path).map_err(|e| Error::Storage(format!("Failed to commit {what}: {e}")))
}

/// Base64-encoded SHA-256 of `bytes`.
pub fn calculate_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    STANDARD.encode(hasher.finalize())
}

/// Filesystem-safe directory name for a site URL.
///
/// Host, port, and path segments joined by `_`; anything outside
/// `[A-Za-z0-9._-]` becomes `_`.
pub fn site_slug(site_url: &str) -> String {
    let raw = url::Url::parse(site_url).map_or_else(
        |_| site_url.to_string(),
        |url| {
            let mut parts: Vec<String> = Vec::new();
            if let Some(host) = url.host_str() {
                parts.push(host.to_ascii_lowercase());
            }
            if let Some(port) = url.port() {
                parts.push(port.to_string());
            }
            parts.extend(
                url.path()
                    .split('/')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            );
            parts.join("_")
        },
    );

    let mut slug: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    while slug.contains("..") {
        slug = slug.replace("..", "_");
    }
    let slug = slug.trim_matches('.').to_string();

    if slug.is_empty() {
        "default".to_string()
    } else {
        slug
    }
}

/// A document handed to a [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedSitemap {
    /// Site the document was generated for.
    pub site_url: String,
    /// Serialized document.
    pub xml: Vec<u8>,
    /// Number of entries.
    pub entry_count: usize,
    /// Cap flag.
    pub exceeded_cap: bool,
}

impl SavedSitemap {
    /// Document as UTF-8 text.
    pub fn xml_str(&self) -> Result<&str> {
        std::str::from_utf8(&self.xml).map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// Keeps every saved document in memory. Used by `--stdout` and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    saved: Mutex<Vec<SavedSitemap>>,
}

impl MemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All documents saved so far, oldest first.
    pub fn saved(&self) -> Vec<SavedSitemap> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recently saved document.
    pub fn last(&self) -> Option<SavedSitemap> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl SitemapSink for MemorySink {
    fn save(
        &self,
        site_url: &str,
        xml: &[u8],
        entry_count: usize,
        exceeded_cap: bool,
    ) -> Result<()> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SavedSitemap {
                site_url: site_url.to_string(),
                xml: xml.to_vec(),
                entry_count,
                exceeded_cap,
            });
        Ok(())
    }
}
