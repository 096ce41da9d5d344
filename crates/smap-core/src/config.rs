//! Configuration for sitemap generation.
//!
//! Configuration is a single TOML file holding generation defaults, the output
//! location, and the list of sites:
//!
//! ```toml
//! [defaults]
//! dialect = "standard"
//! resolution_policy = "skip"
//! host_cache_ttl_secs = 300
//! include_debug_info = false
//!
//! [paths]
//! output = "/var/lib/smap"
//!
//! [[sites]]
//! name = "main"
//! site_url = "https://example.com/"
//! start_node = 1
//!
//! [[sites.hosts]]
//! host_name = "example.com"
//! language = "en"
//! ```
//!
//! ## Resolution order
//!
//! 1. `$SMAP_CONFIG`, if set
//! 2. `smap.toml` in the platform config directory
//! 3. built-in defaults when neither file exists
//!
//! `$SMAP_OUTPUT_DIR` overrides `paths.output` after loading.
//!
//! ```rust
//! use smap_core::{Config, SiteSource};
//!
//! let config = Config::from_toml_str(r#"
//! [[sites]]
//! site_url = "https://example.com/"
//! start_node = 1
//! "#)?;
//! assert_eq!(config.list_sites().len(), 1);
//! # Ok::<(), smap_core::Error>(())
//! ```

use crate::cache::DEFAULT_HOST_CACHE_TTL;
use crate::dialect::Dialect;
use crate::repository::SiteSource;
use crate::types::SiteConfig;
use crate::walker::ResolutionPolicy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "SMAP_CONFIG";

/// Environment variable overriding the output directory.
pub const OUTPUT_DIR_ENV: &str = "SMAP_OUTPUT_DIR";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Generation defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,
    /// Filesystem locations.
    #[serde(default)]
    pub paths: PathsConfig,
    /// Configured sites.
    #[serde(default)]
    pub sites: Vec<SiteConfig>,
}

/// Defaults applied to every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Sitemap dialect.
    pub dialect: Dialect,
    /// What to do with content whose URL cannot be produced.
    pub resolution_policy: ResolutionPolicy,
    /// Lifetime of cached host-binding lookups, in seconds.
    pub host_cache_ttl_secs: u64,
    /// Emit a comment with node id and language before each entry.
    pub include_debug_info: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::Standard,
            resolution_policy: ResolutionPolicy::Skip,
            host_cache_ttl_secs: DEFAULT_HOST_CACHE_TTL.as_secs(),
            include_debug_info: false,
        }
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root directory of the file sink.
    pub output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output: directories::ProjectDirs::from("dev", "outfitter", "smap").map_or_else(
                || {
                    directories::BaseDirs::new().map_or_else(
                        || PathBuf::from(".smap/sitemaps"),
                        |base| base.home_dir().join(".smap").join("sitemaps"),
                    )
                },
                |dirs| dirs.data_dir().join("sitemaps"),
            ),
        }
    }
}

impl Config {
    /// Load from `$SMAP_CONFIG` or the platform config directory, falling
    /// back to defaults when no file exists.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };

        if let Some(dir) = std::env::var_os(OUTPUT_DIR_ENV) {
            config.override_output(dir);
        }
        Ok(config)
    }

    /// Load and validate an explicit file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Write to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;
        fs::write(path, content).map_err(|e| Error::Config(format!("Failed to write config: {e}")))
    }

    /// Where [`Config::load`] looks.
    pub fn config_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }

        let project_dirs = directories::ProjectDirs::from("dev", "outfitter", "smap")
            .ok_or_else(|| Error::Config("Failed to determine project directories".into()))?;
        Ok(project_dirs.config_dir().join("smap.toml"))
    }

    /// Reject sites that could never produce a sitemap.
    pub fn validate(&self) -> Result<()> {
        for site in &self.sites {
            site.base_url()
                .map_err(|e| Error::Config(format!("site '{}': {e}", site.name)))?;

            if let Some(binding) = site.hosts.iter().find(|h| h.host_name.trim().is_empty()) {
                return Err(Error::Config(format!(
                    "site '{}' has a host binding without a host name (language {:?})",
                    site.name, binding.language
                )));
            }
        }
        Ok(())
    }

    /// Replace the output directory.
    pub fn override_output(&mut self, dir: impl Into<PathBuf>) {
        self.paths.output = dir.into();
    }

    /// Cache lifetime as a [`Duration`].
    pub const fn host_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.defaults.host_cache_ttl_secs)
    }

    /// Site whose name equals `name_or_url`, or whose site URL does.
    pub fn site(&self, name_or_url: &str) -> Option<&SiteConfig> {
        self.sites
            .iter()
            .find(|s| !s.name.is_empty() && s.name == name_or_url)
            .or_else(|| self.sites.iter().find(|s| s.site_url == name_or_url))
    }
}

impl SiteSource for Config {
    fn list_sites(&self) -> Vec<SiteConfig> {
        self.sites.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::types::{HostBinding, NodeId};
    use proptest::prelude::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
[defaults]
dialect = "mobile"
resolution_policy = "abort"
host_cache_ttl_secs = 60
include_debug_info = true

[paths]
output = "/tmp/smap-test"

[[sites]]
name = "main"
site_url = "https://example.com/"
start_node = 1

[[sites.hosts]]
host_name = "example.com"
language = "en"

[[sites.hosts]]
host_name = "*"
wildcard = true
"#;

    fn create_test_config() -> Config {
        Config {
            defaults: DefaultsConfig::default(),
            paths: PathsConfig {
                output: PathBuf::from("/tmp/test"),
            },
            sites: vec![SiteConfig {
                name: "main".into(),
                site_url: "https://example.com/".into(),
                start_node: NodeId(1),
                hosts: vec![
                    HostBinding::new("example.com", Some("en")),
                    HostBinding::new("example.fr", Some("fr")),
                ],
            }],
        }
    }

    #[test]
    fn test_default_config_values() {
        let config = Config::default();

        assert_eq!(config.defaults.dialect, Dialect::Standard);
        assert_eq!(config.defaults.resolution_policy, ResolutionPolicy::Skip);
        assert_eq!(config.host_cache_ttl(), DEFAULT_HOST_CACHE_TTL);
        assert!(!config.defaults.include_debug_info);
        assert!(!config.paths.output.as_os_str().is_empty());
        assert!(config.sites.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml_str(SAMPLE).unwrap();

        assert_eq!(config.defaults.dialect, Dialect::Mobile);
        assert_eq!(config.defaults.resolution_policy, ResolutionPolicy::Abort);
        assert_eq!(config.host_cache_ttl(), Duration::from_secs(60));
        assert!(config.defaults.include_debug_info);
        assert_eq!(config.paths.output, PathBuf::from("/tmp/smap-test"));

        let site = &config.sites[0];
        assert_eq!(site.start_node, NodeId(1));
        assert_eq!(site.hosts.len(), 2);
        assert!(site.hosts[1].is_wildcard());
    }

    #[test]
    fn test_partial_defaults_section() {
        let config = Config::from_toml_str("[defaults]\ndialect = \"mobile\"\n").unwrap();
        assert_eq!(config.defaults.dialect, Dialect::Mobile);
        assert_eq!(config.defaults.host_cache_ttl_secs, 300);
    }

    #[test]
    fn test_config_save_and_load_roundtrip() -> Result<()> {
        // Given: a config written to a nested path
        let temp_dir = TempDir::new().map_err(|e| Error::Config(e.to_string()))?;
        let config_path = temp_dir.path().join("nested").join("smap.toml");
        let original = create_test_config();

        // When: saving then loading it
        original.save(&config_path)?;
        let loaded = Config::from_path(&config_path)?;

        // Then: nothing is lost
        assert_eq!(loaded, original);
        Ok(())
    }

    #[test]
    fn test_config_load_missing_file() {
        let result = Config::from_path(Path::new("/definitely/does/not/exist/smap.toml"));
        match result {
            Err(Error::Config(msg)) => assert!(msg.contains("Failed to read config")),
            other => panic!("Expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_config_parse_invalid_toml() {
        match Config::from_toml_str("this is not valid toml [[[") {
            Err(Error::Config(msg)) => assert!(msg.contains("Failed to parse config")),
            other => panic!("Expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_dialect_is_rejected() {
        assert!(matches!(
            Config::from_toml_str("[defaults]\ndialect = \"news\"\n"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_site_url() {
        let mut config = create_test_config();
        config.sites[0].site_url = "not a url".into();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_empty_host_name() {
        let mut config = create_test_config();
        config.sites[0].hosts.push(HostBinding::new("  ", Some("de")));
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_site_lookup_by_name_or_url() {
        let config = create_test_config();
        assert!(config.site("main").is_some());
        assert!(config.site("https://example.com/").is_some());
        assert!(config.site("other").is_none());
        assert_eq!(config.list_sites(), config.sites);
    }

    #[test]
    fn test_override_output() {
        let mut config = create_test_config();
        config.override_output("/srv/sitemaps");
        assert_eq!(config.paths.output, PathBuf::from("/srv/sitemaps"));
    }

    proptest! {
        #[test]
        fn test_config_ttl_roundtrip(ttl in 0u64..=86_400) {
            let mut config = create_test_config();
            config.defaults.host_cache_ttl_secs = ttl;
            let serialized = toml::to_string_pretty(&config).unwrap();
            let parsed = Config::from_toml_str(&serialized).unwrap();
            prop_assert_eq!(parsed.host_cache_ttl(), Duration::from_secs(ttl));
        }
    }
}
