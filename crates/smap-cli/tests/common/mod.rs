#![allow(dead_code, clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

pub const CMD_TIMEOUT: Duration = Duration::from_secs(15);

pub const CONFIG: &str = r#"
[[sites]]
name = "main"
site_url = "https://example.com/"
start_node = 1

[[sites.hosts]]
host_name = "example.com"
language = "en"

[[sites.hosts]]
host_name = "example.fr"
language = "fr"
"#;

pub const TREE: &str = r#"
[[nodes]]
id = 1
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
[[nodes.variants]]
language = "fr"
segment = "a-propos"

[[nodes]]
id = 3
parent = 1
segment = "private"
sort_order = 1
[[nodes.variants]]
language = "en"
"#;

/// Temporary config, tree and output locations for one test.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create test workspace");
        std::fs::write(dir.path().join("smap.toml"), CONFIG).unwrap();
        std::fs::write(dir.path().join("content.toml"), TREE).unwrap();
        Self { dir }
    }

    pub fn config(&self) -> PathBuf {
        self.dir.path().join("smap.toml")
    }

    pub fn tree(&self) -> PathBuf {
        self.dir.path().join("content.toml")
    }

    pub fn output(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// `smap` wired to this workspace's config and output directory.
    pub fn cmd(&self) -> Command {
        let mut cmd = smap_cmd();
        cmd.env("SMAP_CONFIG", self.config());
        cmd.env("SMAP_OUTPUT_DIR", self.output());
        cmd
    }
}

/// Create a configured `smap` command suitable for integration tests.
pub fn smap_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("smap"));
    cmd.timeout(CMD_TIMEOUT);
    cmd.env_remove("SMAP_CONFIG");
    cmd.env_remove("SMAP_OUTPUT_DIR");
    cmd.env("NO_COLOR", "1");
    cmd
}
