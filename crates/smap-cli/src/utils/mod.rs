//! Shared helpers for the smap CLI

pub mod logging;

use anyhow::{Context, Result};
use smap_core::Config;
use std::path::Path;

/// Load the configuration from `path`, or from the default location.
///
/// A missing default file yields the built-in defaults; an explicit path must
/// exist.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Config::load().context("Failed to load config"),
    }
}
