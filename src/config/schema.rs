//! Configuration schema for cache-dance
//!
//! Global configuration lives at `~/.config/cache-dance/config.toml`; a
//! project may add a `.cache-dance.toml` next to its sources.
//!
//! ```toml
//! [engine]
//! program = "docker"
//! builder = "ci-builder"
//!
//! [extract]
//! scratch_dir = "scratch"
//!
//! [cache_map]
//! "./.cache/go-build" = "/root/.cache/go-build"
//! "./.cache/apt" = { target = "/var/cache/apt", sharing = "locked" }
//! ```

use crate::cache::recipe::DEFAULT_BASE_IMAGE;
use crate::cache::CacheMap;
use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Container engine settings
    pub engine: EngineConfig,

    /// Extraction settings
    pub extract: ExtractConfig,

    /// Host cache directory -> cache mount options
    pub cache_map: CacheMap,
}

/// Container engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine binary, must understand `buildx build` and `run`
    pub program: String,

    /// Named buildx builder (current builder if unset)
    pub builder: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: "docker".to_string(),
            builder: None,
        }
    }
}

/// Extraction step configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Directory for the build stamp and recipe
    pub scratch_dir: PathBuf,

    /// Skip extraction entirely
    pub skip: bool,

    /// Base image of the extraction build
    pub base_image: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            scratch_dir: PathBuf::from("scratch"),
            skip: false,
            base_image: DEFAULT_BASE_IMAGE.to_string(),
        }
    }
}
