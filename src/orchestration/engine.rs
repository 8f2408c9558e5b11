//! Container engine abstraction
//!
//! The extraction driver talks to the engine only through this trait, so the
//! Docker CLI can be swapped for another buildx-compatible binary, or for a
//! recording fake in tests.

use crate::cache::recipe::{HOST_MOUNT_POINT, IMAGE_CACHE_DIR};
use crate::error::DanceResult;
use async_trait::async_trait;
use std::path::PathBuf;

/// Image build from a recipe file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Recipe file passed with `-f`
    pub recipe: PathBuf,
    /// Tag applied to the built image
    pub tag: String,
    /// Build context directory
    pub context_dir: PathBuf,
}

/// Copy of the image's cache directory onto a host directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOutRequest {
    /// Image to run
    pub image: String,
    /// Absolute host directory bound into the container
    pub host_dir: PathBuf,
    /// Directory inside the image to copy from
    pub image_dir: String,
    /// Where `host_dir` is mounted inside the container
    pub mount_point: String,
}

impl CopyOutRequest {
    /// Copy the standard cache directory of `image` into `host_dir`
    pub fn new(image: impl Into<String>, host_dir: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            host_dir: host_dir.into(),
            image_dir: IMAGE_CACHE_DIR.to_string(),
            mount_point: HOST_MOUNT_POINT.to_string(),
        }
    }
}

/// Abstract container engine interface
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Build an image and load it into the local image store
    async fn build_image(&self, request: &BuildRequest) -> DanceResult<()>;

    /// Run a throwaway container that copies the image directory to the host
    async fn copy_out(&self, request: &CopyOutRequest) -> DanceResult<()>;

    /// Get the human-readable engine name for display
    fn engine_name(&self) -> &'static str;
}
