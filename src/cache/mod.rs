//! BuildKit cache mount descriptions
//!
//! Caches live in the container engine's build-mount cache. This module only
//! describes them: which host directory receives which mount, how the mount
//! flag is rendered, and the recipe that surfaces a mount inside an image.

pub mod options;
pub mod recipe;

pub use options::{CacheEntry, CacheMap, CacheOptions, MountOptions, Sharing};
