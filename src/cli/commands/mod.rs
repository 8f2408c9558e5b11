//! CLI command implementations

pub mod extract;
pub mod recipe;

pub use extract::execute as extract;
pub use recipe::execute as recipe;

use crate::cache::CacheMap;
use crate::cli::args::CacheMapArgs;
use crate::config::Config;
use crate::error::DanceResult;
use tracing::{debug, warn};

/// Resolve the cache map from flags, then config, then the legacy pair
pub(crate) fn resolve_cache_map(args: &CacheMapArgs, config: &Config) -> DanceResult<CacheMap> {
    if let Some(ref json) = args.cache_map {
        debug!("Using cache map from --cache-map");
        return CacheMap::from_json(json);
    }

    if !config.cache_map.is_empty() {
        debug!("Using cache map from configuration");
        return Ok(config.cache_map.clone());
    }

    if let (Some(source), Some(target)) = (&args.cache_source, &args.cache_target) {
        warn!("--cache-source/--cache-target are deprecated, use --cache-map");
        return Ok(CacheMap::from_legacy(source.clone(), target.clone()));
    }

    Ok(CacheMap::new())
}
