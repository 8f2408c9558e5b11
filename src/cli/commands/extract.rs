//! Extract command - copy cache mounts out to the host

use super::resolve_cache_map;
use crate::cache::CacheMap;
use crate::cli::args::ExtractArgs;
use crate::config::Config;
use crate::error::DanceResult;
use crate::extract::{extract_caches, BatchOutcome, ExtractOptions, ExtractOutcome};
use crate::orchestration::{ContainerEngine, DockerEngine};
use crate::ui::{self, UiContext};
use tracing::debug;

/// Execute the extract command
pub async fn execute(args: ExtractArgs, config: &Config) -> DanceResult<()> {
    let ctx = UiContext::detect();
    let opts = build_options(&args, config)?;

    let builder = args.builder.or_else(|| config.engine.builder.clone());
    let engine = DockerEngine::new(config.engine.program.clone(), ctx).with_builder(builder);
    debug!("Using engine: {} ({})", engine.engine_name(), config.engine.program);

    ui::intro(&ctx, "cache-dance extract");

    match extract_caches(&engine, &ctx, &opts).await? {
        BatchOutcome::Skipped => {}
        BatchOutcome::Extracted(outcomes) if outcomes.is_empty() => {
            ui::step_warn(&ctx, "No caches configured. Nothing to extract.");
        }
        BatchOutcome::Extracted(outcomes) => {
            let populated = outcomes
                .iter()
                .filter(|(_, o)| matches!(o, ExtractOutcome::Populated { .. }))
                .count();
            let empty = outcomes.len() - populated;
            ui::outro_success(
                &ctx,
                &format!("{} cache(s) extracted, {} empty", populated, empty),
            );
        }
    }

    Ok(())
}

/// Merge flags over configuration
///
/// The cache map is not resolved when skipping, so a broken map cannot fail
/// a run that was asked to do nothing.
fn build_options(args: &ExtractArgs, config: &Config) -> DanceResult<ExtractOptions> {
    let skip = args.skip_extraction || config.extract.skip;
    let cache_map = if skip {
        CacheMap::new()
    } else {
        resolve_cache_map(&args.map, config)?
    };

    Ok(ExtractOptions {
        skip,
        scratch_dir: args
            .scratch_dir
            .clone()
            .unwrap_or_else(|| config.extract.scratch_dir.clone()),
        base_image: args
            .base_image
            .clone()
            .unwrap_or_else(|| config.extract.base_image.clone()),
        cache_map,
    })
}
