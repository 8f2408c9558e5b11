//! Recipe command - show what extraction would build

use super::resolve_cache_map;
use crate::cache::recipe;
use crate::cli::args::RecipeArgs;
use crate::config::Config;
use crate::error::DanceResult;
use crate::ui::{self, UiContext};

/// Execute the recipe command
pub async fn execute(args: RecipeArgs, config: &Config) -> DanceResult<()> {
    let ctx = UiContext::detect();
    let cache_map = resolve_cache_map(&args.map, config)?;
    let base_image = args
        .base_image
        .as_deref()
        .unwrap_or(&config.extract.base_image);

    if cache_map.is_empty() {
        ui::step_warn(&ctx, "No caches configured.");
        return Ok(());
    }

    for entry in &cache_map {
        ui::section(&ctx, &entry.source.display().to_string());
        ui::key_value(&ctx, "target", entry.target_path());
        ui::key_value(&ctx, "mount", &entry.mount_args());
        ui::remark(&ctx, recipe::render(base_image, entry).trim_start());
    }

    Ok(())
}
