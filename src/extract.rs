//! Cache extraction driver
//!
//! For every cache entry, builds a throwaway image that copies the cache
//! mount into `/var/dance-cache/`, then runs a container from that image to
//! copy the directory onto the host. A destination that ends up empty is
//! removed so CI does not upload a vacuous cache.
//!
//! Entries are processed strictly one after another: the scratch directory
//! and the `dance:extract` tag are reused for every entry.

use crate::cache::recipe::{self, BUILDSTAMP_FILE, EXTRACT_IMAGE_TAG, RECIPE_FILE};
use crate::cache::{CacheEntry, CacheMap};
use crate::error::{DanceError, DanceResult};
use crate::orchestration::{BuildRequest, ContainerEngine, CopyOutRequest};
use crate::ui::{self, TaskSpinner, UiContext};
use chrono::{SecondsFormat, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Everything needed to extract a batch of caches
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Do nothing at all
    pub skip: bool,
    /// Directory for the build stamp and recipe
    pub scratch_dir: PathBuf,
    /// Base image of the extraction build
    pub base_image: String,
    /// Caches to extract, in order
    pub cache_map: CacheMap,
}

/// Result of extracting one cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// Destination holds `entries` top-level entries
    Populated { entries: usize },
    /// Cache was empty; destination removed
    Empty,
}

/// Result of extracting a batch of caches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Extraction was skipped by request
    Skipped,
    /// Per-source outcomes in cache map order
    Extracted(Vec<(PathBuf, ExtractOutcome)>),
}

/// Extract every cache in `opts.cache_map`, stopping at the first failure
pub async fn extract_caches(
    engine: &dyn ContainerEngine,
    ctx: &UiContext,
    opts: &ExtractOptions,
) -> DanceResult<BatchOutcome> {
    if opts.skip {
        ui::step_info(ctx, "skip-extraction is set. Skipping extraction step...");
        return Ok(BatchOutcome::Skipped);
    }

    if opts.cache_map.is_empty() {
        warn!("Cache map is empty, nothing to extract");
        return Ok(BatchOutcome::Extracted(Vec::new()));
    }

    debug!(
        "Extracting {} cache(s) with {}",
        opts.cache_map.len(),
        engine.engine_name()
    );

    let mut outcomes = Vec::with_capacity(opts.cache_map.len());
    for entry in &opts.cache_map {
        let outcome =
            extract_cache(engine, ctx, entry, &opts.scratch_dir, &opts.base_image).await?;
        outcomes.push((entry.source.clone(), outcome));
    }

    Ok(BatchOutcome::Extracted(outcomes))
}

/// Extract a single cache mount into `entry.source`
pub async fn extract_cache(
    engine: &dyn ContainerEngine,
    ctx: &UiContext,
    entry: &CacheEntry,
    scratch_dir: &Path,
    base_image: &str,
) -> DanceResult<ExtractOutcome> {
    ui::section(
        ctx,
        &format!("{} <- {}", entry.source.display(), entry.target_path()),
    );

    let dancefile = recipe::render(base_image, entry);
    ui::remark(ctx, dancefile.trim_start());
    let recipe_path = prepare_scratch(scratch_dir, &dancefile).await?;

    engine
        .build_image(&BuildRequest {
            recipe: recipe_path,
            tag: EXTRACT_IMAGE_TAG.to_string(),
            context_dir: scratch_dir.to_path_buf(),
        })
        .await?;

    let dest = &entry.source;
    remove_path(dest).await?;
    fs::create_dir_all(dest)
        .await
        .map_err(|e| DanceError::io(format!("creating {}", dest.display()), e))?;

    // Bind mounts need an absolute host path
    let host_dir = fs::canonicalize(dest)
        .await
        .map_err(|e| DanceError::io(format!("resolving {}", dest.display()), e))?;

    let mut spinner = TaskSpinner::new(ctx);
    spinner.start(&format!("Copying cache to {}", dest.display()));
    if let Err(e) = engine
        .copy_out(&CopyOutRequest::new(EXTRACT_IMAGE_TAG, host_dir))
        .await
    {
        spinner.stop_error("Copy failed");
        return Err(e);
    }
    spinner.stop("Copy finished");

    let listing = list_dir(dest).await?;
    if listing.is_empty() {
        ui::step_warn(ctx, "Cache is empty. Removing to prevent cache upload.");
        remove_path(dest).await?;
        info!("Removed empty cache directory {}", dest.display());
        return Ok(ExtractOutcome::Empty);
    }

    ui::step_ok(ctx, "Cache extracted successfully. Contents:");
    ui::remark(ctx, &format_listing(&listing));
    info!(
        "Extracted {} entries into {}",
        listing.len(),
        dest.display()
    );

    Ok(ExtractOutcome::Populated {
        entries: listing.len(),
    })
}

/// Write the build stamp and recipe, returning the recipe path
async fn prepare_scratch(scratch_dir: &Path, dancefile: &str) -> DanceResult<PathBuf> {
    fs::create_dir_all(scratch_dir)
        .await
        .map_err(|e| DanceError::io(format!("creating {}", scratch_dir.display()), e))?;

    let stamp_path = scratch_dir.join(BUILDSTAMP_FILE);
    let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    fs::write(&stamp_path, &stamp)
        .await
        .map_err(|e| DanceError::io(format!("writing {}", stamp_path.display()), e))?;

    let recipe_path = scratch_dir.join(RECIPE_FILE);
    fs::write(&recipe_path, dancefile)
        .await
        .map_err(|e| DanceError::io(format!("writing {}", recipe_path.display()), e))?;
    debug!("Wrote {}", recipe_path.display());

    Ok(recipe_path)
}

/// Remove a file or directory tree, succeeding if it does not exist
async fn remove_path(path: &Path) -> DanceResult<()> {
    let metadata = match fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(DanceError::io(format!("inspecting {}", path.display()), e)),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(DanceError::io(format!("removing {}", path.display()), e)),
    }
}

/// One line of a destination listing
#[derive(Debug, Clone, PartialEq, Eq)]
struct ListingEntry {
    name: String,
    is_dir: bool,
    size: u64,
}

async fn list_dir(path: &Path) -> DanceResult<Vec<ListingEntry>> {
    let mut reader = fs::read_dir(path)
        .await
        .map_err(|e| DanceError::io(format!("listing {}", path.display()), e))?;

    let mut entries = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|e| DanceError::io(format!("listing {}", path.display()), e))?
    {
        let metadata = entry
            .metadata()
            .await
            .map_err(|e| DanceError::io(format!("inspecting {}", entry.path().display()), e))?;
        entries.push(ListingEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir: metadata.is_dir(),
            size: metadata.len(),
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

fn format_listing(entries: &[ListingEntry]) -> String {
    entries
        .iter()
        .map(|e| {
            let kind = if e.is_dir { 'd' } else { '-' };
            format!("{} {:>10} {}", kind, e.size, e.name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
