//! CLI argument definitions using clap derive

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// cache-dance - Extract BuildKit cache mounts to the host
///
/// Builds a throwaway image that surfaces each cache mount, then copies its
/// contents into a host directory so CI can persist it.
#[derive(Parser, Debug)]
#[command(name = "cache-dance")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DANCE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .cache-dance.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract cache mounts into their host directories
    Extract(ExtractArgs),

    /// Print the build recipe for each cache without running anything
    Recipe(RecipeArgs),
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Where the cache map comes from
#[derive(Args, Debug, Default)]
pub struct CacheMapArgs {
    /// JSON object mapping host directories to cache targets or mount options
    #[arg(long, env = "DANCE_CACHE_MAP", value_name = "JSON")]
    pub cache_map: Option<String>,

    /// Host directory of a single cache (deprecated, use --cache-map)
    #[arg(long, requires = "cache_target", value_name = "DIR")]
    pub cache_source: Option<PathBuf>,

    /// Target path of a single cache (deprecated, use --cache-map)
    #[arg(long, requires = "cache_source", value_name = "PATH")]
    pub cache_target: Option<String>,
}

/// Arguments for the extract command
#[derive(Parser, Debug)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub map: CacheMapArgs,

    /// Directory for the build stamp and recipe
    #[arg(long, env = "DANCE_SCRATCH_DIR", value_name = "DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// Do nothing; useful to disable the step from CI inputs
    #[arg(long, env = "DANCE_SKIP_EXTRACTION")]
    pub skip_extraction: bool,

    /// Named buildx builder to use
    #[arg(long, env = "DANCE_BUILDER")]
    pub builder: Option<String>,

    /// Base image of the extraction build
    #[arg(long, value_name = "IMAGE")]
    pub base_image: Option<String>,
}

/// Arguments for the recipe command
#[derive(Parser, Debug)]
pub struct RecipeArgs {
    #[command(flatten)]
    pub map: CacheMapArgs,

    /// Base image of the extraction build
    #[arg(long, value_name = "IMAGE")]
    pub base_image: Option<String>,
}
