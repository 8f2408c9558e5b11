//! cache-dance - BuildKit cache extraction for CI
//!
//! Surfaces the contents of build-mount caches in a throwaway image and
//! copies them to host directories, where CI can persist them.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod orchestration;
pub mod ui;

pub use error::{DanceError, DanceResult};
