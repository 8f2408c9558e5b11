//! Console output for interactive terminals and CI logs
//!
//! Uses `cliclack` for styled output in a terminal, with automatic fallback
//! to plain prefixed lines when stdout is not a TTY or a CI provider is
//! detected.

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{
    intro, key_value, outro_success, remark, section, step_info, step_ok, step_warn,
};
pub use progress::{BuildProgress, TaskSpinner};
