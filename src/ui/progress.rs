//! Progress indicators with CI fallback

use super::context::UiContext;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};

/// A task spinner with CI fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    /// Create a new spinner (shows once started, in interactive mode)
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    /// Start the spinner with a message
    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop(message);
        } else if self.interactive {
            println!("{} {}", style("✓").green(), message);
        } else {
            println!("{} {}", style("[OK]").green(), message);
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.error(message);
        } else if self.interactive {
            println!("{} {}", style("✗").red(), message);
        } else {
            println!("{} {}", style("[FAIL]").red(), message);
        }
    }
}

/// Progress bar for buildx image builds.
///
/// Parses buildx plain-progress step headers (`#6 [2/3] COPY ...`) and
/// displays an indicatif bar in interactive mode, or one line per step in CI.
pub struct BuildProgress {
    bar: Option<ProgressBar>,
    last_step: AtomicU64,
}

impl BuildProgress {
    /// Create a new build progress indicator.
    pub fn new(ctx: &UiContext, label: &str) -> Self {
        let bar = if ctx.use_fancy_output() {
            let bar = ProgressBar::new(0);
            let template = ProgressStyle::default_bar()
                .template("  {spinner:.cyan} Building {prefix}  {bar:20.cyan/dim} {pos}/{len} {msg:.dim}  {elapsed:.dim}");
            if let Ok(template) = template {
                bar.set_style(
                    template
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                        .progress_chars("━╸─"),
                );
            }
            bar.set_prefix(label.to_string());
            bar.enable_steady_tick(std::time::Duration::from_millis(120));
            Some(bar)
        } else {
            println!("Building {}...", label);
            None
        };
        Self {
            bar,
            last_step: AtomicU64::new(0),
        }
    }

    /// Process a build output line. Parses step headers and updates the bar.
    pub fn on_line(&self, line: String) {
        if let Some((n, total, instruction)) = parse_step_line(&line) {
            // buildx repeats a step header when its output resumes
            let previous = self.last_step.swap(n, Ordering::Relaxed);
            if let Some(ref bar) = self.bar {
                bar.set_length(total);
                bar.set_position(n);
                bar.set_message(instruction.to_string());
            } else if previous != n {
                println!("  [{}/{}] {}", n, total, instruction);
            }
        } else if let Some(ref bar) = self.bar {
            let trimmed = strip_vertex(line.trim());
            if !trimmed.is_empty() && !is_build_noise(trimmed) {
                let display: String = if trimmed.chars().count() > 60 {
                    format!("{}...", trimmed.chars().take(57).collect::<String>())
                } else {
                    trimmed.to_string()
                };
                bar.set_message(display);
            }
        }
    }

    /// Finish and clear the progress bar.
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

/// Strip the `#N ` vertex prefix buildx puts on every plain-progress line.
fn strip_vertex(line: &str) -> &str {
    match line.strip_prefix('#') {
        Some(rest) => {
            let rest = rest.trim_start_matches(|c: char| c.is_ascii_digit());
            rest.trim_start()
        }
        None => line,
    }
}

/// Filter out buildx bookkeeping lines that aren't useful to display.
fn is_build_noise(line: &str) -> bool {
    line.starts_with("DONE")
        || line.starts_with("CACHED")
        || line.starts_with("transferring")
        || line.starts_with("sha256:")
        || line.starts_with("writing image")
        || line.starts_with("naming to")
}

/// Parse a buildx step header like `#6 [2/3] RUN ls -al /cache`
///
/// Headers of multi-stage builds carry a stage name: `#6 [builder 2/3] RUN ...`.
fn parse_step_line(line: &str) -> Option<(u64, u64, &str)> {
    let rest = line.strip_prefix('#')?;
    let open = rest.find('[')?;
    if !rest[..open].trim().chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let close = rest.find(']')?;
    if close <= open {
        return None;
    }
    let counter = rest[open + 1..close].split_whitespace().last()?;
    let (n, total) = counter.split_once('/')?;
    let n: u64 = n.parse().ok()?;
    let total: u64 = total.parse().ok()?;
    let instruction = rest[close + 1..].trim();
    Some((n, total, instruction))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_non_interactive() {
        let ctx = UiContext::non_interactive();
        let mut spinner = TaskSpinner::new(&ctx);
        spinner.start("Testing...");
        spinner.stop("Done");
        spinner.stop_error("Failed");
        // Should not panic
    }

    #[test]
    fn parse_step_line_valid() {
        let (n, m, instr) = parse_step_line("#6 [2/3] COPY buildstamp buildstamp").unwrap();
        assert_eq!(n, 2);
        assert_eq!(m, 3);
        assert_eq!(instr, "COPY buildstamp buildstamp");
    }

    #[test]
    fn parse_step_line_with_stage() {
        let (n, m, instr) = parse_step_line("#9 [builder 1/4] FROM docker.io/library/busybox:1").unwrap();
        assert_eq!(n, 1);
        assert_eq!(m, 4);
        assert_eq!(instr, "FROM docker.io/library/busybox:1");
    }

    #[test]
    fn parse_step_line_not_a_step() {
        assert!(parse_step_line("#1 [internal] load build definition from Dancefile.extract").is_none());
        assert!(parse_step_line("#6 DONE 0.1s").is_none());
        assert!(parse_step_line("#7 0.215 total 12").is_none());
        assert!(parse_step_line("").is_none());
    }

    #[test]
    fn strip_vertex_prefix() {
        assert_eq!(strip_vertex("#12 DONE 0.0s"), "DONE 0.0s");
        assert_eq!(strip_vertex("plain line"), "plain line");
    }

    #[test]
    fn build_progress_non_interactive() {
        let ctx = UiContext::non_interactive();
        let progress = BuildProgress::new(&ctx, "dance:extract");
        progress.on_line("#5 [1/3] FROM docker.io/library/busybox:1".to_string());
        progress.on_line("#5 DONE 0.0s".to_string());
        progress.on_line("#5 [1/3] FROM docker.io/library/busybox:1".to_string());
        progress.on_line("#7 [3/3] RUN --mount=type=cache,target=/c ls -al /c".to_string());
        progress.finish();
        assert_eq!(progress.last_step.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn is_build_noise_filters_buildx_bookkeeping() {
        assert!(is_build_noise("DONE 0.1s"));
        assert!(is_build_noise("CACHED"));
        assert!(is_build_noise("transferring context: 2B done"));
        assert!(is_build_noise("naming to docker.io/library/dance:extract done"));
        assert!(!is_build_noise("0.215 total 12"));
        assert!(!is_build_noise(""));
    }
}
