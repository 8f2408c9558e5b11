//! Container engine orchestration
//!
//! Provides the engine seam used by the extraction driver and the Docker
//! buildx implementation behind it.

mod docker;
mod engine;

pub use docker::DockerEngine;
pub use engine::{BuildRequest, ContainerEngine, CopyOutRequest};

use tokio::io::{AsyncBufReadExt, BufReader};

/// Max number of output lines to include in engine error messages.
const ERROR_TAIL_LINES: usize = 50;

/// Extract the useful tail of engine output for error diagnostics.
///
/// Returns the last `ERROR_TAIL_LINES` lines so error messages are
/// actionable without being overwhelming.
pub(crate) fn error_output_tail(lines: &[String]) -> String {
    let start = lines.len().saturating_sub(ERROR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Stream stdout+stderr from a child process, calling `on_output` for each line.
///
/// Returns all collected output lines for error reporting.
pub(crate) async fn stream_child_output(
    child: &mut tokio::process::Child,
    on_output: &(dyn Fn(String) + Send + Sync),
) -> Vec<String> {
    let mut all_output = Vec::new();
    let (Some(stderr), Some(stdout)) = (child.stderr.take(), child.stdout.take()) else {
        return all_output;
    };

    let mut stderr_reader = BufReader::new(stderr).lines();
    let mut stdout_reader = BufReader::new(stdout).lines();

    let mut stderr_done = false;
    let mut stdout_done = false;

    while !stderr_done || !stdout_done {
        tokio::select! {
            line = stderr_reader.next_line(), if !stderr_done => {
                match line {
                    Ok(Some(line)) => {
                        on_output(line.clone());
                        all_output.push(line);
                    }
                    _ => stderr_done = true,
                }
            }
            line = stdout_reader.next_line(), if !stdout_done => {
                match line {
                    Ok(Some(line)) => {
                        on_output(line.clone());
                        all_output.push(line);
                    }
                    _ => stdout_done = true,
                }
            }
        }
    }

    all_output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_tail_keeps_last_lines() {
        let lines: Vec<String> = (0..80).map(|i| format!("line {}", i)).collect();
        let tail = error_output_tail(&lines);

        assert_eq!(tail.lines().count(), ERROR_TAIL_LINES);
        assert!(tail.starts_with("line 30"));
        assert!(tail.ends_with("line 79"));
    }

    #[test]
    fn error_tail_short_output_unchanged() {
        let lines = vec!["a".to_string(), "b".to_string()];
        assert_eq!(error_output_tail(&lines), "a\nb");
        assert_eq!(error_output_tail(&[]), "");
    }
}
