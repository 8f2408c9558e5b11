//! Error types for cache-dance
//!
//! All modules use `DanceResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cache-dance operations
pub type DanceResult<T> = Result<T, DanceError>;

/// All errors that can occur while extracting caches
#[derive(Error, Debug)]
pub enum DanceError {
    // Container engine errors
    #[error("Container engine not found: {program}")]
    EngineNotFound { program: String },

    #[error("Image build failed for {tag}:\n{output}")]
    ImageBuild { tag: String, output: String },

    #[error("Container run failed for {image}:\n{output}")]
    ContainerRun { image: String, output: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Invalid cache map: {0}")]
    CacheMapInvalid(String),

    #[error("Cache source listed more than once: {0}")]
    DuplicateCacheSource(PathBuf),

    // IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}: {source}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl DanceError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::EngineNotFound { .. } => {
                Some("Install Docker with the buildx plugin, or set [engine] program")
            }
            Self::ImageBuild { .. } => {
                Some("Check that each cache entry renders a valid --mount specification")
            }
            Self::CacheMapInvalid(_) => {
                Some("Pass a JSON object such as {\"./.cache/go\": \"/root/.cache/go-build\"}")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DanceError::EngineNotFound {
            program: "docker".to_string(),
        };
        assert!(err.to_string().contains("Container engine not found: docker"));
    }

    #[test]
    fn error_hint() {
        let err = DanceError::CacheMapInvalid("expected an object".to_string());
        assert!(err.hint().unwrap().contains("JSON object"));

        let err = DanceError::io("reading", std::io::Error::other("boom"));
        assert_eq!(err.hint(), None);
    }

    #[test]
    fn io_error_shows_cause() {
        let err = DanceError::io(
            "creating scratch",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied"),
        );
        assert_eq!(err.to_string(), "IO error: creating scratch: permission denied");

        let err = DanceError::command_failed("docker run", std::io::Error::other("broken pipe"));
        assert!(err.to_string().ends_with("broken pipe"));
    }

    #[test]
    fn build_error_carries_output() {
        let err = DanceError::ImageBuild {
            tag: "dance:extract".to_string(),
            output: "ERROR: failed to solve".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("dance:extract"));
        assert!(msg.contains("failed to solve"));
    }
}
