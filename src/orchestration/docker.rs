//! Docker buildx container engine
//!
//! Drives `docker buildx build` and `docker run` through the CLI. Any other
//! binary with the same argument shapes can be substituted via `program`.

use crate::error::{DanceError, DanceResult};
use crate::orchestration::engine::{BuildRequest, ContainerEngine, CopyOutRequest};
use crate::orchestration::{error_output_tail, stream_child_output};
use crate::ui::{BuildProgress, UiContext};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::{debug, info};

/// Container engine using the Docker CLI with the buildx plugin
pub struct DockerEngine {
    program: String,
    builder: Option<String>,
    ui: UiContext,
}

impl DockerEngine {
    /// Create an engine invoking `program` (usually `docker`)
    pub fn new(program: impl Into<String>, ui: UiContext) -> Self {
        Self {
            program: program.into(),
            builder: None,
            ui,
        }
    }

    /// Use a named buildx builder instead of the current one
    pub fn with_builder(mut self, builder: Option<String>) -> Self {
        self.builder = builder;
        self
    }

    /// Arguments for `buildx build`
    pub fn build_args(&self, request: &BuildRequest) -> Vec<String> {
        let mut args = vec!["buildx".to_string(), "build".to_string()];

        if let Some(ref builder) = self.builder {
            args.push("--builder".to_string());
            args.push(builder.clone());
        }

        args.push("-f".to_string());
        args.push(request.recipe.display().to_string());
        args.push("--tag".to_string());
        args.push(request.tag.clone());
        args.push("--load".to_string());
        args.push(request.context_dir.display().to_string());
        args
    }

    /// Arguments for the copy-out `run`
    pub fn run_args(&self, request: &CopyOutRequest) -> Vec<String> {
        vec![
            "run".to_string(),
            "-v".to_string(),
            format!("{}:{}", request.host_dir.display(), request.mount_point),
            "--rm".to_string(),
            "--entrypoint".to_string(),
            "cp".to_string(),
            request.image.clone(),
            "-p".to_string(),
            "-R".to_string(),
            request.image_dir.clone(),
            format!("{}/", request.mount_point.trim_end_matches('/')),
        ]
    }

    fn command_line(&self, args: &[String]) -> String {
        format!("{} {}", self.program, args.join(" "))
    }

    /// Execute an engine command, streaming its output line by line
    async fn exec_streaming(
        &self,
        args: &[String],
        on_output: &(dyn Fn(String) + Send + Sync),
    ) -> DanceResult<(ExitStatus, Vec<String>)> {
        debug!("Executing: {}", self.command_line(args));

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    DanceError::EngineNotFound {
                        program: self.program.clone(),
                    }
                } else {
                    DanceError::command_failed(self.command_line(args), e)
                }
            })?;

        let output = stream_child_output(&mut child, on_output).await;
        let status = child
            .wait()
            .await
            .map_err(|e| DanceError::command_failed(self.command_line(args), e))?;

        Ok((status, output))
    }
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn build_image(&self, request: &BuildRequest) -> DanceResult<()> {
        info!("Building image {}", request.tag);

        let args = self.build_args(request);
        let progress = BuildProgress::new(&self.ui, &request.tag);
        let on_line = |line: String| {
            debug!(target: "cache_dance::engine", "{}", line);
            progress.on_line(line);
        };

        let result = self.exec_streaming(&args, &on_line).await;
        progress.finish();
        let (status, output) = result?;

        if status.success() {
            Ok(())
        } else {
            Err(DanceError::ImageBuild {
                tag: request.tag.clone(),
                output: error_output_tail(&output),
            })
        }
    }

    async fn copy_out(&self, request: &CopyOutRequest) -> DanceResult<()> {
        info!(
            "Copying {} from {} to {}",
            request.image_dir,
            request.image,
            request.host_dir.display()
        );

        let args = self.run_args(request);
        let on_line = |line: String| debug!(target: "cache_dance::engine", "{}", line);
        let (status, output) = self.exec_streaming(&args, &on_line).await?;

        if status.success() {
            Ok(())
        } else {
            Err(DanceError::ContainerRun {
                image: request.image.clone(),
                output: error_output_tail(&output),
            })
        }
    }

    fn engine_name(&self) -> &'static str {
        "Docker buildx"
    }
}
