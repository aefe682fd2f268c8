//! Container execution for algorithms and views.
//!
//! Running an algorithm is an opaque step: an image receives the datapackage
//! directory as a mount plus a few environment variables, runs to completion,
//! and hands back its output. A non-zero exit status is an [`ExecutionError`]
//! that carries the captured logs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Command, Output};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Where the datapackage directory appears inside the container.
pub const DEFAULT_MOUNT_TARGET: &str = "/usr/src/app/datapackage";
pub const DEFAULT_PROGRAM: &str = "docker";

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Execution of '{image}' failed with status {}", status_label(.status))]
    Failed {
        image: String,
        status: Option<i32>,
        logs: String,
    },

    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

fn status_label(status: &Option<i32>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "unknown (terminated by signal)".to_string(),
    }
}

impl ExecutionError {
    /// Output captured before the failure, if any.
    pub fn logs(&self) -> Option<&str> {
        match self {
            ExecutionError::Failed { logs, .. } => Some(logs),
            ExecutionError::Spawn { .. } => None,
        }
    }
}

/// One sandboxed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub image: String,
    /// Host directory mounted into the container.
    pub workdir: PathBuf,
    pub env: BTreeMap<String, String>,
}

impl RunRequest {
    pub fn new(image: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            workdir: workdir.into(),
            env: BTreeMap::new(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// Runs a request to completion and returns its combined output.
pub trait ContainerRunner {
    fn run(&self, request: &RunRequest) -> Result<String, ExecutionError>;
}

/// Settings for [`DockerRunner`], read from the `[runner]` table of the
/// datapackage config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Container CLI to invoke.
    pub program: String,
    pub mount_target: String,
    /// Passed as `--user`, e.g. `1000:1000`.
    pub user: Option<String>,
    /// Extra arguments inserted before the image name.
    pub extra_args: Vec<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            mount_target: DEFAULT_MOUNT_TARGET.to_string(),
            user: None,
            extra_args: Vec::new(),
        }
    }
}

/// Runs images through a docker-compatible CLI (`docker run --rm ...`).
#[derive(Debug, Clone, Default)]
pub struct DockerRunner {
    config: RunnerConfig,
}

impl DockerRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Arguments passed to the container CLI for `request`.
    pub fn args(&self, request: &RunRequest) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "--rm".to_string(),
            "--volume".to_string(),
            format!("{}:{}", request.workdir.display(), self.config.mount_target),
        ];
        if let Some(user) = &self.config.user {
            args.push("--user".to_string());
            args.push(user.clone());
        }
        for (key, value) in &request.env {
            args.push("--env".to_string());
            args.push(format!("{}={}", key, value));
        }
        args.extend(self.config.extra_args.iter().cloned());
        args.push(request.image.clone());
        args
    }
}

impl ContainerRunner for DockerRunner {
    fn run(&self, request: &RunRequest) -> Result<String, ExecutionError> {
        let args = self.args(request);
        debug!(program = %self.config.program, ?args, "starting container");

        let output = Command::new(&self.config.program)
            .args(&args)
            .output()
            .map_err(|source| ExecutionError::Spawn {
                program: self.config.program.clone(),
                source,
            })?;

        let logs = combined_logs(&output);
        if !output.status.success() {
            warn!(image = %request.image, status = ?output.status.code(), "container failed");
            return Err(ExecutionError::Failed {
                image: request.image.clone(),
                status: output.status.code(),
                logs,
            });
        }

        info!(image = %request.image, "container finished");
        Ok(logs)
    }
}

fn combined_logs(output: &Output) -> String {
    let mut logs = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        if !logs.is_empty() && !logs.ends_with('\n') {
            logs.push('\n');
        }
        logs.push_str(&stderr);
    }
    logs.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_mount_workdir_and_pass_env() {
        let runner = DockerRunner::new(RunnerConfig {
            user: Some("1000:1000".to_string()),
            extra_args: vec!["--network=none".to_string()],
            ..RunnerConfig::default()
        });
        let request = RunRequest::new("fit:latest", "/data/pkg")
            .with_env("VIEW", "plot")
            .with_env("ALGORITHM", "fit");

        assert_eq!(
            runner.args(&request),
            vec![
                "run",
                "--rm",
                "--volume",
                "/data/pkg:/usr/src/app/datapackage",
                "--user",
                "1000:1000",
                "--env",
                "ALGORITHM=fit",
                "--env",
                "VIEW=plot",
                "--network=none",
                "fit:latest",
            ]
        );
    }

    #[test]
    fn config_defaults_fill_missing_keys() {
        let config: RunnerConfig = toml::from_str("user = \"1:1\"").unwrap();
        assert_eq!(config.program, DEFAULT_PROGRAM);
        assert_eq!(config.mount_target, DEFAULT_MOUNT_TARGET);
        assert_eq!(config.user.as_deref(), Some("1:1"));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let runner = DockerRunner::new(RunnerConfig {
            program: "/nonexistent/container-cli".to_string(),
            ..RunnerConfig::default()
        });
        let err = runner.run(&RunRequest::new("img", "/tmp")).unwrap_err();
        assert!(matches!(err, ExecutionError::Spawn { .. }));
        assert!(err.logs().is_none());
    }
}
