//! Reconstruction invocation against the external photogrammetry tool.
//!
//! # Design
//! - Caller options merge over service defaults; callers win on key
//!   collision, and the CPU-only toggle overrides both afterwards.
//! - Process output is captured for diagnostics, never parsed; the real
//!   effect is the artifacts the tool writes into the output directory.
//! - Non-zero exit is fatal for the request and is not retried here.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{StageError, StageResult};

/// Reserved option key naming the tool subcommand.
const COMMAND_KEY: &str = "command";

/// Boolean overrides appended when the caller requests CPU-only execution.
const CPU_ONLY_OVERRIDES: &[&str] = &["SiftExtraction.use_gpu", "SiftMatching.use_gpu"];

/// Workspace paths handed to the reconstruction process.
#[derive(Debug, Default, Clone)]
pub struct ReconstructionPaths {
    /// Project file path, when the command takes one.
    pub project: Option<PathBuf>,
    /// Workspace root the tool may scratch in.
    pub workspace: Option<PathBuf>,
    /// Directory of extracted still images.
    pub images: Option<PathBuf>,
    /// Feature database path, when the command takes one.
    pub database: Option<PathBuf>,
    /// Directory artifacts are written into.
    pub output: Option<PathBuf>,
}

/// Fully resolved invocation of the reconstruction tool.
#[derive(Debug)]
pub struct ReconstructionPlan {
    /// Subcommand passed as the first argument.
    pub command: String,
    /// Path flags, passed only when set.
    pub paths: ReconstructionPaths,
    /// Remaining merged options rendered as `--key value` flags,
    /// deterministically ordered by key.
    pub flags: Vec<(String, String)>,
}

impl ReconstructionPlan {
    /// Build a plan from merged options, workspace paths, and the CPU-only
    /// toggle.
    ///
    /// # Errors
    ///
    /// Returns an error when the command identifier is missing or an option
    /// value is not a string, number, or boolean.
    pub fn build(
        mut options: Map<String, Value>,
        paths: ReconstructionPaths,
        cpu_only: bool,
    ) -> StageResult<Self> {
        if cpu_only {
            for key in CPU_ONLY_OVERRIDES {
                options.insert((*key).to_string(), Value::Bool(false));
            }
        }

        let command = match options.remove(COMMAND_KEY) {
            Some(Value::String(command)) if command.trim().is_empty() => {
                return Err(StageError::validation("command", "empty", None));
            }
            Some(Value::String(command)) => command,
            Some(other) => {
                return Err(StageError::validation(
                    "command",
                    "not_a_string",
                    Some(other.to_string()),
                ));
            }
            None => return Err(StageError::validation("command", "missing", None)),
        };

        let mut flags = Vec::with_capacity(options.len());
        for (key, value) in &options {
            flags.push((key.clone(), render_value(key, value)?));
        }

        Ok(Self {
            command,
            paths,
            flags,
        })
    }

    fn apply_to(&self, command: &mut Command) {
        command.arg(&self.command);
        let path_flags = [
            ("--project_path", self.paths.project.as_deref()),
            ("--workspace_path", self.paths.workspace.as_deref()),
            ("--image_path", self.paths.images.as_deref()),
            ("--database_path", self.paths.database.as_deref()),
            ("--output_path", self.paths.output.as_deref()),
        ];
        for (flag, path) in path_flags {
            if let Some(path) = path {
                command.arg(flag).arg(path);
            }
        }
        for (key, value) in &self.flags {
            command.arg(format!("--{key}")).arg(value);
        }
    }
}

/// Merge caller options over service defaults; callers win on collision.
#[must_use]
pub fn merge_options(
    defaults: &Map<String, Value>,
    caller: &Map<String, Value>,
) -> Map<String, Value> {
    let mut merged = defaults.clone();
    for (key, value) in caller {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

fn render_value(key: &str, value: &Value) -> StageResult<String> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(true) => Ok("1".to_string()),
        Value::Bool(false) => Ok("0".to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(StageError::validation(
            "options",
            "unsupported_value",
            Some(key.to_string()),
        )),
    }
}

/// Runs the external reconstruction process.
#[async_trait]
pub trait Reconstructor: Send + Sync {
    /// Execute the plan, suspending until the process exits.
    ///
    /// # Errors
    ///
    /// Returns an error when the tool cannot start or exits abnormally.
    async fn reconstruct(&self, plan: &ReconstructionPlan) -> StageResult<()>;
}

/// Production reconstructor shelling out to a colmap binary.
pub struct ColmapReconstructor {
    binary: String,
}

impl ColmapReconstructor {
    /// Create a reconstructor invoking the given binary.
    #[must_use]
    pub const fn new(binary: String) -> Self {
        Self { binary }
    }
}

#[async_trait]
impl Reconstructor for ColmapReconstructor {
    async fn reconstruct(&self, plan: &ReconstructionPlan) -> StageResult<()> {
        let mut command = Command::new(&self.binary);
        plan.apply_to(&mut command);
        let output = command
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| StageError::Spawn {
                tool: self.binary.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!(
            command = %plan.command,
            stdout = %stdout,
            stderr = %stderr,
            "reconstruction output captured"
        );

        if !output.status.success() {
            return Err(StageError::ExternalProcess {
                tool: self.binary.clone(),
                status: output.status.code(),
                stderr: stderr.into_owned(),
            });
        }

        info!(command = %plan.command, "reconstruction completed");
        Ok(())
    }
}
