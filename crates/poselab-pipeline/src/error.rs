//! # Design
//!
//! - Provide structured, constant-message errors for the pose pipeline.
//! - Capture operation context (paths, tools, captured stderr) so failures
//!   are reproducible in tests.
//! - Preserve source errors without interpolating context into messages.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for whole-pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result alias for individual stage operations.
pub type StageResult<T> = Result<T, StageError>;

/// Pipeline stages as reported in failure outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Workspace directory allocation.
    Workspace,
    /// Input validation and materialisation.
    InputAcquisition,
    /// External frame extraction.
    FrameExtraction,
    /// External reconstruction.
    Reconstruction,
    /// Output archive packaging.
    Archive,
}

impl Stage {
    /// Render the stage name as reported to callers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Workspace => "workspace",
            Self::InputAcquisition => "inputAcquisition",
            Self::FrameExtraction => "frameExtraction",
            Self::Reconstruction => "reconstruction",
            Self::Archive => "archive",
        }
    }
}

/// Top-level pipeline outcome errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The concurrency ceiling was reached; the request was not admitted.
    #[error("pipeline admission rejected")]
    AdmissionRejected {
        /// Configured ceiling on concurrent pipelines.
        limit: usize,
    },
    /// A pipeline stage failed; all later stages were skipped.
    #[error("pipeline stage failed")]
    Stage {
        /// Stage that produced the failure.
        stage: Stage,
        /// Underlying stage error.
        #[source]
        source: StageError,
    },
}

impl PipelineError {
    pub(crate) const fn stage(stage: Stage, source: StageError) -> Self {
        Self::Stage { stage, source }
    }

    /// Stage the failure was attributed to, when one was reached.
    #[must_use]
    pub const fn failed_stage(&self) -> Option<Stage> {
        match self {
            Self::AdmissionRejected { .. } => None,
            Self::Stage { stage, .. } => Some(*stage),
        }
    }
}

/// Errors produced by individual pipeline stages.
#[derive(Debug, Error)]
pub enum StageError {
    /// Workspace allocation or teardown failed.
    #[error("workspace resource failure")]
    Resource {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The request input was malformed or unsupported.
    #[error("invalid pipeline input")]
    Validation {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// A file write, move, or read failed.
    #[error("pipeline storage failure")]
    Storage {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// An external tool could not be spawned.
    #[error("failed to spawn external process")]
    Spawn {
        /// Tool binary that failed to spawn.
        tool: String,
        /// Underlying IO error.
        source: io::Error,
    },
    /// An external tool exited abnormally.
    #[error("external process failed")]
    ExternalProcess {
        /// Tool binary that failed.
        tool: String,
        /// Exit code when the process was not killed by a signal.
        status: Option<i32>,
        /// Captured standard error output.
        stderr: String,
    },
    /// Directory traversal failed while packaging output.
    #[error("directory traversal failure")]
    Walk {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying walkdir error.
        source: walkdir::Error,
    },
    /// Zip archive writing failed.
    #[error("archive write failure")]
    Archive {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying zip error.
        source: zip::result::ZipError,
    },
}

impl StageError {
    pub(crate) fn resource(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: io::Error,
    ) -> Self {
        Self::Resource {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn storage(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: io::Error,
    ) -> Self {
        Self::Storage {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) const fn validation(
        field: &'static str,
        reason: &'static str,
        value: Option<String>,
    ) -> Self {
        Self::Validation {
            field,
            reason,
            value,
        }
    }
}
