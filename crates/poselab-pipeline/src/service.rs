//! Pipeline orchestration for one request.
//!
//! # Design
//! - Admission slot and workspace are scoped acquisitions; both release on
//!   every exit path, in reverse order, with cleanup never masking the
//!   primary outcome.
//! - Stages run strictly sequentially; the first failure short-circuits the
//!   rest and is attributed to its stage.
//! - The finished archive is read into memory before cleanup so no partial
//!   artifact or dangling path outlives the workspace.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::admission::AdmissionController;
use crate::archive::write_archive;
use crate::error::{PipelineError, PipelineResult, Stage, StageError};
use crate::frames::FrameExtractor;
use crate::input::InputSource;
use crate::reconstruct::{ReconstructionPaths, ReconstructionPlan, Reconstructor, merge_options};
use crate::workspace::Workspace;

/// Tunables for the pipeline service.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Root directory workspaces are allocated under.
    pub workspace_root: PathBuf,
    /// Frame sampling rate in frames per second.
    pub sampling_fps: f64,
    /// Service-defined reconstruction defaults, including the `command` key.
    pub default_options: Map<String, Value>,
}

/// One pipeline invocation, immutable once created.
#[derive(Debug)]
pub struct PipelineRequest {
    /// Raw input payload.
    pub source: InputSource,
    /// Caller-supplied reconstruction options, merged over defaults.
    pub options: Map<String, Value>,
    /// Force CPU-only execution of the reconstruction tool.
    pub cpu_only: bool,
}

/// Result of a completed pipeline.
#[derive(Debug)]
pub struct PipelineOutput {
    /// The packaged archive, fully written.
    pub archive: Vec<u8>,
    /// Download filename suggested to the caller.
    pub suggested_name: String,
}

/// Sequences the pipeline stages for each request.
#[derive(Clone)]
pub struct PipelineService {
    settings: PipelineSettings,
    admission: AdmissionController,
    extractor: Arc<dyn FrameExtractor>,
    reconstructor: Arc<dyn Reconstructor>,
}

impl PipelineService {
    /// Construct a service with the given stage implementations.
    #[must_use]
    pub fn new(
        settings: PipelineSettings,
        max_pipelines: usize,
        extractor: Arc<dyn FrameExtractor>,
        reconstructor: Arc<dyn Reconstructor>,
    ) -> Self {
        Self {
            settings,
            admission: AdmissionController::new(max_pipelines),
            extractor,
            reconstructor,
        }
    }

    /// Concurrency ceiling and currently free slots.
    #[must_use]
    pub fn capacity(&self) -> (usize, usize) {
        (self.admission.limit(), self.admission.available())
    }

    /// Run the full pipeline for one request.
    ///
    /// # Errors
    ///
    /// Returns `AdmissionRejected` when the ceiling is reached, otherwise
    /// the first stage failure; the workspace is removed in every case.
    pub async fn run(&self, request: PipelineRequest) -> PipelineResult<PipelineOutput> {
        let Some(slot) = self.admission.try_admit() else {
            info!(
                limit = self.admission.limit(),
                "pipeline at capacity, rejecting request"
            );
            return Err(PipelineError::AdmissionRejected {
                limit: self.admission.limit(),
            });
        };

        // Cheap validation before any directory exists.
        request
            .source
            .validate()
            .map_err(|source| PipelineError::stage(Stage::InputAcquisition, source))?;

        let mut workspace = Workspace::allocate(&self.settings.workspace_root)
            .map_err(|source| PipelineError::stage(Stage::Workspace, source))?;
        let token = workspace.token();
        info!(%token, "pipeline admitted");

        let result = self.execute(&request, &workspace).await;

        if let Err(error) = workspace.cleanup() {
            warn!(%token, error = %error, "workspace cleanup failed");
        }
        drop(slot);

        match &result {
            Ok(output) => info!(
                %token,
                archive_bytes = output.archive.len(),
                "pipeline completed"
            ),
            Err(error) => warn!(
                %token,
                stage = error.failed_stage().map_or("admission", Stage::as_str),
                error = %error,
                "pipeline failed"
            ),
        }
        result
    }

    async fn execute(
        &self,
        request: &PipelineRequest,
        workspace: &Workspace,
    ) -> PipelineResult<PipelineOutput> {
        let input_file = request
            .source
            .materialize(workspace.input_dir())
            .await
            .map_err(|source| PipelineError::stage(Stage::InputAcquisition, source))?;

        self.extractor
            .extract(&input_file, workspace.image_dir(), self.settings.sampling_fps)
            .await
            .map_err(|source| PipelineError::stage(Stage::FrameExtraction, source))?;

        let merged = merge_options(&self.settings.default_options, &request.options);
        let paths = ReconstructionPaths {
            workspace: Some(workspace.input_dir().to_path_buf()),
            images: Some(workspace.image_dir().to_path_buf()),
            output: Some(workspace.output_dir().to_path_buf()),
            ..ReconstructionPaths::default()
        };
        let plan = ReconstructionPlan::build(merged, paths, request.cpu_only)
            .map_err(|source| PipelineError::stage(Stage::Reconstruction, source))?;
        self.reconstructor
            .reconstruct(&plan)
            .await
            .map_err(|source| PipelineError::stage(Stage::Reconstruction, source))?;

        let target = workspace.archive_target();
        let output_dir = workspace.output_dir().to_path_buf();
        let archive_path = target.clone();
        tokio::task::spawn_blocking(move || write_archive(&output_dir, &archive_path))
            .await
            .map_err(|join_error| {
                PipelineError::stage(
                    Stage::Archive,
                    StageError::storage(
                        "archive.join",
                        &target,
                        std::io::Error::other(join_error),
                    ),
                )
            })?
            .map_err(|source| PipelineError::stage(Stage::Archive, source))?;

        let archive = tokio::fs::read(&target)
            .await
            .map_err(|source| {
                PipelineError::stage(
                    Stage::Archive,
                    StageError::storage("archive.read", &target, source),
                )
            })?;

        Ok(PipelineOutput {
            archive,
            suggested_name: suggested_name(request, workspace),
        })
    }
}

fn suggested_name(request: &PipelineRequest, workspace: &Workspace) -> String {
    request
        .source
        .declared_name()
        .and_then(|name| std::path::Path::new(name).file_stem())
        .and_then(|stem| stem.to_str())
        .map(sanitize_stem)
        .filter(|stem| !stem.is_empty())
        .map_or_else(
            || format!("poses-{}.zip", workspace.token()),
            |stem| format!("poses-{stem}.zip"),
        )
}

// Only characters that stay inert inside a quoted Content-Disposition
// filename survive; an emptied stem falls back to the workspace token.
fn sanitize_stem(stem: &str) -> String {
    stem.chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'))
        .collect()
}
