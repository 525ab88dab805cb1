//! Frame extraction against the external extractor binary.
//!
//! # Design
//! - The extractor is a trait seam so orchestration is testable without the
//!   real tool; the production implementation shells out to ffmpeg.
//! - Strictly sequential with the other stages of the same request; the
//!   call suspends until the process exits.
//! - Zero extracted frames is a valid success; downstream stages surface
//!   the consequence.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{StageError, StageResult};

/// Zero-padded name pattern for extracted frames; lexicographic order
/// matches frame order.
const FRAME_PATTERN: &str = "frame_%05d.png";

/// Extracts a still-image sequence from a video file.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Populate `image_dir` with frames sampled from `input_file`.
    ///
    /// # Errors
    ///
    /// Returns an error when the extractor cannot start or exits abnormally.
    async fn extract(
        &self,
        input_file: &Path,
        image_dir: &Path,
        sampling_fps: f64,
    ) -> StageResult<()>;
}

/// Production extractor shelling out to an ffmpeg binary.
pub struct FfmpegExtractor {
    binary: String,
}

impl FfmpegExtractor {
    /// Create an extractor invoking the given binary.
    #[must_use]
    pub const fn new(binary: String) -> Self {
        Self { binary }
    }
}

#[async_trait]
impl FrameExtractor for FfmpegExtractor {
    async fn extract(
        &self,
        input_file: &Path,
        image_dir: &Path,
        sampling_fps: f64,
    ) -> StageResult<()> {
        let pattern = image_dir.join(FRAME_PATTERN);
        let output = Command::new(&self.binary)
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(input_file)
            .arg("-vf")
            .arg(format!("fps={sampling_fps}"))
            .arg("-start_number")
            .arg("0")
            .arg(&pattern)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| StageError::Spawn {
                tool: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(StageError::ExternalProcess {
                tool: self.binary.clone(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        debug!(
            input = %input_file.display(),
            pattern = %pattern.display(),
            "frame extractor output captured"
        );
        info!(
            image_dir = %image_dir.display(),
            sampling_fps,
            "frame extraction completed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_binary_surfaces_spawn_error() -> Result<(), Box<dyn Error>> {
        let dir = TempDir::new()?;
        let extractor = FfmpegExtractor::new("poselab-no-such-binary".to_string());
        let result = extractor
            .extract(&dir.path().join("input.mp4"), dir.path(), 2.0)
            .await;
        assert!(matches!(result, Err(StageError::Spawn { .. })));
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_surfaces_process_error_with_stderr() -> Result<(), Box<dyn Error>> {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new()?;
        let script = dir.path().join("fake-ffmpeg");
        std::fs::write(&script, "#!/bin/sh\necho 'decode error' >&2\nexit 69\n")?;
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))?;

        let extractor = FfmpegExtractor::new(script.display().to_string());
        let result = extractor
            .extract(&dir.path().join("input.mp4"), dir.path(), 1.0)
            .await;
        match result {
            Err(StageError::ExternalProcess { status, stderr, .. }) => {
                assert_eq!(status, Some(69));
                assert!(stderr.contains("decode error"));
            }
            other => panic!("expected process failure, got {other:?}"),
        }
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_exit_is_a_stage_success() -> Result<(), Box<dyn Error>> {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new()?;
        let script = dir.path().join("fake-ffmpeg");
        std::fs::write(&script, "#!/bin/sh\nexit 0\n")?;
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))?;

        let extractor = FfmpegExtractor::new(script.display().to_string());
        extractor
            .extract(&dir.path().join("input.mp4"), dir.path(), 1.0)
            .await?;
        Ok(())
    }
}
