//! Input sources and their materialisation into the workspace.
//!
//! # Design
//! - A closed sum type over the two supported sources keeps per-variant
//!   behaviour exhaustively checked.
//! - Validation runs before any directory or process work so malformed
//!   requests fail with zero filesystem effects.

use std::path::{Path, PathBuf};

use crate::error::{StageError, StageResult};

/// Canonical file name the input video is materialised under.
pub(crate) const INPUT_FILE_NAME: &str = "input.mp4";

/// The one video container accepted from uploads.
const SUPPORTED_CONTENT_TYPE: &str = "video/mp4";

/// Raw input payload for one pipeline request.
#[derive(Debug)]
pub enum InputSource {
    /// Bytes delivered inline in the request body.
    InlineBuffer {
        /// Raw video bytes.
        bytes: Vec<u8>,
    },
    /// A file uploaded alongside the request.
    UploadedFile {
        /// Raw video bytes read from the upload stream.
        bytes: Vec<u8>,
        /// File name declared by the uploader.
        declared_name: String,
        /// Media type declared by the uploader.
        content_type: String,
    },
}

impl InputSource {
    /// Check the source before any workspace exists.
    ///
    /// # Errors
    ///
    /// Returns an error for empty payloads and, for uploads, undeclared or
    /// unsupported media types.
    pub fn validate(&self) -> StageResult<()> {
        match self {
            Self::InlineBuffer { bytes } => {
                if bytes.is_empty() {
                    return Err(StageError::validation("video", "empty_payload", None));
                }
            }
            Self::UploadedFile {
                bytes,
                content_type,
                ..
            } => {
                if bytes.is_empty() {
                    return Err(StageError::validation("video", "empty_payload", None));
                }
                if content_type != SUPPORTED_CONTENT_TYPE {
                    return Err(StageError::validation(
                        "content_type",
                        "unsupported_container",
                        Some(content_type.clone()),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Write the payload into `target_dir` under the canonical input name.
    ///
    /// # Errors
    ///
    /// Returns an error when the write fails.
    pub async fn materialize(&self, target_dir: &Path) -> StageResult<PathBuf> {
        let target = target_dir.join(INPUT_FILE_NAME);
        let bytes = match self {
            Self::InlineBuffer { bytes } | Self::UploadedFile { bytes, .. } => bytes,
        };
        tokio::fs::write(&target, bytes)
            .await
            .map_err(|source| StageError::storage("input.write", &target, source))?;
        Ok(target)
    }

    /// Name declared by the uploader, when one was given.
    #[must_use]
    pub fn declared_name(&self) -> Option<&str> {
        match self {
            Self::InlineBuffer { .. } => None,
            Self::UploadedFile { declared_name, .. } => Some(declared_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use tempfile::TempDir;

    fn upload(bytes: &[u8], content_type: &str) -> InputSource {
        InputSource::UploadedFile {
            bytes: bytes.to_vec(),
            declared_name: "capture.mp4".to_string(),
            content_type: content_type.to_string(),
        }
    }

    #[test]
    fn inline_buffer_with_bytes_is_valid() {
        let source = InputSource::InlineBuffer {
            bytes: vec![0u8; 16],
        };
        assert!(source.validate().is_ok());
    }

    #[test]
    fn empty_payloads_are_rejected() {
        let inline = InputSource::InlineBuffer { bytes: Vec::new() };
        assert!(matches!(
            inline.validate(),
            Err(StageError::Validation {
                reason: "empty_payload",
                ..
            })
        ));

        let uploaded = upload(b"", SUPPORTED_CONTENT_TYPE);
        assert!(uploaded.validate().is_err());
    }

    #[test]
    fn unsupported_container_is_rejected() {
        let source = upload(b"riff", "video/x-msvideo");
        assert!(matches!(
            source.validate(),
            Err(StageError::Validation {
                field: "content_type",
                reason: "unsupported_container",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn materialize_writes_canonical_file() -> Result<(), Box<dyn Error>> {
        let dir = TempDir::new()?;
        let source = upload(b"mp4-bytes", SUPPORTED_CONTENT_TYPE);
        let path = source.materialize(dir.path()).await?;
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some(INPUT_FILE_NAME));
        assert_eq!(std::fs::read(&path)?, b"mp4-bytes");
        Ok(())
    }

    #[tokio::test]
    async fn materialize_into_missing_directory_is_a_storage_error() {
        let source = InputSource::InlineBuffer {
            bytes: vec![1, 2, 3],
        };
        let result = source.materialize(Path::new("/nonexistent/poselab")).await;
        assert!(matches!(result, Err(StageError::Storage { .. })));
    }

    #[test]
    fn declared_name_only_comes_from_uploads() {
        let inline = InputSource::InlineBuffer { bytes: vec![1] };
        assert!(inline.declared_name().is_none());
        let uploaded = upload(b"x", SUPPORTED_CONTENT_TYPE);
        assert_eq!(uploaded.declared_name(), Some("capture.mp4"));
    }
}
