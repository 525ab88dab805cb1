//! Typed configuration model and validation.
//!
//! # Design
//! - Pure data carrier used by the application bootstrap and the API server.
//! - Validation rejects values that would make the pipeline inoperable.

use std::net::IpAddr;
use std::path::PathBuf;

use crate::defaults;
use crate::error::{ConfigError, ConfigResult};

/// Runtime configuration for the Poselab service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// IP address the HTTP listener binds to.
    pub bind_addr: IpAddr,
    /// Port the HTTP listener binds to.
    pub http_port: u16,
    /// Ceiling on concurrently running pipelines.
    pub max_pipelines: usize,
    /// Frame sampling rate passed to the frame extractor, in frames per second.
    pub sampling_fps: f64,
    /// Binary invoked for frame extraction.
    pub frame_extractor_bin: String,
    /// Binary invoked for reconstruction.
    pub reconstruction_bin: String,
    /// Default reconstruction command identifier.
    pub reconstruction_command: String,
    /// Root directory under which per-request workspaces are allocated.
    pub workspace_root: PathBuf,
    /// Upper bound on uploaded payload size in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: defaults::BIND_ADDR,
            http_port: defaults::HTTP_PORT,
            max_pipelines: defaults::MAX_PIPELINES,
            sampling_fps: defaults::SAMPLING_FPS,
            frame_extractor_bin: defaults::FRAME_EXTRACTOR_BIN.to_string(),
            reconstruction_bin: defaults::RECONSTRUCTION_BIN.to_string(),
            reconstruction_command: defaults::RECONSTRUCTION_COMMAND.to_string(),
            workspace_root: std::env::temp_dir(),
            max_upload_bytes: defaults::MAX_UPLOAD_BYTES,
        }
    }
}

impl ServiceConfig {
    /// Validate field-level invariants before the service starts.
    ///
    /// # Errors
    ///
    /// Returns an error when a field would make the pipeline inoperable.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.http_port == 0 {
            return Err(ConfigError::invalid_config("http_port", "zero", None));
        }
        if self.max_pipelines == 0 {
            return Err(ConfigError::invalid_config("max_pipelines", "zero", None));
        }
        if !self.sampling_fps.is_finite() || self.sampling_fps <= 0.0 {
            return Err(ConfigError::invalid_config(
                "sampling_fps",
                "non_positive",
                Some(self.sampling_fps.to_string()),
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::invalid_config("max_upload_bytes", "zero", None));
        }
        if self.frame_extractor_bin.trim().is_empty() {
            return Err(ConfigError::invalid_config(
                "frame_extractor_bin",
                "empty",
                None,
            ));
        }
        if self.reconstruction_bin.trim().is_empty() {
            return Err(ConfigError::invalid_config(
                "reconstruction_bin",
                "empty",
                None,
            ));
        }
        if self.reconstruction_command.trim().is_empty() {
            return Err(ConfigError::invalid_config(
                "reconstruction_command",
                "empty",
                None,
            ));
        }
        Ok(())
    }
}
