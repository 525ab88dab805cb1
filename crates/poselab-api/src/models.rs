//! Shared HTTP DTOs for the Poselab public API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// RFC9457-compatible problem document surfaced on rejection and failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemDetails {
    /// Problem type URI.
    #[serde(rename = "type")]
    pub kind: String,
    /// Short human-readable summary.
    pub title: String,
    /// HTTP status code mirrored into the body.
    pub status: u16,
    /// Request-specific detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Pipeline stage the failure was attributed to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

/// JSON request body carrying the video inline.
#[derive(Debug, Deserialize)]
pub struct ReconstructionBody {
    /// Base64-encoded video payload.
    pub video: String,
    /// Reconstruction options merged over service defaults.
    #[serde(default)]
    pub options: Map<String, Value>,
    /// Force CPU-only execution of the reconstruction tool.
    #[serde(default)]
    pub cpu_only: bool,
}

/// Capacity report embedded in the health response.
#[derive(Debug, Serialize)]
pub struct CapacityReport {
    /// Configured ceiling on concurrent pipelines.
    pub limit: usize,
    /// Slots currently free.
    pub available: usize,
}

/// Liveness response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status string.
    pub status: &'static str,
    /// Build identifier recorded at logging initialisation.
    pub build: String,
    /// Pipeline capacity snapshot.
    pub capacity: CapacityReport,
}
