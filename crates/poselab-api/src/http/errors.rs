//! RFC9457-style API error wrapper and pipeline outcome mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use poselab_pipeline::{PipelineError, Stage, StageError};

use crate::http::constants::{
    MAX_STDERR_DETAIL, PROBLEM_BAD_REQUEST, PROBLEM_INTERNAL, PROBLEM_SERVICE_UNAVAILABLE,
    PROBLEM_UPSTREAM_TOOL,
};
use crate::models::ProblemDetails;

/// Structured API error rendered as a problem document.
#[derive(Debug)]
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    kind: &'static str,
    title: &'static str,
    detail: Option<String>,
    stage: Option<&'static str>,
}

impl ApiError {
    const fn new(status: StatusCode, kind: &'static str, title: &'static str) -> Self {
        Self {
            status,
            kind,
            title,
            detail: None,
            stage: None,
        }
    }

    pub(crate) fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    const fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage.as_str());
        self
    }

    pub(crate) fn internal(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            PROBLEM_INTERNAL,
            "internal server error",
        )
        .with_detail(detail)
    }

    pub(crate) fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, PROBLEM_BAD_REQUEST, "bad request").with_detail(detail)
    }

    pub(crate) fn service_unavailable(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            PROBLEM_SERVICE_UNAVAILABLE,
            "service unavailable",
        )
        .with_detail(detail)
    }

    pub(crate) fn bad_gateway(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_GATEWAY,
            PROBLEM_UPSTREAM_TOOL,
            "external tool failed",
        )
        .with_detail(detail)
    }

    /// Map a pipeline outcome to the uniform failure response.
    pub(crate) fn from_pipeline(error: &PipelineError) -> Self {
        match error {
            PipelineError::AdmissionRejected { limit } => Self::service_unavailable(format!(
                "all {limit} pipeline slots are busy; retry later"
            )),
            PipelineError::Stage { stage, source } => {
                Self::from_stage_error(source).with_stage(*stage)
            }
        }
    }

    fn from_stage_error(source: &StageError) -> Self {
        match source {
            StageError::Validation {
                field,
                reason,
                value,
            } => {
                let detail = value.as_ref().map_or_else(
                    || format!("{field}: {reason}"),
                    |value| format!("{field}: {reason} ({value})"),
                );
                Self::bad_request(detail)
            }
            StageError::Spawn { tool, .. } => {
                Self::bad_gateway(format!("failed to launch {tool}"))
            }
            StageError::ExternalProcess {
                tool,
                status,
                stderr,
            } => {
                let status = status.map_or_else(|| "signal".to_string(), |code| code.to_string());
                let mut detail = format!("{tool} exited with status {status}");
                let trimmed = stderr.trim();
                if !trimmed.is_empty() {
                    let clipped: String = trimmed.chars().take(MAX_STDERR_DETAIL).collect();
                    detail.push_str(": ");
                    detail.push_str(&clipped);
                }
                Self::bad_gateway(detail)
            }
            StageError::Resource { .. }
            | StageError::Storage { .. }
            | StageError::Walk { .. }
            | StageError::Archive { .. } => Self::internal("pipeline storage failure"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ProblemDetails {
            kind: self.kind.to_string(),
            title: self.title.to_string(),
            status: self.status.as_u16(),
            detail: self.detail,
            stage: self.stage.map(str::to_string),
        };
        (self.status, Json(body)).into_response()
    }
}
