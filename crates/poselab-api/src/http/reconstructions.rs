//! The reconstruction pipeline endpoint.
//!
//! Accepts either a multipart upload carrying the video file or a JSON body
//! carrying the video inline as base64, runs the pipeline, and streams the
//! packaged archive back to the caller.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{FromRequest, Multipart, Request, State},
    http::{StatusCode, header},
    response::Response,
};
use base64::{Engine as _, engine::general_purpose};
use poselab_pipeline::{InputSource, PipelineOutput, PipelineRequest};
use serde_json::Map;
use tracing::error;

use crate::http::constants::{
    MULTIPART_CPU_ONLY_FIELD, MULTIPART_OPTIONS_FIELD, MULTIPART_VIDEO_FIELD,
};
use crate::http::errors::ApiError;
use crate::state::ApiState;

pub(crate) async fn create_reconstruction(
    State(state): State<Arc<ApiState>>,
    request: Request,
) -> Result<Response, ApiError> {
    let pipeline_request = decode_request(request).await?;
    match state.pipeline.run(pipeline_request).await {
        Ok(output) => archive_response(output),
        Err(outcome) => Err(ApiError::from_pipeline(&outcome)),
    }
}

async fn decode_request(request: Request) -> Result<PipelineRequest, ApiError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|err| ApiError::bad_request(format!("malformed multipart body: {err}")))?;
        decode_multipart(multipart).await
    } else if content_type.starts_with("application/json") {
        decode_json(request).await
    } else {
        Err(ApiError::bad_request(
            "expected multipart/form-data or application/json",
        ))
    }
}

async fn decode_json(request: Request) -> Result<PipelineRequest, ApiError> {
    let Json(body) = Json::<crate::models::ReconstructionBody>::from_request(request, &())
        .await
        .map_err(|err| ApiError::bad_request(format!("malformed json body: {err}")))?;
    let bytes = general_purpose::STANDARD
        .decode(body.video.as_bytes())
        .map_err(|_| ApiError::bad_request("video payload is not valid base64"))?;
    Ok(PipelineRequest {
        source: InputSource::InlineBuffer { bytes },
        options: body.options,
        cpu_only: body.cpu_only,
    })
}

async fn decode_multipart(mut multipart: Multipart) -> Result<PipelineRequest, ApiError> {
    let mut source = None;
    let mut options = Map::new();
    let mut cpu_only = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(format!("malformed multipart body: {err}")))?
    {
        match field.name().unwrap_or("") {
            MULTIPART_VIDEO_FIELD => {
                let declared_name = field.file_name().unwrap_or("input.mp4").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(|err| {
                    ApiError::bad_request(format!("failed to read video field: {err}"))
                })?;
                source = Some(InputSource::UploadedFile {
                    bytes: bytes.to_vec(),
                    declared_name,
                    content_type,
                });
            }
            MULTIPART_OPTIONS_FIELD => {
                let text = field.text().await.map_err(|err| {
                    ApiError::bad_request(format!("failed to read options field: {err}"))
                })?;
                options = serde_json::from_str(&text).map_err(|_| {
                    ApiError::bad_request("options field is not a JSON object")
                })?;
            }
            MULTIPART_CPU_ONLY_FIELD => {
                let text = field.text().await.map_err(|err| {
                    ApiError::bad_request(format!("failed to read cpu_only field: {err}"))
                })?;
                cpu_only = matches!(
                    text.trim().to_ascii_lowercase().as_str(),
                    "1" | "true" | "yes" | "on"
                );
            }
            _ => {}
        }
    }

    let source = source.ok_or_else(|| ApiError::bad_request("video field is required"))?;
    Ok(PipelineRequest {
        source,
        options,
        cpu_only,
    })
}

fn archive_response(output: PipelineOutput) -> Result<Response, ApiError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", output.suggested_name),
        )
        .body(Body::from(output.archive))
        .map_err(|err| {
            error!(error = %err, "failed to build archive response");
            ApiError::internal("failed to build archive response")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use poselab_pipeline::{
        FrameExtractor, PipelineService, PipelineSettings, ReconstructionPlan, Reconstructor,
        StageResult,
    };
    use serde_json::Value;
    use std::path::Path;
    use tempfile::TempDir;

    struct WriteFrame;

    #[async_trait]
    impl FrameExtractor for WriteFrame {
        async fn extract(
            &self,
            _input_file: &Path,
            image_dir: &Path,
            _sampling_fps: f64,
        ) -> StageResult<()> {
            std::fs::write(image_dir.join("frame_00000.png"), b"png").map_err(|_| {
                poselab_pipeline::StageError::Validation {
                    field: "test",
                    reason: "write_failed",
                    value: None,
                }
            })
        }
    }

    struct WriteArtifact;

    #[async_trait]
    impl Reconstructor for WriteArtifact {
        async fn reconstruct(&self, plan: &ReconstructionPlan) -> StageResult<()> {
            let output = plan.paths.output.as_deref().ok_or(
                poselab_pipeline::StageError::Validation {
                    field: "output",
                    reason: "missing",
                    value: None,
                },
            )?;
            std::fs::write(output.join("cameras.txt"), b"poses").map_err(|_| {
                poselab_pipeline::StageError::Validation {
                    field: "test",
                    reason: "write_failed",
                    value: None,
                }
            })
        }
    }

    fn test_state(root: &Path) -> Arc<ApiState> {
        let mut default_options = Map::new();
        default_options.insert(
            "command".to_string(),
            Value::String("automatic_reconstructor".to_string()),
        );
        let settings = PipelineSettings {
            workspace_root: root.to_path_buf(),
            sampling_fps: 2.0,
            default_options,
        };
        let pipeline = PipelineService::new(
            settings,
            2,
            Arc::new(WriteFrame),
            Arc::new(WriteArtifact),
        );
        Arc::new(ApiState::new(Arc::new(pipeline)))
    }

    fn json_request(body: &Value) -> Request {
        Request::builder()
            .method("POST")
            .uri("/v1/reconstructions")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn json_inline_video_yields_a_zip_attachment() {
        let root = TempDir::new().expect("tempdir");
        let state = test_state(root.path());
        let body = serde_json::json!({
            "video": general_purpose::STANDARD.encode(b"mp4-bytes"),
            "options": {"quality": "high"},
            "cpu_only": true
        });

        let response = create_reconstruction(State(state), json_request(&body))
            .await
            .expect("success response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
            Some("application/zip")
        );
        assert!(
            response
                .headers()
                .get(header::CONTENT_DISPOSITION)
                .and_then(|value| value.to_str().ok())
                .is_some_and(|value| value.starts_with("attachment; filename=\"poses-"))
        );
    }

    #[tokio::test]
    async fn invalid_base64_is_rejected_before_the_pipeline_runs() {
        let root = TempDir::new().expect("tempdir");
        let state = test_state(root.path());
        let body = serde_json::json!({"video": "not-base64!!"});

        let error = create_reconstruction(State(state), json_request(&body))
            .await
            .expect_err("expected rejection");
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(std::fs::read_dir(root.path()).expect("read").count(), 0);
    }

    #[tokio::test]
    async fn unsupported_content_type_is_rejected() {
        let root = TempDir::new().expect("tempdir");
        let state = test_state(root.path());
        let request = Request::builder()
            .method("POST")
            .uri("/v1/reconstructions")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("video"))
            .expect("request");

        let error = create_reconstruction(State(state), request)
            .await
            .expect_err("expected rejection");
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn multipart_upload_round_trips_through_the_pipeline() {
        let root = TempDir::new().expect("tempdir");
        let state = test_state(root.path());

        let boundary = "poselab-test-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"video\"; filename=\"capture.mp4\"\r\n\
             Content-Type: video/mp4\r\n\r\n\
             mp4-bytes\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"options\"\r\n\r\n\
             {{\"quality\": \"high\"}}\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"cpu_only\"\r\n\r\n\
             true\r\n\
             --{boundary}--\r\n"
        );
        let request = Request::builder()
            .method("POST")
            .uri("/v1/reconstructions")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .expect("request");

        let response = create_reconstruction(State(state), request)
            .await
            .expect("success response");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .get(header::CONTENT_DISPOSITION)
                .and_then(|value| value.to_str().ok())
                .is_some_and(|value| value.contains("poses-capture.zip"))
        );
    }

    #[tokio::test]
    async fn multipart_without_video_field_is_rejected_with_no_side_effects() {
        let root = TempDir::new().expect("tempdir");
        let state = test_state(root.path());

        let boundary = "poselab-test-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"cpu_only\"\r\n\r\n\
             true\r\n\
             --{boundary}--\r\n"
        );
        let request = Request::builder()
            .method("POST")
            .uri("/v1/reconstructions")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .expect("request");

        let error = create_reconstruction(State(state), request)
            .await
            .expect_err("expected rejection");
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(std::fs::read_dir(root.path()).expect("read").count(), 0);
    }

    #[tokio::test]
    async fn upload_with_wrong_container_maps_to_input_stage_failure() {
        let root = TempDir::new().expect("tempdir");
        let state = test_state(root.path());

        let boundary = "poselab-test-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"video\"; filename=\"capture.avi\"\r\n\
             Content-Type: video/x-msvideo\r\n\r\n\
             avi-bytes\r\n\
             --{boundary}--\r\n"
        );
        let request = Request::builder()
            .method("POST")
            .uri("/v1/reconstructions")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .expect("request");

        let error = create_reconstruction(State(state), request)
            .await
            .expect_err("expected rejection");
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(std::fs::read_dir(root.path()).expect("read").count(), 0);
    }
}
