//! Environment loading and service wiring for the Poselab binary.
//!
//! # Design
//! - Dependencies are constructed once here and injected into the pipeline
//!   and the HTTP surface; no module reads the environment on its own.
//! - The workspace root is created eagerly so admission never races
//!   directory creation under load.

use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::info;

use poselab_api::ApiServer;
use poselab_config::{ServiceConfig, load_from_env};
use poselab_pipeline::{ColmapReconstructor, FfmpegExtractor, PipelineService, PipelineSettings};
use poselab_telemetry::{LoggingConfig, init_logging};

use crate::error::{AppError, AppResult};

/// Options key carrying the reconstruction subcommand.
const COMMAND_KEY: &str = "command";

/// Entry point for the Poselab boot sequence.
///
/// # Errors
///
/// Returns an error if configuration loading, telemetry installation, or
/// the API server fails.
pub async fn run_app() -> AppResult<()> {
    init_logging(&LoggingConfig::default())
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;

    let config = load_from_env().map_err(|err| AppError::config("config.load", err))?;
    info!(
        max_pipelines = config.max_pipelines,
        sampling_fps = config.sampling_fps,
        workspace_root = %config.workspace_root.display(),
        "poselab bootstrap starting"
    );

    std::fs::create_dir_all(&config.workspace_root).map_err(|source| {
        AppError::io("workspace_root.create", &config.workspace_root, source)
    })?;

    let pipeline = Arc::new(build_pipeline(&config));
    let addr = SocketAddr::new(config.bind_addr, config.http_port);
    let server = ApiServer::new(&config, pipeline);
    server
        .serve(addr)
        .await
        .map_err(|err| AppError::api_server("api.serve", err))
}

/// Wire the pipeline service from a validated configuration.
fn build_pipeline(config: &ServiceConfig) -> PipelineService {
    PipelineService::new(
        pipeline_settings(config),
        config.max_pipelines,
        Arc::new(FfmpegExtractor::new(config.frame_extractor_bin.clone())),
        Arc::new(ColmapReconstructor::new(config.reconstruction_bin.clone())),
    )
}

/// Map configuration knobs onto pipeline tunables.
fn pipeline_settings(config: &ServiceConfig) -> PipelineSettings {
    let mut default_options = Map::new();
    default_options.insert(
        COMMAND_KEY.to_string(),
        Value::String(config.reconstruction_command.clone()),
    );
    PipelineSettings {
        workspace_root: config.workspace_root.clone(),
        sampling_fps: config.sampling_fps,
        default_options,
    }
}
