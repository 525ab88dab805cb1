//! Environment parsing for the service configuration.
//!
//! # Design
//! - Every knob is optional; unset variables fall back to `defaults`.
//! - Parsing goes through a lookup closure so tests avoid mutating the
//!   process environment.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{ConfigError, ConfigResult};
use crate::model::ServiceConfig;

/// Load and validate the service configuration from the process environment.
///
/// # Errors
///
/// Returns an error when a `POSELAB_*` variable fails to parse or the
/// resulting configuration fails validation.
pub fn load_from_env() -> ConfigResult<ServiceConfig> {
    let config = load_with(|name| std::env::var(name).ok())?;
    config.validate()?;
    Ok(config)
}

fn load_with(lookup: impl Fn(&'static str) -> Option<String>) -> ConfigResult<ServiceConfig> {
    let mut config = ServiceConfig::default();
    if let Some(addr) = parse_var(&lookup, "POSELAB_BIND_ADDR")? {
        config.bind_addr = addr;
    }
    if let Some(port) = parse_var(&lookup, "POSELAB_HTTP_PORT")? {
        config.http_port = port;
    }
    if let Some(ceiling) = parse_var(&lookup, "POSELAB_MAX_PIPELINES")? {
        config.max_pipelines = ceiling;
    }
    if let Some(fps) = parse_var(&lookup, "POSELAB_SAMPLING_FPS")? {
        config.sampling_fps = fps;
    }
    if let Some(bin) = lookup("POSELAB_FFMPEG_BIN") {
        config.frame_extractor_bin = bin;
    }
    if let Some(bin) = lookup("POSELAB_COLMAP_BIN") {
        config.reconstruction_bin = bin;
    }
    if let Some(command) = lookup("POSELAB_RECONSTRUCTION_COMMAND") {
        config.reconstruction_command = command;
    }
    if let Some(root) = lookup("POSELAB_WORKSPACE_ROOT") {
        config.workspace_root = PathBuf::from(root);
    }
    if let Some(limit) = parse_var(&lookup, "POSELAB_MAX_UPLOAD_BYTES")? {
        config.max_upload_bytes = limit;
    }
    Ok(config)
}

fn parse_var<T: FromStr>(
    lookup: impl Fn(&'static str) -> Option<String>,
    name: &'static str,
) -> ConfigResult<Option<T>> {
    lookup(name).map_or(Ok(None), |raw| {
        raw.trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::invalid_value(name, raw))
    })
}
