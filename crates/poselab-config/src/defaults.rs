//! Baseline configuration values for the service.
//!
//! # Design
//! - Centralize defaults so the loader and tests agree on one source.
//! - Keep tool names and limits explicit for auditability.

use std::net::{IpAddr, Ipv4Addr};

/// Default interface the HTTP listener binds to.
pub const BIND_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
/// Default HTTP port for the service.
pub const HTTP_PORT: u16 = 7070;
/// Default ceiling on concurrently running pipelines.
pub const MAX_PIPELINES: usize = 4;
/// Default frame sampling rate in frames per second.
pub const SAMPLING_FPS: f64 = 2.0;
/// Default frame extractor binary name.
pub const FRAME_EXTRACTOR_BIN: &str = "ffmpeg";
/// Default reconstruction binary name.
pub const RECONSTRUCTION_BIN: &str = "colmap";
/// Default reconstruction command identifier.
pub const RECONSTRUCTION_COMMAND: &str = "automatic_reconstructor";
/// Default upper bound on uploaded payload size in bytes.
pub const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;
