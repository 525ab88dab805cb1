#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

//! Request pipeline that turns an uploaded video into an archive of
//! camera-pose artifacts.
//!
//! The pipeline admits a bounded number of requests, allocates an isolated
//! workspace per request, materialises the input video, drives the external
//! frame extractor and reconstruction tool, and packages the reconstruction
//! output into a single zip. Workspaces and admission slots are scoped
//! acquisitions released on every exit path.
//!
//! Layout: `admission.rs` (concurrency ceiling), `workspace.rs` (temporary
//! directory lifecycle), `input.rs` (input sources), `frames.rs` (frame
//! extraction), `reconstruct.rs` (reconstruction invocation), `archive.rs`
//! (zip packaging), `service.rs` (orchestration).

pub mod admission;
pub mod archive;
pub mod error;
pub mod frames;
pub mod input;
pub mod reconstruct;
pub mod service;
pub mod workspace;

pub use admission::{AdmissionController, AdmissionSlot};
pub use error::{PipelineError, PipelineResult, Stage, StageError, StageResult};
pub use frames::{FfmpegExtractor, FrameExtractor};
pub use input::InputSource;
pub use reconstruct::{
    ColmapReconstructor, ReconstructionPaths, ReconstructionPlan, Reconstructor, merge_options,
};
pub use service::{PipelineOutput, PipelineRequest, PipelineService, PipelineSettings};
pub use workspace::Workspace;
