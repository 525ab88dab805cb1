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
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! HTTP surface for the Poselab reconstruction pipeline.
//!
//! Layout: `http/` (router, handlers, problem responses), `models.rs`
//! (request/response DTOs), `state.rs` (shared application state),
//! `error.rs` (server bootstrap errors).

pub mod error;
/// HTTP surface modules (router, handlers, problem responses).
pub mod http;
pub mod models;

mod state;

pub use error::{ApiServerError, ApiServerResult};
pub use http::router::ApiServer;
