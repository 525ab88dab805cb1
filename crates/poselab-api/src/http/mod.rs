//! HTTP surface modules (router, handlers, problem responses).

/// Shared constants and problem URIs for HTTP surfaces.
pub mod constants;
/// Problem response helpers and error types.
pub mod errors;
/// Health and diagnostics endpoint.
pub mod health;
/// Reconstruction pipeline endpoint.
pub mod reconstructions;
/// Router construction and server host.
pub mod router;
