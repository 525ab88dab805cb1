//! Health and diagnostics endpoint.

use std::sync::Arc;

use axum::{Json, extract::State};
use poselab_telemetry::build_sha;

use crate::models::{CapacityReport, HealthResponse};
use crate::state::ApiState;

pub(crate) async fn health(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    let (limit, available) = state.pipeline.capacity();
    Json(HealthResponse {
        status: "ok",
        build: build_sha().to_string(),
        capacity: CapacityReport { limit, available },
    })
}
