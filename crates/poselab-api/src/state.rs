//! API application state.

use std::sync::Arc;

use poselab_pipeline::PipelineService;

pub(crate) struct ApiState {
    pub(crate) pipeline: Arc<PipelineService>,
}

impl ApiState {
    pub(crate) const fn new(pipeline: Arc<PipelineService>) -> Self {
        Self { pipeline }
    }
}
