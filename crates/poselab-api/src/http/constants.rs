//! Shared HTTP constants (field names, problem URIs).

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";

pub(crate) const MULTIPART_VIDEO_FIELD: &str = "video";
pub(crate) const MULTIPART_OPTIONS_FIELD: &str = "options";
pub(crate) const MULTIPART_CPU_ONLY_FIELD: &str = "cpu_only";

pub(crate) const PROBLEM_INTERNAL: &str = "https://poselab.dev/problems/internal";
pub(crate) const PROBLEM_BAD_REQUEST: &str = "https://poselab.dev/problems/bad-request";
pub(crate) const PROBLEM_SERVICE_UNAVAILABLE: &str =
    "https://poselab.dev/problems/service-unavailable";
pub(crate) const PROBLEM_UPSTREAM_TOOL: &str = "https://poselab.dev/problems/upstream-tool";

/// Stderr excerpts embedded in problem documents are clipped to this length.
pub(crate) const MAX_STDERR_DETAIL: usize = 2000;
