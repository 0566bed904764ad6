use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope posted to `/gradio_api/call/{endpoint}`.
#[derive(Debug, Serialize)]
pub struct GradioCallRequest<'a> {
    pub data: &'a [Value],
}

#[derive(Debug, Deserialize)]
pub struct GradioCallResponse {
    #[serde(default)]
    pub event_id: Option<String>,
}

/// Handle for a submitted job; consumed by the poll phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueJob {
    pub event_id: String,
}
