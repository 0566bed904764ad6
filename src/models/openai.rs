use serde::{Deserialize, Serialize};

/// Body of an OpenAI-compatible `POST /images/generations`.
#[derive(Debug, Serialize)]
pub struct OpenAiImageRequest {
    pub prompt: String,
    pub model: String,
    pub size: String,
    /// Provider-specific fields, sent at the top level of the body.
    #[serde(flatten)]
    pub extra: GiteeExtraBody,
}

#[derive(Debug, Serialize)]
pub struct GiteeExtraBody {
    pub negative_prompt: String,
    pub num_inference_steps: u32,
}

#[derive(Debug, Deserialize)]
pub struct OpenAiImageResponse {
    /// Entries may be `null`.
    #[serde(default)]
    pub data: Option<Vec<Option<OpenAiImageData>>>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAiImageData {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub b64_json: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAiErrorResponse {
    pub error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct OpenAiErrorBody {
    pub message: String,
}
