use async_trait::async_trait;
use reqwest::Client;

use crate::{
    error::{GenerateError, Result},
    models::{
        openai::{GiteeExtraBody, OpenAiErrorResponse, OpenAiImageRequest, OpenAiImageResponse},
        GenerateRequest, GenerateSuccess,
    },
    providers::ImageProvider,
};

const DEFAULT_MODEL: &str = "z-image-turbo";
const DEFAULT_STEPS: u32 = 9;

/// Gitee AI through its OpenAI-compatible images endpoint.
#[derive(Clone)]
pub struct GiteeProvider {
    client: Client,
    base_url: String,
}

impl GiteeProvider {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request(request: &GenerateRequest) -> OpenAiImageRequest {
        OpenAiImageRequest {
            prompt: request.prompt.clone(),
            model: request
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            size: format!("{}x{}", request.width, request.height),
            extra: GiteeExtraBody {
                negative_prompt: request.negative_prompt.clone().unwrap_or_default(),
                num_inference_steps: request.steps.unwrap_or(DEFAULT_STEPS),
            },
        }
    }
}

#[async_trait]
impl ImageProvider for GiteeProvider {
    fn id(&self) -> &'static str {
        "gitee"
    }

    fn name(&self) -> &'static str {
        "Gitee AI"
    }

    async fn generate(
        &self,
        request: &GenerateRequest,
        auth_token: Option<&str>,
    ) -> Result<GenerateSuccess> {
        let api_key = auth_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GenerateError::AuthRequired(self.name().to_string()))?;

        let payload = Self::build_request(request);
        log::info!("Generating image with model: {}", payload.model);
        log::debug!(
            "Gitee request: size={} steps={}",
            payload.size,
            payload.extra.num_inference_steps
        );

        let response = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GenerateError::RequestError(format!("Gitee AI request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GenerateError::ResponseError(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<OpenAiErrorResponse>(&text)
                .map(|body| body.error.message)
                .unwrap_or(text);
            log::error!("Gitee AI answered {}: {}", status, message);
            return Err(GenerateError::ProviderError {
                provider: self.name().to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let body: OpenAiImageResponse = serde_json::from_str(&text)
            .map_err(|e| GenerateError::ResponseError(e.to_string()))?;

        let image = body
            .data
            .and_then(|data| data.into_iter().next())
            .flatten()
            .map(|image| GenerateSuccess {
                url: image.url.filter(|url| !url.is_empty()),
                b64_json: image.b64_json.filter(|b64| !b64.is_empty()),
                seed: None,
            })
            .filter(|image| image.url.is_some() || image.b64_json.is_some())
            .ok_or_else(|| GenerateError::NoImageReturned(self.name().to_string()))?;

        Ok(image)
    }
}
