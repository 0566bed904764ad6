use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::{
    dispatch::{ImageService, Route},
    models::{
        ApiResponse, AuthTokens, GenerateRequest, GenerateSuccess, UpscaleRequest, UpscaleSuccess,
    },
};

const HF_TOKEN_HEADER: &str = "X-HF-Token";

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Turns an HTTP answer into the unified shape: 2xx bodies are the data,
/// anything else carries `{"error": "..."}` or gets `fallback`.
async fn collapse<T: DeserializeOwned>(
    sent: reqwest::Result<Response>,
    fallback: &str,
) -> ApiResponse<T> {
    let response = match sent {
        Ok(response) => response,
        Err(e) => return ApiResponse::Failure(e.to_string()),
    };

    let status = response.status();
    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => return ApiResponse::Failure(e.to_string()),
    };

    if !status.is_success() {
        let error = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.error)
            .filter(|error| !error.is_empty())
            .unwrap_or_else(|| fallback.to_string());
        log::warn!("Remote call answered {}: {}", status, error);
        return ApiResponse::Failure(error);
    }

    match serde_json::from_str(&text) {
        Ok(data) => ApiResponse::Success(data),
        Err(e) => ApiResponse::Failure(e.to_string()),
    }
}

/// Client for an upscale service exposing `POST /api/upscale`.
#[derive(Clone)]
pub struct UpscaleClient {
    client: Client,
    base_url: String,
}

impl UpscaleClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub async fn upscale(
        &self,
        url: &str,
        scale: u32,
        hf_token: Option<&str>,
    ) -> ApiResponse<UpscaleSuccess> {
        log::info!("Upscaling {} by {}x", url, scale);
        let mut request = self
            .client
            .post(format!("{}/api/upscale", self.base_url))
            .json(&UpscaleRequest {
                url: url.to_string(),
                scale,
            });
        if let Some(token) = hf_token.map(str::trim).filter(|t| !t.is_empty()) {
            request = request.header(HF_TOKEN_HEADER, token);
        }
        collapse(request.send().await, "Failed to upscale image").await
    }
}

/// Speaks the dispatch contract to a remote server (`POST /api/generate`).
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    upscaler: UpscaleClient,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            upscaler: UpscaleClient::new(client.clone(), base_url.clone()),
            client,
            base_url,
        }
    }
}

#[async_trait]
impl ImageService for ApiClient {
    async fn generate(
        &self,
        request: GenerateRequest,
        tokens: &AuthTokens,
    ) -> ApiResponse<GenerateSuccess> {
        let route = match Route::resolve(&request.provider, request.model.as_deref()) {
            Ok(route) => route,
            Err(e) => return e.into(),
        };
        let body = route.canonicalize(request);

        let mut builder = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body);
        if let Some((header, credential)) = tokens.auth_header(route.provider) {
            builder = builder.header(header, credential);
        }

        log::info!("Sending request to {} via {}", route.label, self.base_url);
        collapse(builder.send().await, "Failed to generate image").await
    }

    async fn upscale(
        &self,
        url: &str,
        scale: u32,
        hf_token: Option<&str>,
    ) -> ApiResponse<UpscaleSuccess> {
        self.upscaler.upscale(url, scale, hf_token).await
    }
}
