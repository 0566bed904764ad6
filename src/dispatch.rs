use async_trait::async_trait;
use reqwest::Client;
use uuid::Uuid;

use crate::{
    api_client::UpscaleClient,
    config::Config,
    error::{GenerateError, Result},
    logger,
    models::{
        model::canonical_model,
        provider::{provider_alias, provider_config},
        ApiResponse, AuthTokens, DriverKind, GenerateRequest, GenerateSuccess, ModelConfig,
        ProviderConfig, UpscaleSuccess,
    },
    providers::{GiteeProvider, HuggingFaceProvider, ImageProvider},
};

/// Anything that can generate and upscale on the caller's behalf, with every
/// failure already collapsed into the response.
#[async_trait]
pub trait ImageService: Send + Sync {
    async fn generate(
        &self,
        request: GenerateRequest,
        tokens: &AuthTokens,
    ) -> ApiResponse<GenerateSuccess>;

    async fn upscale(
        &self,
        url: &str,
        scale: u32,
        hf_token: Option<&str>,
    ) -> ApiResponse<UpscaleSuccess>;
}

/// A provider identifier and model name resolved to registry entries.
#[derive(Debug, Clone)]
pub struct Route {
    pub provider: &'static ProviderConfig,
    pub model: &'static ModelConfig,
    /// Human label of the identifier the caller used.
    pub label: &'static str,
}

impl Route {
    /// Accepts canonical ids and legacy aliases (`hf-qwen`, `hf-zimage`).
    pub fn resolve(provider: &str, model: Option<&str>) -> Result<Route> {
        let alias = provider_alias(provider)
            .ok_or_else(|| GenerateError::UnknownProvider(provider.to_string()))?;
        let config = provider_config(alias.provider)
            .ok_or_else(|| GenerateError::UnknownProvider(provider.to_string()))?;

        let model = match (alias.model, model.filter(|m| !m.is_empty())) {
            (Some(pinned), _) => canonical_model(config.id, pinned),
            (None, Some(requested)) => Some(canonical_model(config.id, requested).ok_or_else(
                || {
                    GenerateError::InvalidRequest(format!(
                        "Unknown model '{}' for provider '{}'",
                        requested, config.id
                    ))
                },
            )?),
            (None, None) => canonical_model(config.id, config.default_model),
        }
        .ok_or_else(|| {
            GenerateError::ConfigError(format!("No models registered for '{}'", config.id))
        })?;

        Ok(Route {
            provider: config,
            model,
            label: alias.label,
        })
    }

    /// Checks the request against the model's declared limits.
    pub fn validate(&self, request: &GenerateRequest) -> Result<()> {
        if request.width == 0 || request.height == 0 {
            return Err(GenerateError::InvalidRequest(format!(
                "width and height must be positive, got {}x{}",
                request.width, request.height
            )));
        }
        if let Some(steps) = request.steps {
            let range = self.model.features.steps;
            if !range.contains(steps) {
                return Err(GenerateError::InvalidRequest(format!(
                    "steps must be between {} and {} for {}, got {}",
                    range.min, range.max, self.model.id, steps
                )));
            }
        }
        Ok(())
    }

    /// The request as the driver should see it: canonical provider and model.
    pub fn canonicalize(&self, mut request: GenerateRequest) -> GenerateRequest {
        request.provider = self.provider.id.to_string();
        request.model = Some(self.model.id.to_string());
        request
    }
}

/// In-process dispatcher over the provider drivers.
#[derive(Clone)]
pub struct ImageGenerator {
    gitee: GiteeProvider,
    huggingface: HuggingFaceProvider,
    upscaler: Option<UpscaleClient>,
}

impl ImageGenerator {
    pub fn new(config: Config) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| GenerateError::ConfigError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            gitee: GiteeProvider::new(client.clone(), config.gitee_base_url),
            huggingface: HuggingFaceProvider::new(client.clone(), config.spaces),
            upscaler: config
                .upscale_url
                .map(|url| UpscaleClient::new(client.clone(), url)),
        })
    }

    pub fn gitee(&self) -> &GiteeProvider {
        &self.gitee
    }

    pub fn huggingface(&self) -> &HuggingFaceProvider {
        &self.huggingface
    }

    pub fn driver(&self, kind: DriverKind) -> &dyn ImageProvider {
        match kind {
            DriverKind::Rest => &self.gitee,
            DriverKind::QueuePoll => &self.huggingface,
        }
    }

    /// Resolves, validates and runs `request`, keeping the error taxonomy.
    pub async fn generate(
        &self,
        request: GenerateRequest,
        tokens: &AuthTokens,
    ) -> Result<GenerateSuccess> {
        let route = Route::resolve(&request.provider, request.model.as_deref())?;
        route.validate(&request)?;
        let request = route.canonicalize(request);

        let request_id = Uuid::new_v4();
        let driver = self.driver(route.provider.driver);
        log::info!(
            "[req:{}] {} -> {} / {}",
            request_id,
            route.label,
            driver.name(),
            route.model.id
        );

        let timer = logger::timer(&format!("generate {}", request_id));
        let result = driver
            .generate(&request, tokens.credential_for(route.provider))
            .await;
        timer.stop();

        if let Err(e) = &result {
            log::error!("[req:{}] {} failed: {}", request_id, driver.name(), e);
        }
        result
    }

    /// Like [`generate`](Self::generate), with every failure collapsed into
    /// the error string of the unified response.
    pub async fn dispatch(
        &self,
        request: GenerateRequest,
        tokens: &AuthTokens,
    ) -> ApiResponse<GenerateSuccess> {
        self.generate(request, tokens).await.into()
    }
}

#[async_trait]
impl ImageService for ImageGenerator {
    async fn generate(
        &self,
        request: GenerateRequest,
        tokens: &AuthTokens,
    ) -> ApiResponse<GenerateSuccess> {
        self.dispatch(request, tokens).await
    }

    async fn upscale(
        &self,
        url: &str,
        scale: u32,
        hf_token: Option<&str>,
    ) -> ApiResponse<UpscaleSuccess> {
        match &self.upscaler {
            Some(upscaler) => upscaler.upscale(url, scale, hf_token).await,
            None => ApiResponse::Failure("No upscale service configured".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hf_qwen_resolves_to_huggingface_qwen() {
        let route = Route::resolve("hf-qwen", None).unwrap();
        assert_eq!(route.provider.id, "huggingface");
        assert_eq!(route.model.id, "qwen");
        assert_eq!(route.label, "HF Qwen");
    }

    #[test]
    fn alias_pinned_model_beats_requested_model() {
        let route = Route::resolve("hf-qwen", Some("z-image-turbo")).unwrap();
        assert_eq!(route.model.id, "qwen");
    }

    #[test]
    fn legacy_turbo_name_maps_onto_the_hf_model() {
        let route = Route::resolve("hf-zimage", Some("z-image-turbo")).unwrap();
        assert_eq!(route.model.id, "z-image");
        let route = Route::resolve("huggingface", Some("z-image-turbo")).unwrap();
        assert_eq!(route.model.id, "z-image");
    }

    #[test]
    fn providers_fall_back_to_their_default_model() {
        assert_eq!(Route::resolve("gitee", None).unwrap().model.id, "z-image-turbo");
        assert_eq!(Route::resolve("huggingface", Some("")).unwrap().model.id, "z-image");
    }

    #[test]
    fn unknown_provider_and_model_are_rejected() {
        assert!(matches!(
            Route::resolve("openai", None),
            Err(GenerateError::UnknownProvider(_))
        ));
        assert!(matches!(
            Route::resolve("gitee", Some("qwen")),
            Err(GenerateError::InvalidRequest(_))
        ));
    }

    #[test]
    fn validation_enforces_positive_size_and_step_range() {
        let route = Route::resolve("huggingface", None).unwrap();
        let ok = GenerateRequest::new("huggingface", "x").with_steps(20);
        assert!(route.validate(&ok).is_ok());

        let too_many = GenerateRequest::new("huggingface", "x").with_steps(21);
        assert!(matches!(
            route.validate(&too_many),
            Err(GenerateError::InvalidRequest(_))
        ));

        let flat = GenerateRequest::new("huggingface", "x").with_size(1024, 0);
        assert!(route.validate(&flat).is_err());
    }

    #[test]
    fn canonicalize_rewrites_provider_and_model() {
        let route = Route::resolve("hf-qwen", None).unwrap();
        let request = route.canonicalize(GenerateRequest::new("hf-qwen", "x"));
        assert_eq!(request.provider, "huggingface");
        assert_eq!(request.model.as_deref(), Some("qwen"));
    }

    #[test]
    fn drivers_are_picked_by_kind() {
        let generator = ImageGenerator::new(Config::new()).unwrap();
        assert_eq!(generator.driver(DriverKind::Rest).id(), "gitee");
        assert_eq!(generator.driver(DriverKind::QueuePoll).id(), "huggingface");
    }

    #[tokio::test]
    async fn dispatch_collapses_failures_into_strings() {
        let generator = ImageGenerator::new(Config::new()).unwrap();
        let response = generator
            .dispatch(GenerateRequest::new("midjourney", "x"), &AuthTokens::new())
            .await;
        assert_eq!(response.error(), Some("Unknown provider: midjourney"));

        let response = generator
            .dispatch(GenerateRequest::new("gitee", "x"), &AuthTokens::new())
            .await;
        assert_eq!(response.error(), Some("API Key is required for Gitee AI"));
    }

    #[tokio::test]
    async fn upscale_without_service_fails_softly() {
        let generator = ImageGenerator::new(Config::new()).unwrap();
        let response = ImageService::upscale(&generator, "http://img/1.png", 4, None).await;
        assert_eq!(response.error(), Some("No upscale service configured"));
    }
}
