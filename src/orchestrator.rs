use crate::{
    dispatch::{ImageService, Route},
    models::{ApiResponse, AuthTokens},
    settings::Settings,
};

const UPSCALE_FACTOR: u32 = 4;

/// Progress lines of the current operation, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusLog {
    lines: Vec<String>,
}

impl StatusLog {
    pub fn reset(&mut self, line: impl Into<String>) {
        self.lines.clear();
        self.push(line);
    }

    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        log::info!("{}", line);
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }
}

/// Drives one user session: generation, optional upscaling and the status
/// lines describing both.
pub struct Orchestrator<S> {
    service: S,
    settings: Settings,
    tokens: AuthTokens,
    status: StatusLog,
    image: Option<String>,
    seed: Option<u64>,
    upscaled: bool,
}

impl<S: ImageService> Orchestrator<S> {
    pub fn new(service: S, settings: Settings, tokens: AuthTokens) -> Self {
        Self {
            service,
            settings,
            tokens,
            status: StatusLog::default(),
            image: None,
            seed: None,
            upscaled: false,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn status(&self) -> &StatusLog {
        &self.status
    }

    /// URL or data URL of the image on display.
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn is_upscaled(&self) -> bool {
        self.upscaled
    }

    pub fn clear(&mut self) {
        self.image = None;
        self.seed = None;
        self.upscaled = false;
    }

    /// Generates from the current settings. On success the new image source
    /// is returned and kept; on failure the previous image is gone.
    pub async fn generate(&mut self) -> ApiResponse<String> {
        let request = self.settings.to_request();
        let route = match Route::resolve(&request.provider, None) {
            Ok(route) => route,
            Err(e) => {
                self.status.reset(format!("Error: {}", e));
                return e.into();
            }
        };

        if route.provider.requires_auth && self.tokens.credential_for(route.provider).is_none() {
            let message = "Please configure your API Key first";
            log::warn!("{} ({})", message, route.label);
            return ApiResponse::Failure(message.to_string());
        }

        self.clear();
        self.status.reset("Initializing...");
        self.status.push(format!("Sending request to {}...", route.label));

        let tokens = self.tokens.scoped_to(route.provider);
        let generated = match self.service.generate(request, &tokens).await {
            ApiResponse::Success(data) => data,
            ApiResponse::Failure(error) => return self.fail(error),
        };

        let Some(mut source) = generated.image_source() else {
            return self.fail("No image returned".to_string());
        };
        self.status.push("Image generated!");

        if self.settings.auto_upscale && source.starts_with("http") {
            self.status.push("Upscaling to 8K...");
            match self.upscale_source(&source).await {
                Ok(url) => {
                    source = url;
                    self.upscaled = true;
                    self.status.push("8K upscale complete!");
                }
                Err(error) => {
                    let error = error.unwrap_or_else(|| "No URL".to_string());
                    self.status.push(format!("8K upscale failed: {}", error));
                }
            }
        }

        self.seed = generated.seed;
        self.image = Some(source.clone());
        ApiResponse::Success(source)
    }

    /// 4x upscale of the image on display.
    pub async fn upscale(&mut self) -> ApiResponse<String> {
        let Some(source) = self.image.clone() else {
            return ApiResponse::Failure("No image to upscale".to_string());
        };
        if self.upscaled {
            return ApiResponse::Failure("Image is already upscaled".to_string());
        }

        self.status.push("Upscaling to 4x...");
        match self.upscale_source(&source).await {
            Ok(url) => {
                self.image = Some(url.clone());
                self.upscaled = true;
                self.status.push("4x upscale complete!");
                ApiResponse::Success(url)
            }
            Err(error) => {
                let error = error.unwrap_or_else(|| "No URL returned".to_string());
                self.status.push(format!("Upscale failed: {}", error));
                ApiResponse::Failure(error)
            }
        }
    }

    /// `Err(None)` when the service succeeded without a URL.
    async fn upscale_source(&self, source: &str) -> Result<String, Option<String>> {
        let hf_token = self.tokens.hf_token.as_deref();
        match self.service.upscale(source, UPSCALE_FACTOR, hf_token).await {
            ApiResponse::Success(data) => data.url.filter(|url| !url.is_empty()).ok_or(None),
            ApiResponse::Failure(error) => Err(Some(error)),
        }
    }

    fn fail(&mut self, error: String) -> ApiResponse<String> {
        self.status.push(format!("Error: {}", error));
        ApiResponse::Failure(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GenerateRequest, GenerateSuccess, UpscaleSuccess};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeService {
        generated: ApiResponse<GenerateSuccess>,
        upscaled: ApiResponse<UpscaleSuccess>,
        requests: Mutex<Vec<(GenerateRequest, AuthTokens)>>,
        upscales: Mutex<Vec<(String, u32)>>,
    }

    impl FakeService {
        fn new(generated: ApiResponse<GenerateSuccess>) -> Self {
            Self {
                generated,
                upscaled: ApiResponse::Failure("upscaler offline".into()),
                requests: Mutex::new(Vec::new()),
                upscales: Mutex::new(Vec::new()),
            }
        }

        fn with_upscale(mut self, upscaled: ApiResponse<UpscaleSuccess>) -> Self {
            self.upscaled = upscaled;
            self
        }
    }

    #[async_trait]
    impl ImageService for FakeService {
        async fn generate(
            &self,
            request: GenerateRequest,
            tokens: &AuthTokens,
        ) -> ApiResponse<GenerateSuccess> {
            self.requests.lock().unwrap().push((request, tokens.clone()));
            self.generated.clone()
        }

        async fn upscale(
            &self,
            url: &str,
            scale: u32,
            _hf_token: Option<&str>,
        ) -> ApiResponse<UpscaleSuccess> {
            self.upscales.lock().unwrap().push((url.to_string(), scale));
            self.upscaled.clone()
        }
    }

    fn url(url: &str) -> ApiResponse<GenerateSuccess> {
        ApiResponse::Success(GenerateSuccess {
            url: Some(url.into()),
            seed: Some(42),
            ..Default::default()
        })
    }

    fn settings(provider: &str) -> Settings {
        Settings {
            api_provider: provider.into(),
            prompt: "a red fox".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn gitee_without_key_makes_no_request() {
        let service = FakeService::new(url("http://img/1.png"));
        let mut session = Orchestrator::new(service, settings("gitee"), AuthTokens::new());
        let response = session.generate().await;
        assert_eq!(response.error(), Some("Please configure your API Key first"));
        assert!(session.service().requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn success_records_status_and_image() {
        let tokens = AuthTokens::new().with_api_key("sk-1").with_hf_token("hf_1");
        let mut session =
            Orchestrator::new(FakeService::new(url("http://img/1.png")), settings("gitee"), tokens);
        let response = session.generate().await;

        assert_eq!(response.data().map(String::as_str), Some("http://img/1.png"));
        assert_eq!(
            session.status().lines(),
            ["Initializing...", "Sending request to Gitee AI...", "Image generated!"]
        );
        assert_eq!(session.image(), Some("http://img/1.png"));
        assert_eq!(session.seed(), Some(42));

        let requests = session.service().requests.lock().unwrap();
        assert_eq!(requests[0].1.api_key.as_deref(), Some("sk-1"));
        assert_eq!(requests[0].1.hf_token, None);
    }

    #[tokio::test]
    async fn huggingface_gets_only_the_hf_token() {
        let tokens = AuthTokens::new().with_api_key("sk-1").with_hf_token("hf_1");
        let service = FakeService::new(url("http://img/q.png"));
        let mut session = Orchestrator::new(service, settings("hf-qwen"), tokens);
        session.generate().await;

        assert_eq!(session.status().lines()[1], "Sending request to HF Qwen...");
        let requests = session.service().requests.lock().unwrap();
        assert_eq!(requests[0].1.api_key, None);
        assert_eq!(requests[0].1.hf_token.as_deref(), Some("hf_1"));
    }

    #[tokio::test]
    async fn failures_are_reported_in_the_log() {
        let quota = ApiResponse::Failure("Quota exhausted, please set HF Token".into());
        let service = FakeService::new(quota);
        let mut session = Orchestrator::new(service, settings("huggingface"), AuthTokens::new());
        let response = session.generate().await;
        assert!(!response.is_success());
        assert_eq!(
            session.status().last(),
            Some("Error: Quota exhausted, please set HF Token")
        );
        assert_eq!(session.image(), None);

        let empty = FakeService::new(ApiResponse::Success(GenerateSuccess::default()));
        let mut session = Orchestrator::new(empty, settings("huggingface"), AuthTokens::new());
        assert_eq!(session.generate().await.error(), Some("No image returned"));
        assert_eq!(session.status().last(), Some("Error: No image returned"));
    }

    #[tokio::test]
    async fn base64_images_become_data_urls_and_skip_auto_upscale() {
        let service = FakeService::new(ApiResponse::Success(GenerateSuccess {
            b64_json: Some("QUJD".into()),
            ..Default::default()
        }));
        let mut config = settings("gitee");
        config.auto_upscale = true;
        let mut session = Orchestrator::new(service, config, AuthTokens::new().with_api_key("sk"));

        session.generate().await;
        assert_eq!(session.image(), Some("data:image/png;base64,QUJD"));
        assert!(session.service().upscales.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn auto_upscale_replaces_the_image_or_keeps_the_original() {
        let service = FakeService::new(url("http://img/1.png")).with_upscale(ApiResponse::Success(
            UpscaleSuccess {
                url: Some("http://img/1-4x.png".into()),
            },
        ));
        let mut config = settings("huggingface");
        config.auto_upscale = true;
        let mut session = Orchestrator::new(service, config.clone(), AuthTokens::new());
        session.generate().await;
        assert_eq!(session.image(), Some("http://img/1-4x.png"));
        assert_eq!(session.status().last(), Some("8K upscale complete!"));
        assert_eq!(
            session.service().upscales.lock().unwrap()[0],
            ("http://img/1.png".to_string(), 4)
        );

        let service = FakeService::new(url("http://img/1.png"))
            .with_upscale(ApiResponse::Success(UpscaleSuccess { url: None }));
        let mut session = Orchestrator::new(service, config, AuthTokens::new());
        session.generate().await;
        assert_eq!(session.image(), Some("http://img/1.png"));
        assert_eq!(session.status().last(), Some("8K upscale failed: No URL"));
    }

    #[tokio::test]
    async fn manual_upscale_runs_once() {
        let service = FakeService::new(url("http://img/1.png")).with_upscale(ApiResponse::Success(
            UpscaleSuccess {
                url: Some("http://img/big.png".into()),
            },
        ));
        let mut session = Orchestrator::new(service, settings("huggingface"), AuthTokens::new());
        assert!(session.upscale().await.error().is_some());

        session.generate().await;
        let response = session.upscale().await;
        assert_eq!(response.data().map(String::as_str), Some("http://img/big.png"));
        assert_eq!(session.status().last(), Some("4x upscale complete!"));
        assert!(session.is_upscaled());

        assert_eq!(session.upscale().await.error(), Some("Image is already upscaled"));
        session.clear();
        assert_eq!(session.image(), None);
    }

    #[tokio::test]
    async fn manual_upscale_failure_keeps_the_image() {
        let service = FakeService::new(url("http://img/1.png"));
        let mut session = Orchestrator::new(service, settings("huggingface"), AuthTokens::new());
        session.generate().await;
        session.upscale().await;
        assert_eq!(session.status().last(), Some("Upscale failed: upscaler offline"));
        assert_eq!(session.image(), Some("http://img/1.png"));
        assert!(!session.is_upscaled());
    }
}
