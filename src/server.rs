use actix_web::{
    get, http::StatusCode, post, web, App, HttpRequest, HttpResponse, HttpServer, ResponseError,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    config::Config,
    dispatch::ImageGenerator,
    error::{GenerateError, Result},
    models::{
        model::{models_by_provider, MODEL_CONFIGS},
        provider::{provider_alias, PROVIDER_CONFIGS},
        AuthTokens, GenerateRequest,
    },
};

const DEFAULT_PORT: u16 = 8787;

impl ResponseError for GenerateError {
    fn status_code(&self) -> StatusCode {
        match self {
            GenerateError::AuthRequired(_) => StatusCode::UNAUTHORIZED,
            GenerateError::InvalidRequest(_) | GenerateError::UnknownProvider(_) => {
                StatusCode::BAD_REQUEST
            }
            GenerateError::QuotaExhausted => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

/// Credentials arrive in each provider's own header.
fn tokens_from_headers(req: &HttpRequest) -> AuthTokens {
    let mut tokens = AuthTokens::new();
    for provider in PROVIDER_CONFIGS {
        if let Some(value) = req
            .headers()
            .get(provider.auth_header)
            .and_then(|v| v.to_str().ok())
        {
            tokens.set(provider.credential, value);
        }
    }
    tokens
}

#[post("/api/generate")]
async fn generate(
    generator: web::Data<ImageGenerator>,
    req: HttpRequest,
    body: web::Json<GenerateRequest>,
) -> std::result::Result<HttpResponse, GenerateError> {
    let tokens = tokens_from_headers(&req);
    let success = generator.generate(body.into_inner(), &tokens).await?;
    Ok(HttpResponse::Ok().json(success))
}

#[get("/api/providers")]
async fn providers() -> HttpResponse {
    HttpResponse::Ok().json(PROVIDER_CONFIGS)
}

#[derive(Debug, Deserialize)]
struct ModelsQuery {
    provider: Option<String>,
}

#[get("/api/models")]
async fn models(
    query: web::Query<ModelsQuery>,
) -> std::result::Result<HttpResponse, GenerateError> {
    match query.provider.as_deref() {
        Some(provider) => {
            let alias = provider_alias(provider)
                .ok_or_else(|| GenerateError::UnknownProvider(provider.to_string()))?;
            Ok(HttpResponse::Ok().json(models_by_provider(alias.provider)))
        }
        None => Ok(HttpResponse::Ok().json(MODEL_CONFIGS)),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    let json = web::JsonConfig::default().error_handler(|err, _req| {
        log::warn!("Rejected request body: {}", err);
        GenerateError::InvalidRequest(err.to_string()).into()
    });
    cfg.app_data(json)
        .service(generate)
        .service(providers)
        .service(models);
}

pub async fn run(config: Config) -> Result<()> {
    let port = config.port.unwrap_or(DEFAULT_PORT);
    let generator = web::Data::new(ImageGenerator::new(config)?);

    log::info!("🚀 Listening on 0.0.0.0:{}", port);
    HttpServer::new(move || App::new().app_data(generator.clone()).configure(configure))
        .bind(("0.0.0.0", port))
        .map_err(|e| GenerateError::ConfigError(format!("Cannot bind port {}: {}", port, e)))?
        .run()
        .await
        .map_err(|e| GenerateError::ConfigError(format!("Server stopped: {}", e)))
}
