use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("API Key is required for {0}")]
    AuthRequired(String),

    #[error("Queue request failed: {0}")]
    QueueRequestFailed(u16),

    #[error("No event_id returned")]
    NoEventId,

    #[error("Quota exhausted, please set HF Token")]
    QuotaExhausted,

    #[error("No complete event in response: {0}")]
    NoCompleteEvent(String),

    #[error("No image returned from {0}")]
    NoImageReturned(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{provider} returned {status}: {message}")]
    ProviderError {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Request error: {0}")]
    RequestError(String),

    #[error("Response error: {0}")]
    ResponseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<reqwest::Error> for GenerateError {
    fn from(e: reqwest::Error) -> Self {
        GenerateError::RequestError(e.to_string())
    }
}

impl From<serde_json::Error> for GenerateError {
    fn from(e: serde_json::Error) -> Self {
        GenerateError::SerializationError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GenerateError>;
