use serde::de::{self, Deserializer};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::GenerateError;
use crate::models::provider::{CredentialKind, ProviderConfig};

/// The one result shape every caller sees:
/// `{"success":true,"data":...}` or `{"success":false,"error":"..."}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    Success(T),
    Failure(String),
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ApiResponse::Success(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ApiResponse::Success(data) => Some(data),
            ApiResponse::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ApiResponse::Success(_) => None,
            ApiResponse::Failure(error) => Some(error),
        }
    }

    pub fn into_result(self) -> std::result::Result<T, String> {
        match self {
            ApiResponse::Success(data) => Ok(data),
            ApiResponse::Failure(error) => Err(error),
        }
    }
}

impl<T> From<crate::error::Result<T>> for ApiResponse<T> {
    fn from(result: crate::error::Result<T>) -> Self {
        match result {
            Ok(data) => ApiResponse::Success(data),
            Err(e) => ApiResponse::Failure(e.to_string()),
        }
    }
}

impl<T> From<GenerateError> for ApiResponse<T> {
    fn from(e: GenerateError) -> Self {
        ApiResponse::Failure(e.to_string())
    }
}

impl<T: Serialize> Serialize for ApiResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ApiResponse", 2)?;
        match self {
            ApiResponse::Success(data) => {
                state.serialize_field("success", &true)?;
                state.serialize_field("data", data)?;
            }
            ApiResponse::Failure(error) => {
                state.serialize_field("success", &false)?;
                state.serialize_field("error", error)?;
            }
        }
        state.end()
    }
}

#[derive(Deserialize)]
struct WireResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ApiResponse<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let wire = WireResponse::<T>::deserialize(deserializer)?;
        match (wire.success, wire.data) {
            (true, Some(data)) => Ok(ApiResponse::Success(data)),
            (true, None) => Err(de::Error::missing_field("data")),
            (false, _) => Ok(ApiResponse::Failure(wire.error.unwrap_or_default())),
        }
    }
}

/// Credentials the user holds, one per provider family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hf_token: Option<String>,
}

impl AuthTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_hf_token(mut self, hf_token: impl Into<String>) -> Self {
        self.hf_token = Some(hf_token.into());
        self
    }

    /// The credential the provider consumes, trimmed; blank counts as absent.
    pub fn credential_for(&self, provider: &ProviderConfig) -> Option<&str> {
        let value = match provider.credential {
            CredentialKind::ApiKey => self.api_key.as_deref(),
            CredentialKind::HfToken => self.hf_token.as_deref(),
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }

    /// Header to send to a server fronting `provider`, if the matching
    /// credential is present.
    pub fn auth_header(&self, provider: &ProviderConfig) -> Option<(&'static str, &str)> {
        self.credential_for(provider)
            .map(|credential| (provider.auth_header, credential))
    }

    /// Copy holding only the credential `provider` consumes.
    pub fn scoped_to(&self, provider: &ProviderConfig) -> AuthTokens {
        let credential = self.credential_for(provider).map(str::to_string);
        match provider.credential {
            CredentialKind::ApiKey => AuthTokens {
                api_key: credential,
                hf_token: None,
            },
            CredentialKind::HfToken => AuthTokens {
                api_key: None,
                hf_token: credential,
            },
        }
    }

    pub fn set(&mut self, kind: CredentialKind, value: impl Into<String>) {
        match kind {
            CredentialKind::ApiKey => self.api_key = Some(value.into()),
            CredentialKind::HfToken => self.hf_token = Some(value.into()),
        }
    }
}
