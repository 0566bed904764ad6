use serde::Serialize;

/// HuggingFace Spaces known to the queue driver.
pub mod hf_spaces {
    pub const Z_IMAGE: &str = "https://luca115-z-image-turbo.hf.space";
    pub const QWEN: &str = "https://mcp-tools-qwen-image-fast.hf.space";
}

pub const GITEE_BASE_URL: &str = "https://ai.gitee.com/v1";

/// Protocol family a provider speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    /// One OpenAI-compatible request/response round trip.
    Rest,
    /// Gradio queue submission followed by an event stream.
    QueuePoll,
}

/// Which of the two user credentials a provider consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    ApiKey,
    HfToken,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub id: &'static str,
    pub name: &'static str,
    pub requires_auth: bool,
    pub auth_header: &'static str,
    pub base_url: &'static str,
    #[serde(skip)]
    pub credential: CredentialKind,
    pub default_model: &'static str,
    #[serde(skip)]
    pub driver: DriverKind,
}

pub static PROVIDER_CONFIGS: &[ProviderConfig] = &[
    ProviderConfig {
        id: "gitee",
        name: "Gitee AI",
        requires_auth: true,
        auth_header: "X-API-Key",
        base_url: GITEE_BASE_URL,
        credential: CredentialKind::ApiKey,
        default_model: "z-image-turbo",
        driver: DriverKind::Rest,
    },
    ProviderConfig {
        id: "huggingface",
        name: "HuggingFace",
        requires_auth: false,
        auth_header: "X-HF-Token",
        base_url: hf_spaces::Z_IMAGE,
        credential: CredentialKind::HfToken,
        default_model: "z-image",
        driver: DriverKind::QueuePoll,
    },
];

/// An identifier accepted at the boundary, possibly a legacy one.
#[derive(Debug, Clone)]
pub struct ProviderAlias {
    pub alias: &'static str,
    pub provider: &'static str,
    /// Model the alias pins, overriding whatever the caller asked for.
    pub model: Option<&'static str>,
    pub label: &'static str,
}

pub static PROVIDER_ALIASES: &[ProviderAlias] = &[
    ProviderAlias {
        alias: "gitee",
        provider: "gitee",
        model: None,
        label: "Gitee AI",
    },
    ProviderAlias {
        alias: "huggingface",
        provider: "huggingface",
        model: None,
        label: "HuggingFace",
    },
    ProviderAlias {
        alias: "hf-zimage",
        provider: "huggingface",
        model: Some("z-image"),
        label: "HF Z-Image",
    },
    ProviderAlias {
        alias: "hf-qwen",
        provider: "huggingface",
        model: Some("qwen"),
        label: "HF Qwen",
    },
];

pub fn provider_config(provider_id: &str) -> Option<&'static ProviderConfig> {
    PROVIDER_CONFIGS.iter().find(|p| p.id == provider_id)
}

pub fn provider_alias(alias: &str) -> Option<&'static ProviderAlias> {
    PROVIDER_ALIASES.iter().find(|a| a.alias == alias)
}
