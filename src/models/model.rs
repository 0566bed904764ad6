use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepRange {
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

impl StepRange {
    pub fn contains(&self, steps: u32) -> bool {
        (self.min..=self.max).contains(&steps)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelFeatures {
    pub negative_prompt: bool,
    pub steps: StepRange,
    pub seed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelConfig {
    pub id: &'static str,
    pub name: &'static str,
    pub provider: &'static str,
    pub features: ModelFeatures,
}

pub static MODEL_CONFIGS: &[ModelConfig] = &[
    ModelConfig {
        id: "z-image-turbo",
        name: "Z-Image Turbo",
        provider: "gitee",
        features: ModelFeatures {
            negative_prompt: true,
            steps: StepRange {
                min: 1,
                max: 50,
                default: 9,
            },
            seed: true,
        },
    },
    ModelConfig {
        id: "z-image",
        name: "Z-Image Turbo",
        provider: "huggingface",
        features: ModelFeatures {
            negative_prompt: false,
            steps: StepRange {
                min: 1,
                max: 20,
                default: 8,
            },
            seed: true,
        },
    },
    ModelConfig {
        id: "qwen",
        name: "Qwen Image",
        provider: "huggingface",
        features: ModelFeatures {
            negative_prompt: false,
            steps: StepRange {
                min: 1,
                max: 20,
                default: 8,
            },
            seed: true,
        },
    },
];

/// (provider, requested id, canonical id) for model names one provider
/// knows under another provider's spelling.
pub static MODEL_ALIASES: &[(&str, &str, &str)] = &[
    ("huggingface", "z-image-turbo", "z-image"),
    ("gitee", "z-image", "z-image-turbo"),
];

pub fn models_by_provider(provider: &str) -> Vec<&'static ModelConfig> {
    MODEL_CONFIGS
        .iter()
        .filter(|m| m.provider == provider)
        .collect()
}

pub fn model_config(model_id: &str) -> Option<&'static ModelConfig> {
    MODEL_CONFIGS.iter().find(|m| m.id == model_id)
}

pub fn model_by_provider_and_id(provider: &str, model_id: &str) -> Option<&'static ModelConfig> {
    MODEL_CONFIGS
        .iter()
        .find(|m| m.provider == provider && m.id == model_id)
}

/// Maps a model name to the provider's canonical id, following the alias
/// table. Returns `None` when the provider has no such model.
pub fn canonical_model(provider: &str, model_id: &str) -> Option<&'static ModelConfig> {
    let canonical = MODEL_ALIASES
        .iter()
        .find(|(p, requested, _)| *p == provider && *requested == model_id)
        .map(|(_, _, canonical)| *canonical)
        .unwrap_or(model_id);
    model_by_provider_and_id(provider, canonical)
}
