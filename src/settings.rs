use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GenerateError, Result};
use crate::models::GenerateRequest;

/// Generation preferences remembered between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Provider id or alias (`gitee`, `huggingface`, `hf-zimage`, `hf-qwen`).
    pub api_provider: String,
    pub prompt: String,
    pub negative_prompt: String,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub auto_upscale: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_provider: "gitee".to_string(),
            prompt: String::new(),
            negative_prompt: String::new(),
            width: 1024,
            height: 1024,
            steps: 9,
            auto_upscale: false,
        }
    }
}

impl Settings {
    /// Reads settings from `path`; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path).map_err(|e| {
            GenerateError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            GenerateError::ConfigError(format!("Invalid settings in {}: {}", path.display(), e))
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).map_err(|e| {
            GenerateError::ConfigError(format!("Cannot write {}: {}", path.display(), e))
        })?;
        log::debug!("Settings saved to {}", path.display());
        Ok(())
    }

    pub fn to_request(&self) -> GenerateRequest {
        let mut request = GenerateRequest::new(self.api_provider.clone(), self.prompt.clone())
            .with_size(self.width, self.height)
            .with_steps(self.steps);
        if !self.negative_prompt.trim().is_empty() {
            request = request.with_negative_prompt(self.negative_prompt.clone());
        }
        request
    }
}
