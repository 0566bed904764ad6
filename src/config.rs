use std::env;
use std::time::Duration;

use crate::models::provider::{hf_spaces, GITEE_BASE_URL};
use crate::providers::SpaceUrls;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: Option<u16>,
    pub gitee_base_url: String,
    pub spaces: SpaceUrls,
    /// Service answering `POST /api/upscale`.
    pub upscale_url: Option<String>,
    /// Deadline for a whole provider call, event stream included.
    pub request_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: None,
            gitee_base_url: GITEE_BASE_URL.to_string(),
            spaces: SpaceUrls {
                z_image: hf_spaces::Z_IMAGE.to_string(),
                qwen: hf_spaces::QWEN.to_string(),
            },
            upscale_url: None,
            request_timeout: Some(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Config::default();

        let port = env::var("PORT").ok().and_then(|port| port.parse().ok());
        let gitee_base_url = env::var("GITEE_BASE_URL").unwrap_or(defaults.gitee_base_url);
        let z_image = env::var("HF_ZIMAGE_SPACE_URL").unwrap_or(defaults.spaces.z_image);
        let qwen = env::var("HF_QWEN_SPACE_URL").unwrap_or(defaults.spaces.qwen);
        let upscale_url = env::var("UPSCALE_API_URL").ok().filter(|u| !u.is_empty());
        let request_timeout = match env::var("REQUEST_TIMEOUT_SECS") {
            // 0 disables the deadline.
            Ok(secs) => match secs.parse::<u64>() {
                Ok(0) => None,
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(_) => defaults.request_timeout,
            },
            Err(_) => defaults.request_timeout,
        };

        Config {
            port,
            gitee_base_url,
            spaces: SpaceUrls { z_image, qwen },
            upscale_url,
            request_timeout,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_gitee_base_url(mut self, url: impl Into<String>) -> Self {
        self.gitee_base_url = trim_slash(url.into());
        self
    }

    pub fn with_spaces(mut self, z_image: impl Into<String>, qwen: impl Into<String>) -> Self {
        self.spaces = SpaceUrls {
            z_image: trim_slash(z_image.into()),
            qwen: trim_slash(qwen.into()),
        };
        self
    }

    pub fn with_upscale_url(mut self, url: impl Into<String>) -> Self {
        self.upscale_url = Some(trim_slash(url.into()));
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn without_request_timeout(mut self) -> Self {
        self.request_timeout = None;
        self
    }
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
