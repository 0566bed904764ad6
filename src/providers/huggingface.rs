use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde_json::{json, Value};

use crate::{
    error::{GenerateError, Result},
    models::{GenerateRequest, GenerateSuccess},
    providers::{gradio::GradioClient, ImageProvider},
};

const ENDPOINT: &str = "generate_image";
/// Step count the spaces are driven with, whatever the model declares.
const QUEUE_STEPS: u32 = 8;
const SEED_UPPER_BOUND: u64 = 2_147_483_647;

#[derive(Debug, Clone)]
pub struct SpaceUrls {
    pub z_image: String,
    pub qwen: String,
}

/// HuggingFace Spaces driven through the Gradio queue.
#[derive(Clone)]
pub struct HuggingFaceProvider {
    gradio: GradioClient,
    spaces: SpaceUrls,
}

impl HuggingFaceProvider {
    pub fn new(client: Client, spaces: SpaceUrls) -> Self {
        Self {
            gradio: GradioClient::new(client),
            spaces,
        }
    }

    /// Space serving `model`; anything but `qwen` goes to Z-Image.
    pub fn space_for(&self, model: Option<&str>) -> &str {
        match model {
            Some("qwen") => &self.spaces.qwen,
            _ => &self.spaces.z_image,
        }
    }

    fn submission(request: &GenerateRequest, seed: u64) -> Vec<Value> {
        vec![
            json!(request.prompt),
            json!(request.height),
            json!(request.width),
            json!(QUEUE_STEPS),
            json!(seed),
            json!(false),
        ]
    }
}

pub fn random_seed() -> u64 {
    rand::thread_rng().gen_range(0..SEED_UPPER_BOUND)
}

#[async_trait]
impl ImageProvider for HuggingFaceProvider {
    fn id(&self) -> &'static str {
        "huggingface"
    }

    fn name(&self) -> &'static str {
        "HuggingFace"
    }

    async fn generate(
        &self,
        request: &GenerateRequest,
        auth_token: Option<&str>,
    ) -> Result<GenerateSuccess> {
        let seed = request.seed.unwrap_or_else(random_seed);
        let base_url = self.space_for(request.model.as_deref());
        log::info!(
            "Queueing image on {} (model: {}, seed: {})",
            base_url,
            request.model.as_deref().unwrap_or("z-image"),
            seed
        );

        let data = Self::submission(request, seed);
        let output = self.gradio.call(base_url, ENDPOINT, &data, auth_token).await?;

        let url = output
            .first()
            .and_then(|image| image.get("url"))
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| GenerateError::NoImageReturned(self.name().to_string()))?;
        let used_seed = output.get(1).and_then(Value::as_u64).unwrap_or(seed);

        Ok(GenerateSuccess {
            url: Some(url.to_string()),
            b64_json: None,
            seed: Some(used_seed),
        })
    }
}
