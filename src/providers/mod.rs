pub mod gitee;
pub mod gradio;
pub mod huggingface;
pub mod sse;

use crate::{
    error::Result,
    models::{GenerateRequest, GenerateSuccess},
};
use async_trait::async_trait;

pub use gitee::GiteeProvider;
pub use gradio::GradioClient;
pub use huggingface::{HuggingFaceProvider, SpaceUrls};

/// One backend protocol behind the single `generate` call.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    /// `auth_token` is the credential for this provider only, untrimmed.
    async fn generate(
        &self,
        request: &GenerateRequest,
        auth_token: Option<&str>,
    ) -> Result<GenerateSuccess>;
}
