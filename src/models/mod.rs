pub mod common;
pub mod gradio;
pub mod image;
pub mod model;
pub mod openai;
pub mod provider;

pub use common::*;
pub use image::*;
pub use model::{ModelConfig, ModelFeatures, StepRange};
pub use provider::{CredentialKind, DriverKind, ProviderAlias, ProviderConfig};
