pub mod api_client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod providers;
#[cfg(feature = "server")]
pub mod server;
pub mod settings;

pub use api_client::{ApiClient, UpscaleClient};
pub use config::Config;
pub use dispatch::{ImageGenerator, ImageService, Route};
pub use error::{GenerateError, Result};
pub use models::*;
pub use orchestrator::{Orchestrator, StatusLog};
pub use providers::{GiteeProvider, HuggingFaceProvider, ImageProvider};
pub use settings::Settings;
