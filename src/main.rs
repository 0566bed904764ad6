use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use clap::Parser;
use zimage::{
    logger::{self, LogLevel, LoggerConfig},
    models::{model::MODEL_CONFIGS, provider::PROVIDER_ALIASES},
    ApiClient, AuthTokens, Config, ImageGenerator, ImageService, Orchestrator, Settings,
};

const DATA_URL_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, Parser)]
#[command(
    name = "zimage",
    version,
    about = "Generate images through Gitee AI or HuggingFace spaces"
)]
struct Cli {
    /// Prompt; falls back to the saved one.
    #[arg(long)]
    prompt: Option<String>,
    /// gitee, huggingface, hf-zimage or hf-qwen.
    #[arg(long)]
    provider: Option<String>,
    #[arg(long)]
    negative_prompt: Option<String>,
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    #[arg(long)]
    steps: Option<u32>,
    /// Upscale automatically after generating.
    #[arg(long)]
    auto_upscale: Option<bool>,
    /// Run a 4x upscale once the image is ready.
    #[arg(long)]
    upscale: bool,
    #[arg(long, default_value = "zimage-settings.json")]
    settings: PathBuf,
    /// Directory for images that come back inline.
    #[arg(long, default_value = ".")]
    out: PathBuf,
    /// Send requests to a running zimage server instead of the providers.
    #[arg(long)]
    remote: Option<String>,
    #[arg(long)]
    list: bool,
    /// Serve the HTTP API (needs the `server` feature).
    #[arg(long)]
    serve: bool,
    #[arg(long, default_value = "info")]
    log_level: String,
    /// Log JSON lines, also appended to zimage.log unless --log-file is given.
    #[arg(long)]
    log_json: bool,
    #[arg(long)]
    log_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let env_loaded = dotenv::dotenv().is_ok();
    let level = LogLevel::parse(&cli.log_level).unwrap_or(LogLevel::Info);
    logger::init_with_config(LoggerConfig::from_flags(
        level,
        cli.log_json,
        cli.log_file.as_deref(),
    ))?;
    if env_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let config = Config::from_env();
    logger::log_config_info(&config);

    if cli.list {
        list_registry();
        return Ok(());
    }

    if cli.serve {
        #[cfg(feature = "server")]
        {
            zimage::server::run(config).await?;
            return Ok(());
        }
        #[cfg(not(feature = "server"))]
        {
            return Err("zimage was built without the `server` feature".into());
        }
    }

    let mut settings = Settings::load(&cli.settings)?;
    apply_overrides(&mut settings, &cli);
    if settings.prompt.trim().is_empty() {
        return Err("No prompt given; pass --prompt".into());
    }
    settings.save(&cli.settings)?;

    let mut tokens = AuthTokens::new();
    if let Ok(key) = env::var("GITEE_API_KEY") {
        tokens = tokens.with_api_key(key);
    }
    if let Ok(token) = env::var("HF_TOKEN") {
        tokens = tokens.with_hf_token(token);
    }

    match cli.remote.as_deref() {
        Some(url) => {
            log::info!("🌐 Using remote API at {}", url);
            run(ApiClient::new(url), settings, tokens, &cli).await
        }
        None => {
            let generator = ImageGenerator::new(config)?;
            run(generator, settings, tokens, &cli).await
        }
    }
}

fn apply_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(prompt) = &cli.prompt {
        settings.prompt = prompt.clone();
    }
    if let Some(provider) = &cli.provider {
        settings.api_provider = provider.clone();
    }
    if let Some(negative_prompt) = &cli.negative_prompt {
        settings.negative_prompt = negative_prompt.clone();
    }
    if let Some(width) = cli.width {
        settings.width = width;
    }
    if let Some(height) = cli.height {
        settings.height = height;
    }
    if let Some(steps) = cli.steps {
        settings.steps = steps;
    }
    if let Some(auto_upscale) = cli.auto_upscale {
        settings.auto_upscale = auto_upscale;
    }
}

async fn run<S: ImageService>(
    service: S,
    settings: Settings,
    tokens: AuthTokens,
    cli: &Cli,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Orchestrator::new(service, settings, tokens);

    let generated = session.generate().await;
    for line in session.status().lines() {
        println!("{}", line);
    }
    let mut source = generated.into_result()?;

    if cli.upscale {
        let upscaled = session.upscale().await;
        if let Some(line) = session.status().last() {
            println!("{}", line);
        }
        if let Ok(url) = upscaled.into_result() {
            source = url;
        }
    }

    if let Some(seed) = session.seed() {
        println!("seed: {}", seed);
    }

    match source.strip_prefix(DATA_URL_PREFIX) {
        Some(b64) => {
            let path = save_image(b64, &cli.out)?;
            println!("{}", path.display());
        }
        None => println!("{}", source),
    }
    Ok(())
}

fn save_image(b64: &str, dir: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let bytes = BASE64.decode(b64)?;
    let path = dir.join(format!("zimage_{}.png", chrono::Utc::now().timestamp()));
    fs::write(&path, bytes)?;
    log::info!("💾 Image saved to: {}", path.display());
    Ok(path)
}

fn list_registry() {
    println!("Providers:");
    for alias in PROVIDER_ALIASES {
        println!("  {:<12} {}", alias.alias, alias.label);
    }
    println!("Models:");
    for model in MODEL_CONFIGS {
        println!(
            "  {:<14} {:<14} steps {}-{} (default {})",
            model.id,
            model.provider,
            model.features.steps.min,
            model.features.steps.max,
            model.features.steps.default
        );
    }
}
