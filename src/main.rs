//! Application entry point — voice relay CLI.
//!
//! # Commands
//!
//! ```text
//! voice-relay speak <chat-id> <text…> [--voice ID] [--noise TAG]
//! voice-relay maintain
//! ```
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (default on first run) and apply
//!    environment secrets.
//! 3. Open the JSON noise catalog.
//! 4. Run the requested command (`speak` also opens the voice catalog).

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use voice_relay::{
    audio::{is_ffmpeg_available, FfmpegEngine, PipelineExecutor},
    config::{AppConfig, AppPaths},
    delivery::{ChatTarget, TelegramClient},
    llm::{ApiEnhancer, FallbackEnhancer},
    noise::{reconcile_catalog, JsonNoiseRepository, NoiseRepository, NoiseSelector},
    pipeline::{ConversionOrchestrator, UserProfile},
    tts::{HttpSynthesizer, JsonVoiceRepository, VoiceRepository},
};

const USAGE: &str = "usage:
  voice-relay speak <chat-id> <text...> [--voice ID] [--noise TAG]
  voice-relay maintain";

// ---------------------------------------------------------------------------
// Argument parsing
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
enum Command {
    Speak {
        chat_id: String,
        text: String,
        voice: Option<String>,
        noise: Option<String>,
    },
    Maintain,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Command> {
    let mut args = args.into_iter();
    match args.next().as_deref() {
        Some("speak") => {
            let chat_id = args.next().context("missing <chat-id>")?;
            let mut words = Vec::new();
            let mut voice = None;
            let mut noise = None;

            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--voice" => voice = Some(args.next().context("--voice needs a value")?),
                    "--noise" => noise = Some(args.next().context("--noise needs a value")?),
                    _ => words.push(arg),
                }
            }

            if words.is_empty() {
                bail!("missing <text>");
            }
            Ok(Command::Speak {
                chat_id,
                text: words.join(" "),
                voice,
                noise,
            })
        }
        Some("maintain") => Ok(Command::Maintain),
        Some(other) => bail!("unknown command {other:?}"),
        None => bail!("no command given"),
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn speak(
    config: &AppConfig,
    paths: &AppPaths,
    repository: Arc<dyn NoiseRepository>,
    chat_id: String,
    text: String,
    voice: Option<String>,
    noise: Option<String>,
) -> Result<()> {
    let delivery = TelegramClient::from_config(&config.delivery)
        .context("no bot token configured (set BOT_TOKEN or delivery.bot_token)")?;

    if !is_ffmpeg_available(&config.pipeline.ffmpeg_path).await {
        log::warn!(
            "ffmpeg not found at {:?}; audio will be sent unprocessed",
            config.pipeline.ffmpeg_path
        );
    }

    let engine = Arc::new(FfmpegEngine::new(config.pipeline.ffmpeg_path.clone()));
    let executor = Arc::new(PipelineExecutor::from_config(engine, config));
    let selector = NoiseSelector::from_config(repository, &config.noise);
    let voices: Arc<dyn VoiceRepository> = Arc::new(
        JsonVoiceRepository::open(&paths.voice_catalog_file)
            .await
            .with_context(|| format!("opening {}", paths.voice_catalog_file.display()))?,
    );
    let synthesizer = Arc::new(HttpSynthesizer::from_config(&config.tts));

    let mut orchestrator = ConversionOrchestrator::new(
        selector,
        voices,
        synthesizer,
        executor,
        Arc::new(delivery),
        config,
    );
    if config.llm.enabled {
        orchestrator = orchestrator.with_enhancer(Arc::new(FallbackEnhancer::new(
            ApiEnhancer::from_config(&config.llm),
        )));
    }

    let mut user = UserProfile::new(chat_id.clone());
    user.selected_voice = voice;
    user.noise_tag = noise;

    let outcome = orchestrator
        .convert_and_send(&text, &user, &ChatTarget::new(chat_id))
        .await?;
    println!("{}", outcome.label());
    Ok(())
}

async fn maintain(config: &AppConfig, repository: Arc<dyn NoiseRepository>) -> Result<()> {
    let asset_dir = config.noise.resolved_asset_dir();
    let report = reconcile_catalog(repository.as_ref(), &asset_dir).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let command = match parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            std::process::exit(2);
        }
    };

    // 2. Configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    config.apply_env_overrides();

    // 3. Noise catalog
    let paths = AppPaths::new();
    let repository: Arc<dyn NoiseRepository> = Arc::new(
        JsonNoiseRepository::open(&paths.noise_catalog_file)
            .await
            .with_context(|| format!("opening {}", paths.noise_catalog_file.display()))?,
    );

    // 4. Command
    match command {
        Command::Speak {
            chat_id,
            text,
            voice,
            noise,
        } => speak(&config, &paths, repository, chat_id, text, voice, noise).await,
        Command::Maintain => maintain(&config, repository).await,
    }
}
