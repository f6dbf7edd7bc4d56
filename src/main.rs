use anyhow::{bail, Context, Result};
use chat_composer::attachments::ImageBlob;
use chat_composer::composer::{ComposerController, InMemoryHost, SubmitOutcome};
use chat_composer::config::ComposerConfig;
use chat_composer::speech::ScriptedProvider;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Compose a chat message from typed text, simulated dictation and images,
/// then print it as JSON.
#[derive(Parser, Debug)]
#[command(name = "chat-composer", version, about)]
struct Args {
    /// Typed input text
    #[arg(short, long, default_value = "")]
    text: String,

    /// Dictated segments, delivered in order by a scripted recognizer.
    /// The final transcript replaces the typed text.
    #[arg(short, long)]
    say: Vec<String>,

    /// Image files chosen with the picker (non-images are skipped)
    #[arg(short, long)]
    image: Vec<PathBuf>,

    /// Files dropped onto the composer (not filtered)
    #[arg(short, long)]
    drop: Vec<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// How long to wait for attachment encoding
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,
}

fn load_config(path: Option<&PathBuf>) -> Result<ComposerConfig> {
    let Some(path) = path else {
        return Ok(ComposerConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    Ok(ComposerConfig::from_json_str(&json)?)
}

fn main() -> Result<()> {
    // Initialize tracing; stdout is reserved for the message
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_composer=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;

    let (provider, recognizer) = ScriptedProvider::pair();
    let mut composer = ComposerController::new(InMemoryHost::default(), &provider, config)?;

    composer.text_changed(args.text);

    if !args.say.is_empty() {
        composer.listen();
        for segment in &args.say {
            recognizer.speak(segment);
        }
        composer.poll_events();
        composer.listen();
    }

    composer.files_selected(args.image.into_iter().map(ImageBlob::from_path).collect());
    composer.files_dropped(args.drop.into_iter().map(ImageBlob::from_path).collect());

    composer.wait_for_attachments(Duration::from_millis(args.timeout_ms));
    if composer.attachments().is_encoding() {
        bail!("Timed out encoding attachments");
    }
    for item in composer.attachments().encoded().items() {
        if let Some(error) = item.error() {
            warn!(name = %item.name, "{}", error);
        }
    }

    match composer.submit() {
        SubmitOutcome::Submitted(message) => {
            info!(images = message.images.len(), "Message composed");
            println!("{}", message.to_json()?);
            Ok(())
        }
        SubmitOutcome::Blocked(reason) => bail!("Cannot submit: {}", reason),
    }
}
