//! morse-decode - replay a keying script through the decoder and print the result

use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::{Context, Result};
use clap::Parser;
use decoder_host::script::{parse_script, replay};
use decoder_host::{
    DecoderConfig, DecoderController, DecoderEvent, JsonFileStore, KeyCode, MappingStore, MemoryStore,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Decode straight-key Morse from a script of timed key edges
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Script with one `down <ms>` or `up <ms>` line per edge
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,

    /// Keying speed in words per minute
    #[arg(short, long, default_value_t = 10)]
    wpm: u32,

    /// JSON file holding custom sequence mappings
    #[arg(short, long, value_name = "FILE")]
    mappings: Option<PathBuf>,

    /// Ignore custom mappings during lookup
    #[arg(long)]
    no_custom: bool,

    /// Drop unknown sequences instead of printing a placeholder
    #[arg(long)]
    no_unknown: bool,

    /// Contact bounce filter in milliseconds
    #[arg(long, default_value_t = 50, value_name = "MS")]
    debounce: u64,

    /// Print every decoder event, not only completed words
    #[arg(short, long)]
    events: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = DecoderConfig::new(cli.wpm, KeyCode::SPACE, cli.debounce, 50)
        .map_err(anyhow::Error::msg)
        .context("Invalid decoder configuration")?
        .with_policies(!cli.no_custom, !cli.no_unknown);

    let source = std::fs::read_to_string(&cli.script)
        .with_context(|| format!("Failed to read script: {}", cli.script.display()))?;
    let events = parse_script(&source, config.key)
        .with_context(|| format!("Failed to parse script: {}", cli.script.display()))?;

    info!(edges = events.len(), wpm = config.wpm, "replaying script");

    let output = match &cli.mappings {
        Some(path) => run(config, JsonFileStore::new(path), &events)
            .with_context(|| format!("Failed to load mappings: {}", path.display()))?,
        None => run(config, MemoryStore::new(), &events)?,
    };

    for event in output {
        match event {
            DecoderEvent::WordCompleted(word) => println!("{}", word),
            other if cli.events => println!("{:?}", other),
            _ => {}
        }
    }

    Ok(())
}

fn run<S: MappingStore>(
    config: DecoderConfig,
    store: S,
    events: &[decoder_host::KeyEvent],
) -> Result<Vec<DecoderEvent>> {
    let mut controller = DecoderController::new(config, store)?;

    let (tx, rx) = mpsc::channel();
    controller.subscribe(move |event| {
        let _ = tx.send(event.clone());
    });

    replay(&mut controller, events);
    drop(controller);

    Ok(rx.into_iter().collect())
}
