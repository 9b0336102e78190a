//! # Image Sync - Main Entry Point
//!
//! Punto di ingresso della CLI `sync-images`.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti con `clap` (tutti opzionali)
//! - Inizializzazione del logging con `tracing` (su stderr, stdout resta per il report)
//! - Costruzione della `SyncConfig`: default → file JSON → flag CLI
//! - Avvio della sincronizzazione ed exit code 1 su qualsiasi errore
//!
//! ## Esempio di utilizzo:
//! ```bash
//! # static/images → ../public/images relativi alla directory corrente
//! sync-images
//! sync-images --root assets --optimize --quality 85 --verbose
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use image_sync::{ImageSync, JsonMessage, OptimizerMode, RunResult, SyncConfig};

#[derive(Parser)]
#[command(name = "sync-images")]
#[command(about = "Copy and optimize static images into the public directory")]
struct Args {
    /// Base directory for the default input/output paths (default: current directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Input directory (default: <root>/static/images)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output directory (default: <root>/../public/images)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Optimize with installed command-line tools instead of copying
    #[arg(long)]
    optimize: bool,

    /// JPEG quality (1-100) for lossy tools
    #[arg(short, long)]
    quality: Option<u8>,

    /// Number of parallel tool processes
    #[arg(short, long)]
    workers: Option<usize>,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if args.verbose { "debug" } else { "info" }));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = build_config(&args).await?;
    let json_output = config.json_output;

    let outcome = run(config).await.context("Error copying images");

    match outcome {
        Ok(_) => Ok(()),
        Err(err) if json_output => {
            println!("{}", JsonMessage::error(&err).to_json()?);
            std::process::exit(1);
        }
        Err(err) => Err(err),
    }
}

async fn run(config: SyncConfig) -> Result<RunResult> {
    let sync = ImageSync::from_config(config)?;
    sync.run_and_report(&mut std::io::stdout()).await
}

/// Defaults, then the config file, then command-line flags
async fn build_config(args: &Args) -> Result<SyncConfig> {
    let root = match args.root {
        Some(ref root) => root.clone(),
        None => std::env::current_dir().context("Failed to resolve the current directory")?,
    };

    let defaults = SyncConfig::relative_to(&root);
    let mut config = match args.config {
        Some(ref path) => SyncConfig::from_file(path, defaults).await?,
        None => defaults,
    };

    if let Some(ref input) = args.input {
        config.input_dir = input.clone();
    }
    if let Some(ref output) = args.output {
        config.output_dir = output.clone();
    }
    if args.optimize {
        config.mode = OptimizerMode::ExternalTools;
    }
    if let Some(quality) = args.quality {
        config.jpeg_quality = quality;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if args.json {
        config.json_output = true;
    }

    Ok(config)
}
