//! Numerai Blocks - Main Entry Point
//!
//! Reads a dataset, runs the configured models and post-processing stages,
//! and writes the prediction columns.

use anyhow::{Context, Result};
use clap::Parser;
use numerai_blocks::{config::AppConfig, DatasetSource, PredictionSink};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "numerai-blocks")]
#[command(about = "Run a prediction pipeline over a tournament dataset")]
struct Args {
    /// Pipeline configuration file
    #[arg(short, long, default_value = "config/config.toml")]
    config: PathBuf,

    /// Override the input dataset
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Override the output file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = AppConfig::load_from_path(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    if let Some(input) = args.input {
        config.data.input = input;
    }
    if let Some(output) = args.output {
        config.data.output = output;
    }

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("numerai_blocks={}", config.logging.level)))?;
    if config.logging.format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Starting Numerai Blocks pipeline");
    info!(
        "Configuration loaded: {} models, {} postprocessing stages",
        config.models.len(),
        config.postprocessing.len()
    );

    let pipeline = config.build_pipeline()?;
    info!(
        "Pipeline initialized with {} models: {:?}",
        pipeline.model_count(),
        pipeline.model_columns()
    );

    let frame = DatasetSource::new(&config.data.input)
        .id_col(&config.data.id_col)
        .era_col(&config.data.era_col)
        .read()
        .with_context(|| format!("Failed to read {}", config.data.input.display()))?;

    let frame = pipeline.run(frame)?;

    let mut sink = PredictionSink::new(&config.data.output);
    if !config.data.output_columns.is_empty() {
        sink = sink.columns(config.data.output_columns.clone());
    }
    sink.write(&frame)
        .with_context(|| format!("Failed to write {}", config.data.output.display()))?;

    pipeline.metrics().print_summary();
    info!("Pipeline finished");

    Ok(())
}
