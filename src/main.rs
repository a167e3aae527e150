use clap::{Parser, Subcommand};
use fontweave::{
    BuildError, ConversionConfig, FontweaveConfig, JobError, PipelineBuilder, ProgressEvent, StoreError,
};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(version, about = "Detect and resolve the fonts a document needs", long_about = None)]
struct Args {
    /// Directory holding the custom font store
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect a document's fonts and resolve them, printing a JSON report
    Resolve {
        document: PathBuf,
        /// Treat this family as the document's primary font
        #[arg(long)]
        default_font: Option<String>,
    },
    /// Add a font file to the custom font store
    Import {
        font: PathBuf,
        /// Record id; defaults to the file stem
        #[arg(long)]
        id: Option<String>,
    },
    /// Print custom font store usage
    Stats,
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Job(#[from] JobError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("fontweave=info")).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => FontweaveConfig::from_json_file(path)?,
        None => FontweaveConfig::default(),
    };
    let mut builder = PipelineBuilder::new().with_config(config);
    if let Some(dir) = &args.store {
        builder = builder.with_store_dir(dir);
    }
    let orchestrator = builder.build().await?;

    match args.command {
        Command::Resolve { document, default_font } => {
            let source = fs::read_to_string(&document)?;
            let config = ConversionConfig {
                default_font,
                ..ConversionConfig::default()
            };
            let listener = Arc::new(|event: &ProgressEvent| {
                if let ProgressEvent::FontRetry { font, attempt, delay, .. } = event {
                    eprintln!("retrying {} after attempt {} (waiting {:?})", font, attempt, delay);
                }
            });
            let job_id = document.display().to_string();
            let assembly = orchestrator.prepare_fonts(&job_id, &source, &config, listener).await?;
            println!("{}", serde_json::to_string_pretty(&assembly.report)?);
        }
        Command::Import { font, id } => {
            let id = match id {
                Some(id) => id,
                None => font
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "font".to_string()),
            };
            let bytes = fs::read(&font)?;
            let record = orchestrator.store().import(id, bytes).await?;
            println!(
                "Imported '{}' as {} {} {} ({} bytes)",
                record.id, record.family, record.weight, record.style, record.size_bytes
            );
        }
        Command::Stats => {
            let stats = orchestrator.store().get_stats();
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}
