mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eyn_core::{
    converter::require_tools, load_config_or_default, plan_conversions, validate_config,
    Config, ConversionExecutor, Converter, FfmpegConverter,
};

use cli::{Cli, Commands, ConvertArgs};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config_or_default(cli.config.as_deref()).with_context(|| match cli.config {
        Some(ref path) => format!("Failed to load config from {:?}", path),
        None => "Failed to load configuration from environment".to_string(),
    })?;
    validate_config(&config).context("Configuration validation failed")?;

    match cli.command {
        Commands::Convert(args) => convert(config, args).await,
        Commands::Probe { file, json } => probe(config, file, json).await,
        Commands::CheckTools => check_tools(&config),
    }
}

async fn convert(config: Config, args: ConvertArgs) -> Result<()> {
    let settings = args.settings(&config);
    let options = args.execute_options(&config);
    let converter = FfmpegConverter::new(config.converter);

    let jobs = plan_conversions(&converter, &args.src, settings)
        .await
        .with_context(|| format!("Failed to plan conversions for {:?}", args.src))?;

    let executor = ConversionExecutor::new(converter);
    let summary = executor.execute(jobs, &options).await;

    let failed = summary.failed();
    if failed > 0 {
        bail!("{} of {} conversion(s) failed", failed, summary.total);
    }
    Ok(())
}

async fn probe(config: Config, file: std::path::PathBuf, json: bool) -> Result<()> {
    let converter = FfmpegConverter::new(config.converter);
    converter.validate().await?;

    let streams = converter
        .probe(&file)
        .await
        .with_context(|| format!("Failed to probe {:?}", file))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&streams)?);
    } else {
        println!("File:  {}", file.display());
        println!("Video: {}", streams.video_codec.as_deref().unwrap_or("none"));
        println!("Audio: {}", streams.audio_codec.as_deref().unwrap_or("none"));
    }
    Ok(())
}

fn check_tools(config: &Config) -> Result<()> {
    let tools = require_tools(&config.converter)?;
    println!("ffmpeg:  {}", tools.ffmpeg.display());
    println!("ffprobe: {}", tools.ffprobe.display());
    Ok(())
}
