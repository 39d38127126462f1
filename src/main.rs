//! dnnscale CLI
//!
//! Upscale an image or a video with a pretrained super-resolution model.

use anyhow::Context;
use clap::Parser;
use dnnscale::{
    media,
    pipeline::{self, JobSummary, VideoOptions},
    ModelRegistry, Settings,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dnnscale")]
#[command(about = "Upscale images and videos with neural super-resolution models")]
#[command(version)]
struct Cli {
    /// Input filename path
    #[arg(short, long, required_unless_present = "list_models")]
    input: Option<PathBuf>,

    /// Output filename path (its extension selects the format)
    #[arg(short, long, required_unless_present = "list_models")]
    output: Option<PathBuf>,

    /// The name of the model to be used for the upscaling
    #[arg(short, long, required_unless_present = "list_models")]
    model: Option<String>,

    /// Directory containing the model weights
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Disable the video progress bar
    #[arg(long)]
    no_progress: bool,

    /// List the known models and exit
    #[arg(long)]
    list_models: bool,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dnnscale=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(dir) = &cli.models_dir {
        settings = settings.with_models_dir(dir);
    }
    if cli.no_progress {
        settings = settings.with_progress(false);
    }

    let registry = ModelRegistry::new(&settings.models_dir);

    if cli.list_models {
        return cmd_list_models(&registry);
    }

    // clap enforces these unless --list-models was given
    let (Some(input), Some(output), Some(model_name)) = (cli.input, cli.output, cli.model) else {
        anyhow::bail!("--input, --output and --model are required");
    };

    cmd_upscale(&registry, &settings, input, output, &model_name)
}

fn cmd_upscale(
    registry: &ModelRegistry,
    settings: &Settings,
    input: PathBuf,
    output: PathBuf,
    model_name: &str,
) -> anyhow::Result<()> {
    // Name and paths are checked before any weights or media are read
    let spec = registry.resolve(model_name)?;
    media::classify_job(&input, &output)?;

    let model = registry.load(spec.name)?;

    let summary = pipeline::run(&input, &output, &model, VideoOptions::from(settings))
        .with_context(|| format!("upscaling {}", input.display()))?;

    match summary {
        JobSummary::Image(resolution) => {
            tracing::info!("Wrote {} ({})", output.display(), resolution);
        }
        JobSummary::Video(summary) => {
            tracing::info!(
                "Wrote {}: {} frames, {} -> {} @ {} ({})",
                output.display(),
                summary.frames,
                summary.input,
                summary.output,
                summary.framerate,
                summary.codec
            );
        }
    }

    Ok(())
}

fn cmd_list_models(registry: &ModelRegistry) -> anyhow::Result<()> {
    println!("Available Models");
    println!("================\n");

    for spec in registry.iter() {
        let status = if spec.path.is_file() { "" } else { " (weights missing)" };
        println!(
            "  {:<8} {} x{}  {}{}",
            spec.name,
            spec.algorithm,
            spec.scale,
            spec.path.display(),
            status
        );
    }

    println!("\nUsage: dnnscale -i <input> -o <output> -m <model>");

    Ok(())
}
