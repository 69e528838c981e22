//! Stability CLI - generate, upscale, and edit images from the command line

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use stability_core::stable_image::{
    AspectRatio, CoreGenerateRequest, OutputFormat, RemoveBackgroundRequest, StylePreset,
    UpscaleRequest,
};
use stability_core::{PollConfig, ResponseFormat, StabilityClient};

#[derive(Parser)]
#[command(name = "stability")]
#[command(author, version, about = "Generate, upscale, and edit images with the Stability API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API key (defaults to the STABILITY_API_KEY environment variable)
    #[arg(long, global = true, env = "STABILITY_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// API origin override, mainly for testing
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the engines available to this API key
    Engines,

    /// Generate an image from a text prompt
    Generate {
        /// What to generate
        prompt: String,
        /// Where to write the image
        #[arg(short, long)]
        output: PathBuf,
        /// What to keep out of the image
        #[arg(long)]
        negative_prompt: Option<String>,
        /// Aspect ratio, e.g. 16:9
        #[arg(long, value_parser = parse_aspect_ratio)]
        aspect_ratio: Option<AspectRatio>,
        /// Seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,
        /// Style preset, e.g. photographic
        #[arg(long, value_parser = parse_style_preset)]
        style_preset: Option<StylePreset>,
        /// Output format: png, jpeg, or webp
        #[arg(long, value_parser = parse_output_format)]
        format: Option<OutputFormat>,
    },

    /// Upscale an image
    Upscale {
        /// Source image
        input: PathBuf,
        /// What the upscaled image should depict
        prompt: String,
        /// Where to write the image
        #[arg(short, long)]
        output: PathBuf,
        /// Use the asynchronous creative upscaler instead of the
        /// conservative one
        #[arg(long)]
        creative: bool,
        /// How much latitude the model has to invent detail (0 to 0.35)
        #[arg(long)]
        creativity: Option<f32>,
        /// Seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,
        /// Seconds between polls of the creative upscaler
        #[arg(long, default_value_t = 10)]
        interval_secs: u64,
        /// Give up after this many seconds of polling
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Remove the background from an image
    RemoveBackground {
        /// Source image
        input: PathBuf,
        /// Where to write the image
        #[arg(short, long)]
        output: PathBuf,
        /// Output format: png or webp
        #[arg(long, value_parser = parse_output_format)]
        format: Option<OutputFormat>,
    },
}

fn parse_aspect_ratio(s: &str) -> Result<AspectRatio, String> {
    AspectRatio::parse(s).ok_or_else(|| format!("unknown aspect ratio '{s}'"))
}

fn parse_style_preset(s: &str) -> Result<StylePreset, String> {
    StylePreset::parse(s).ok_or_else(|| format!("unknown style preset '{s}'"))
}

fn parse_output_format(s: &str) -> Result<OutputFormat, String> {
    OutputFormat::parse(s).ok_or_else(|| format!("unknown output format '{s}'"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let api_key = cli
        .api_key
        .clone()
        .context("API key missing. Set STABILITY_API_KEY or pass --api-key.")?;
    let mut builder = StabilityClient::builder().api_key(api_key);
    if let Some(base_url) = &cli.base_url {
        builder = builder.base_url(base_url.clone());
    }
    let client = builder.build()?;

    match cli.command {
        Commands::Engines => cmd_engines(&client, cli.quiet).await,
        Commands::Generate {
            prompt,
            output,
            negative_prompt,
            aspect_ratio,
            seed,
            style_preset,
            format,
        } => {
            let mut request = CoreGenerateRequest::new(prompt);
            if let Some(negative) = negative_prompt {
                request = request.with_negative_prompt(negative);
            }
            if let Some(ratio) = aspect_ratio {
                request = request.with_aspect_ratio(ratio);
            }
            if let Some(seed) = seed {
                request = request.with_seed(seed);
            }
            if let Some(preset) = style_preset {
                request = request.with_style_preset(preset);
            }
            if let Some(format) = format {
                request = request.with_output_format(format);
            }
            cmd_generate(&client, &request, &output, cli.quiet).await
        }
        Commands::Upscale {
            input,
            prompt,
            output,
            creative,
            creativity,
            seed,
            interval_secs,
            timeout_secs,
        } => {
            let image = read_input(&input)?;
            let mut request = UpscaleRequest::new(image, prompt);
            if let Some(creativity) = creativity {
                request = request.with_creativity(creativity);
            }
            if let Some(seed) = seed {
                request = request.with_seed(seed);
            }
            let mut poll = PollConfig::with_interval(Duration::from_secs(interval_secs));
            if let Some(timeout_secs) = timeout_secs {
                poll = poll.with_deadline(Duration::from_secs(timeout_secs));
            }
            cmd_upscale(&client, &request, creative, &poll, &output, cli.quiet).await
        }
        Commands::RemoveBackground {
            input,
            output,
            format,
        } => {
            let image = read_input(&input)?;
            let mut request = RemoveBackgroundRequest::new(image);
            if let Some(format) = format {
                request = request.with_output_format(format);
            }
            cmd_remove_background(&client, &request, &output, cli.quiet).await
        }
    }
}

async fn cmd_engines(client: &StabilityClient, quiet: bool) -> anyhow::Result<()> {
    let engines = client.list_engines().await?;
    for engine in &engines {
        if quiet {
            println!("{}", engine.id);
        } else {
            println!("{:<40} {} - {}", engine.id, engine.name, engine.description);
        }
    }
    Ok(())
}

async fn cmd_generate(
    client: &StabilityClient,
    request: &CoreGenerateRequest,
    output: &Path,
    quiet: bool,
) -> anyhow::Result<()> {
    let result = client.generate_core(request, ResponseFormat::Image).await?;
    let bytes = result.into_bytes()?;
    write_output(output, &bytes)?;
    if !quiet {
        println!("Wrote {} ({} bytes)", output.display(), bytes.len());
    }
    Ok(())
}

async fn cmd_upscale(
    client: &StabilityClient,
    request: &UpscaleRequest,
    creative: bool,
    poll: &PollConfig,
    output: &Path,
    quiet: bool,
) -> anyhow::Result<()> {
    let result = if creative {
        info!(interval_secs = poll.interval.as_secs(), "Polling creative upscaler");
        client
            .upscale_creative_and_wait(request, ResponseFormat::Image, poll)
            .await?
    } else {
        client
            .upscale_conservative(request, ResponseFormat::Image)
            .await?
    };
    let bytes = result.into_bytes()?;
    write_output(output, &bytes)?;
    if !quiet {
        println!("Wrote {} ({} bytes)", output.display(), bytes.len());
    }
    Ok(())
}

async fn cmd_remove_background(
    client: &StabilityClient,
    request: &RemoveBackgroundRequest,
    output: &Path,
    quiet: bool,
) -> anyhow::Result<()> {
    let result = client
        .remove_background(request, ResponseFormat::Image)
        .await?;
    let bytes = result.into_bytes()?;
    write_output(output, &bytes)?;
    if !quiet {
        println!("Wrote {} ({} bytes)", output.display(), bytes.len());
    }
    Ok(())
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}
