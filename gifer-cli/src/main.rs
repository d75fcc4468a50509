//! gifer CLI Tool
//!
//! Command-line interface for merging still images and animations into one
//! animated GIF.

mod manifest;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use gifer_codec::decoder::detect_kind;
use gifer_codec::{EncoderConfig, StandardCodec};
use gifer_core::{LayerOptions, Timeline, TimelineConfig};
use manifest::Manifest;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gifer")]
#[command(about = "gifer - Merge still images and animations into a single animated GIF")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stack files as layers at the top-left corner, first file at the bottom
    Compose {
        /// Input images and animations, in draw order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output GIF file path
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Render a JSON layer manifest
    Render {
        /// Manifest file path
        manifest: PathBuf,

        /// Output GIF file path
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Show the output schedule of a JSON layer manifest without rendering
    Inspect {
        /// Manifest file path
        manifest: PathBuf,

        /// Do not cut the output to the length of the first layer
        #[arg(long)]
        no_trim: bool,

        /// Number of output frames to list
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

#[derive(Args)]
struct RenderArgs {
    /// Do not cut the output to the length of the first layer
    #[arg(long)]
    no_trim: bool,

    /// GIF quantization speed (1 = best quality, 30 = fastest)
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(i32).range(1..=30))]
    speed: i32,

    /// Play the output this many times instead of looping forever
    #[arg(long)]
    repeat: Option<u16>,
}

impl RenderArgs {
    fn timeline(&self) -> Timeline<StandardCodec> {
        let codec = StandardCodec::new(EncoderConfig {
            speed: self.speed,
            repeat: self.repeat,
        });
        Timeline::with_config(codec, TimelineConfig { trim_to_base: !self.no_trim })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compose { inputs, output, render } => compose_files(&inputs, &output, &render)?,

        Commands::Render { manifest, output, render } => render_manifest(&manifest, &output, &render)?,

        Commands::Inspect { manifest, no_trim, limit } => inspect_manifest(&manifest, no_trim, limit)?,
    }

    Ok(())
}

/// Log level used when `RUST_LOG` is not set
fn default_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn init_logging(verbose: u8) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn compose_files(inputs: &[PathBuf], output: &Path, args: &RenderArgs) -> Result<()> {
    println!("Composing {} layers", inputs.len());
    println!("Output: {}", output.display());

    let mut timeline = args.timeline();
    for input in inputs {
        let kind = detect_kind(input).with_context(|| format!("Failed to read {}", input.display()))?;
        timeline
            .register(input, kind, LayerOptions::default())
            .with_context(|| format!("Failed to add layer {}", input.display()))?;
    }

    finish(&timeline, output)
}

fn render_manifest(manifest_path: &Path, output: &Path, args: &RenderArgs) -> Result<()> {
    println!("Rendering manifest: {}", manifest_path.display());
    println!("Output: {}", output.display());

    let manifest = Manifest::load(manifest_path)?;
    let mut timeline = args.timeline();
    load_layers(&mut timeline, &manifest)?;

    finish(&timeline, output)
}

fn inspect_manifest(manifest_path: &Path, no_trim: bool, limit: usize) -> Result<()> {
    let manifest = Manifest::load(manifest_path)?;
    let config = TimelineConfig { trim_to_base: !no_trim };
    let mut timeline = Timeline::with_config(StandardCodec::default(), config);
    load_layers(&mut timeline, &manifest)?;

    print_schedule(&timeline, limit);
    Ok(())
}

fn load_layers(timeline: &mut Timeline<StandardCodec>, manifest: &Manifest) -> Result<()> {
    for entry in &manifest.layers {
        let layer = timeline
            .register(&entry.file_path, entry.kind()?, entry.options())
            .with_context(|| format!("Failed to add layer {}", entry.file_path.display()))?;
        tracing::info!(path = %entry.file_path.display(), layer, "registered layer");
    }
    Ok(())
}

fn finish(timeline: &Timeline<StandardCodec>, output: &Path) -> Result<()> {
    let summary = timeline.render(output).context("Failed to render timeline")?;

    println!(
        "Successfully wrote {} frames ({:.2} seconds) to {}",
        summary.frames,
        summary.duration_ms as f64 / 1000.0,
        output.display()
    );
    Ok(())
}

fn print_schedule(timeline: &Timeline<StandardCodec>, limit: usize) {
    let schedule = timeline.schedule();

    println!("\n=== Timeline ===");
    println!("Static layers: {}", timeline.static_frames().len());
    println!("Animation sub-images: {}", timeline.dynamic_frames().len());
    match timeline.base_duration() {
        Some(ms) => println!("Base length: {} ms ({:.2} seconds)", ms, ms as f64 / 1000.0),
        None => println!("Base length: none"),
    }
    println!(
        "Duration: {} ms ({:.2} seconds)",
        schedule.terminal(),
        schedule.terminal() as f64 / 1000.0
    );
    println!("Breakpoints: {}", schedule.breakpoints().len());
    println!("Output frames: {}", schedule.frame_count());

    println!("\n=== Schedule (first {} frames) ===", limit);
    let durations = schedule.durations_ms();
    for (i, (instant, duration)) in schedule.instants().iter().zip(&durations).take(limit).enumerate() {
        let mut layers: Vec<u32> = schedule.bucket_at(i).map(|frame| frame.layer()).collect();
        layers.sort_unstable();
        println!(
            "  [{}] {}ms for {}ms, animated layers {:?}",
            i, instant, duration, layers
        );
    }
    if schedule.frame_count() > limit {
        println!("  ... and {} more frames", schedule.frame_count() - limit);
    }
}
