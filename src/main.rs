// Entry point: analyze an image into a chord sequence, export it as a
// multi-track MIDI file, and optionally tell its mythic story.

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vibe_engine::core_modules::frame::ImageFrame;
use vibe_engine::core_modules::midi_export::{self, ExportConfig, TrackKind};
use vibe_engine::pipeline::{PipelineConfig, VibePipeline};

/// Parse a comma-separated track list like "melody,bass".
fn parse_tracks(s: &str) -> Result<Vec<TrackKind>> {
    s.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            TrackKind::from_name(name)
                .with_context(|| format!("unknown track kind: {name}"))
        })
        .collect()
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the input image
    image_path: PathBuf,

    /// Output MIDI file path
    #[arg(short, long, default_value = "output.mid")]
    output: PathBuf,

    /// Tempo in BPM (20-200)
    #[arg(short, long, default_value_t = 60)]
    bpm: u32,

    /// Total duration in seconds (1-300)
    #[arg(short, long, default_value_t = 8)]
    duration: u32,

    /// Tracks to render, comma separated: melody,harmony,percussion,bass
    #[arg(short, long, default_value = "melody,harmony,percussion,bass")]
    tracks: String,

    /// Number of sample columns in the sequence
    #[arg(long, default_value_t = 16)]
    samples: usize,

    /// Row stride of the per-column brightness average
    #[arg(long, default_value_t = 6)]
    stride: usize,

    /// Print the image's mythic story
    #[arg(long)]
    story: bool,

    /// Seed for reproducible randomized output
    #[arg(long)]
    seed: Option<u64>,

    /// Print the full analysis report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let tracks = parse_tracks(&args.tracks)?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let image = image::open(&args.image_path)
        .with_context(|| format!("failed to open image: {}", args.image_path.display()))?
        .to_rgba8();
    info!(
        width = image.width(),
        height = image.height(),
        "image loaded"
    );

    let pipeline = VibePipeline::new(PipelineConfig {
        sample_count: args.samples,
        row_stride: args.stride,
    })?;
    let frame = ImageFrame::from_image(&image)?;
    let report = if args.story {
        pipeline.analyze_with_story(&frame, &mut rng)
    } else {
        pipeline.analyze(&frame)
    };
    info!(
        steps = report.sequence.len(),
        mean_brightness = report.stats.mean_brightness,
        "analysis complete"
    );

    let export = ExportConfig {
        bpm: args.bpm,
        duration_secs: args.duration,
        tracks,
    };
    midi_export::write_midi(&report.sequence, &export, &args.output, &mut rng)?;
    info!(path = %args.output.display(), "MIDI exported");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if let Some(story) = &report.story {
        println!("{story}");
    }

    Ok(())
}
