//! restyle: command-line front end for mask authoring and generation runs.
//!
//! ```text
//! restyle mask <IMAGE> --strokes strokes.json -o punched.png
//! restyle run <IMAGE> --strokes strokes.json --fixtures dir/ -o out/
//! restyle filename "Soft Waves"
//! ```
//!
//! Logs go to stderr and are filtered with `RUST_LOG` (default `info`).

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod fixtures;
mod script;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use restyle_canvas::{CanvasConfig, MaskEdge, ResampleFilter, StrokeTracker, finalize, initialize};
use restyle_studio::{
    Orchestrator, ProgressModel, RunState, Session, StudioConfig, download_filename,
};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use crate::fixtures::FixtureDir;
use crate::script::Step;

/// Paint a region of a portrait and render hairstyle variants into it.
#[derive(Parser)]
#[command(name = "restyle", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a stroke script over an image and write the punched PNG.
    Mask {
        /// Path to the portrait (PNG, JPEG, BMP, WebP).
        image_path: PathBuf,

        /// Stroke script (JSON array of steps).
        #[arg(long)]
        strokes: PathBuf,

        /// Where to write the punched PNG.
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Author a mask and drive a full run against fixture collaborators.
    Run {
        /// Path to the portrait (PNG, JPEG, BMP, WebP).
        image_path: PathBuf,

        /// Stroke script (JSON array of steps).
        #[arg(long)]
        strokes: PathBuf,

        /// Directory holding `analysis.json` and one `<slug>.png` per style.
        #[arg(long)]
        fixtures: PathBuf,

        /// Directory to write generated looks into.
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Print the download filename for a style name.
    Filename {
        /// Style name, e.g. "Soft Waves".
        name: String,
    },
}

#[derive(Args)]
struct ConfigArgs {
    /// Longest side of the working canvas in pixels.
    #[arg(long, default_value_t = CanvasConfig::DEFAULT_MAX_DIMENSION, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    max_dimension: u32,

    /// Initial brush diameter in pixels (clamped to 10-100).
    #[arg(long, default_value_t = restyle_canvas::brush::DEFAULT_DIAMETER)]
    brush: f32,

    /// Erase proportionally to stroke coverage instead of fully.
    #[arg(long)]
    soft_edges: bool,

    /// Resampling filter used when fitting the portrait.
    #[arg(long, value_enum, default_value_t = Filter::Triangle)]
    filter: Filter,

    /// Full studio config as a JSON string.
    ///
    /// When provided, the other config flags are ignored.
    #[arg(long)]
    config_json: Option<String>,
}

/// Resampling filter selection.
#[derive(Clone, Copy, ValueEnum)]
enum Filter {
    /// Nearest-neighbor (fastest, blocky).
    Nearest,
    /// Bilinear interpolation.
    Triangle,
    /// Bicubic Catmull-Rom.
    CatmullRom,
    /// Lanczos with 3 lobes (sharpest).
    Lanczos3,
}

impl From<Filter> for ResampleFilter {
    fn from(f: Filter) -> Self {
        match f {
            Filter::Nearest => Self::Nearest,
            Filter::Triangle => Self::Triangle,
            Filter::CatmullRom => Self::CatmullRom,
            Filter::Lanczos3 => Self::Lanczos3,
        }
    }
}

/// Build a [`StudioConfig`] from CLI arguments.
///
/// `--config-json` wins over the individual flags.
fn config_from_args(args: &ConfigArgs) -> Result<StudioConfig, String> {
    if let Some(ref json) = args.config_json {
        return serde_json::from_str(json).map_err(|e| format!("error parsing --config-json: {e}"));
    }
    Ok(StudioConfig {
        canvas: CanvasConfig {
            max_dimension: args.max_dimension,
            filter: args.filter.into(),
            mask_edge: if args.soft_edges {
                MaskEdge::Soft
            } else {
                MaskEdge::Binary
            },
        },
        default_brush: args.brush,
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Mask {
            image_path,
            strokes,
            output,
            config,
        } => mask(&image_path, &strokes, &output, &config),
        Command::Run {
            image_path,
            strokes,
            fixtures,
            output,
            config,
        } => tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(Into::into)
            .and_then(|rt| rt.block_on(run(&image_path, &strokes, &fixtures, &output, &config))),
        Command::Filename { name } => {
            println!("{}", download_filename(&name));
            Ok(())
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, String> {
    std::fs::read(path).map_err(|e| format!("error reading {}: {e}", path.display()))
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

fn mask(
    image_path: &Path,
    strokes: &Path,
    output: &Path,
    args: &ConfigArgs,
) -> Result<(), Box<dyn Error>> {
    let config = config_from_args(args)?;
    let steps = script::load(strokes)?;
    let image_bytes = read_file(image_path)?;

    let mut canvas = initialize(&image_bytes, &config.canvas)?;
    let mut tracker = StrokeTracker::new(config.default_brush);
    for step in steps {
        match step {
            Step::Brush(d) => tracker.set_brush_diameter(d),
            other => {
                if let Some(event) = other.pointer_event() {
                    tracker.handle(event, &mut canvas);
                }
            }
        }
    }

    let punched = finalize(&canvas, config.canvas.mask_edge)?;
    std::fs::write(output, punched.as_bytes())
        .map_err(|e| format!("error writing {}: {e}", output.display()))?;
    let dims = punched.dimensions();
    eprintln!(
        "Punched image written to {} ({}x{}, {} bytes)",
        output.display(),
        dims.width,
        dims.height,
        punched.as_bytes().len(),
    );
    Ok(())
}

async fn run(
    image_path: &Path,
    strokes: &Path,
    fixtures: &Path,
    output: &Path,
    args: &ConfigArgs,
) -> Result<(), Box<dyn Error>> {
    let config = config_from_args(args)?;
    let steps = script::load(strokes)?;
    let image_bytes = tokio::fs::read(image_path)
        .await
        .map_err(|e| format!("error reading {}: {e}", image_path.display()))?;

    let progress = ProgressModel::new();
    let printer = tokio::spawn(print_progress(progress.subscribe()));
    let mut session = Session::with_progress(config, progress);

    session.upload(image_bytes, mime_for(image_path))?;
    for step in steps {
        match step {
            Step::Brush(d) => session.set_brush_diameter(d),
            other => {
                if let Some(event) = other.pointer_event() {
                    session.pointer(event)?;
                }
            }
        }
    }
    session.finish_mask()?;

    let collaborators = FixtureDir::new(fixtures);
    let orchestrator = Orchestrator::new(collaborators.clone(), collaborators);
    let outcome = session.generate(&orchestrator).await;

    drop(session);
    if let Err(e) = printer.await {
        tracing::warn!(error = %e, "progress printer stopped unexpectedly");
    }
    let result = outcome?;

    tokio::fs::create_dir_all(output)
        .await
        .map_err(|e| format!("error creating {}: {e}", output.display()))?;
    for style in &result.hairstyles {
        let Some(image) = style.generated_image() else {
            continue;
        };
        let path = output.join(download_filename(style.name()));
        tokio::fs::write(&path, image.bytes())
            .await
            .map_err(|e| format!("error writing {}: {e}", path.display()))?;
        println!("{}: {}", style.name(), path.display());
    }
    Ok(())
}

/// Print each new progress message and the terminal state until the
/// model is dropped.
async fn print_progress(mut rx: watch::Receiver<restyle_studio::ProgressSnapshot>) {
    let mut last_message = String::new();
    while rx.changed().await.is_ok() {
        let snap = rx.borrow_and_update().clone();
        if !snap.message.is_empty() && snap.message != last_message {
            eprintln!("{}", snap.message);
            last_message = snap.message.clone();
        }
        match snap.state {
            RunState::Complete => eprintln!("Done: {} looks generated", snap.generated_count()),
            RunState::Failed => {
                eprintln!("Failed: {}", snap.error.as_deref().unwrap_or("unknown error"));
            }
            _ => {}
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_build_config() {
        let cli = Cli::parse_from([
            "restyle",
            "mask",
            "in.png",
            "--strokes",
            "s.json",
            "-o",
            "out.png",
            "--max-dimension",
            "256",
            "--soft-edges",
            "--brush",
            "64",
        ]);
        let Command::Mask { config, .. } = cli.command else {
            panic!("expected mask command");
        };
        let config = config_from_args(&config).unwrap();
        assert_eq!(config.canvas.max_dimension, 256);
        assert_eq!(config.canvas.mask_edge, MaskEdge::Soft);
        assert_eq!(config.default_brush, 64.0);
    }

    #[test]
    fn config_json_overrides_flags() {
        let cli = Cli::parse_from([
            "restyle",
            "mask",
            "in.png",
            "--strokes",
            "s.json",
            "-o",
            "out.png",
            "--max-dimension",
            "256",
            "--config-json",
            r#"{"canvas": {"max_dimension": 128}}"#,
        ]);
        let Command::Mask { config, .. } = cli.command else {
            panic!("expected mask command");
        };
        assert_eq!(config_from_args(&config).unwrap().canvas.max_dimension, 128);
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(mime_for(Path::new("a/face.JPG")), "image/jpeg");
        assert_eq!(mime_for(Path::new("face.webp")), "image/webp");
        assert_eq!(mime_for(Path::new("face")), "image/png");
    }
}
