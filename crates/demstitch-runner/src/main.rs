//! `demstitch` command-line tool.

use clap::{ArgAction, Parser, Subcommand};
use demstitch_dem::{tile_paths_in, LoadMode};
use demstitch_raster::{trim, Canvas, CanvasStats};
use demstitch_runner::io::{read_blob, write_blob};
use demstitch_runner::{
    assemble_paths, log_stats, process, write_quantized, PipelineConfig, ProcessOptions, Result,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "demstitch",
    version,
    about = "Stitch geo-referenced elevation tiles into a mosaic and derive height maps"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// YAML pipeline configuration. Command-line flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load tiles, composite them and write an f32 blob.
    Assemble {
        /// Tile files, or directories of tiles.
        #[arg(required = true)]
        tiles: Vec<PathBuf>,

        /// Output blob path.
        #[arg(short, long)]
        output: PathBuf,

        /// Trim all-missing borders before writing.
        #[arg(long)]
        trim: bool,

        /// Skip bad tiles instead of aborting.
        #[arg(long)]
        lenient: bool,
    },

    /// Window, trim, decimate and normalize an f32 blob.
    Process {
        /// Input blob path.
        input: PathBuf,

        /// Output blob path.
        #[arg(short, long)]
        output: PathBuf,

        /// Keep only rows r0..=r1 and columns c0..=c1.
        #[arg(long, value_name = "R0,R1,C0,C1", value_parser = parse_window)]
        window: Option<[usize; 4]>,

        /// Trim all-missing borders.
        #[arg(long)]
        trim: bool,

        /// Keep every N-th row and column.
        #[arg(long, value_name = "N")]
        decimation: Option<u32>,

        /// Shift elevations so the minimum is zero.
        #[arg(long)]
        normalize: bool,
    },

    /// Quantize an f32 blob to an 8-bit PNG.
    Png {
        /// Input blob path.
        input: PathBuf,

        /// Output PNG path.
        #[arg(short, long)]
        output: PathBuf,

        /// Also write the validity mask to this PNG.
        #[arg(long)]
        mask: Option<PathBuf>,

        /// Decimate by N before quantizing.
        #[arg(long, value_name = "N", conflicts_with = "target_dimension")]
        decimation: Option<u32>,

        /// Decimate so the smaller dimension is about N pixels.
        #[arg(long, value_name = "N")]
        target_dimension: Option<usize>,
    },

    /// Print dimensions and coverage of an f32 blob.
    Info {
        /// Input blob path.
        input: PathBuf,
    },
}

fn parse_window(text: &str) -> std::result::Result<[usize; 4], String> {
    let values = text
        .split(',')
        .map(|part| part.trim().parse::<usize>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid window {:?}: {}", text, e))?;
    <[usize; 4]>::try_from(values)
        .map_err(|v| format!("window needs 4 values, got {}", v.len()))
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            info!("Using config {}", path.display());
            PipelineConfig::from_file(path)
        }
        None => Ok(PipelineConfig::default()),
    }
}

/// Expand directories into the tile files they contain.
fn expand_tile_args(args: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for arg in args {
        if arg.is_dir() {
            paths.extend(tile_paths_in(arg)?);
        } else {
            paths.push(arg.clone());
        }
    }
    Ok(paths)
}

/// Command-line values layered over the configured ones.
fn overlay(
    base: &ProcessOptions,
    window: Option<[usize; 4]>,
    trim: bool,
    decimation: Option<u32>,
    target_dimension: Option<usize>,
    normalize: bool,
) -> ProcessOptions {
    let (decimation, target_dimension) = match (decimation, target_dimension) {
        (Some(d), _) => (Some(d), None),
        (None, Some(t)) => (None, Some(t)),
        (None, None) => (base.decimation, base.target_dimension),
    };
    ProcessOptions {
        trim: base.trim || trim,
        window: window.or(base.window),
        decimation,
        target_dimension,
        normalize: base.normalize || normalize,
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Assemble {
            tiles,
            output,
            trim: trim_borders,
            lenient,
        } => {
            if lenient {
                config.load.mode = LoadMode::Lenient;
            }
            let paths = expand_tile_args(&tiles)?;
            let (mut canvas, _extent) = assemble_paths(&paths, &config)?;
            if trim_borders || config.pipeline.trim {
                canvas = trim(&canvas);
            }
            log_stats(&canvas);
            write_blob(&output, &canvas)?;
            info!("Wrote mosaic to {}", output.display());
        }

        Command::Process {
            input,
            output,
            window,
            trim,
            decimation,
            normalize,
        } => {
            let options = overlay(&config.pipeline, window, trim, decimation, None, normalize);
            let canvas: Canvas<f32> = read_blob(&input)?;
            let processed = process(canvas, &options)?;
            write_blob(&output, &processed.canvas)?;
            info!("Wrote processed canvas to {}", output.display());
        }

        Command::Png {
            input,
            output,
            mask,
            decimation,
            target_dimension,
        } => {
            let base = ProcessOptions {
                decimation: config.pipeline.decimation,
                target_dimension: config.pipeline.target_dimension,
                ..ProcessOptions::default()
            };
            let options = overlay(&base, None, false, decimation, target_dimension, false);
            let canvas: Canvas<f32> = read_blob(&input)?;
            let processed = process(canvas, &options)?;
            let quantized = write_quantized(
                &processed.canvas,
                processed.decimation,
                &output,
                mask.as_deref(),
            )?;
            println!("scale factor: {}", quantized.scale_factor);
        }

        Command::Info { input } => {
            let canvas: Canvas<f32> = read_blob(&input)?;
            let stats = CanvasStats::of(&canvas);
            println!("shape:    {} x {} (rows x cols)", stats.height, stats.width);
            println!(
                "present:  {} of {} ({:.2} %)",
                stats.present,
                stats.total,
                stats.coverage_percent()
            );
            match (stats.min, stats.max) {
                (Some(min), Some(max)) => println!("range:    {} .. {}", min, max),
                _ => println!("range:    no elevation data"),
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
