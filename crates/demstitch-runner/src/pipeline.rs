//! Pipeline stages wired together with timing and logging.

use crate::config::{PipelineConfig, ProcessOptions};
use crate::io::write_png;
use crate::Result;
use demstitch_dem::{TileLoader, TileSource};
use demstitch_raster::{
    decimate, mask_outside, normalize, quantize, trim, Canvas, CanvasStats, Extent, Mosaic,
    Quantized,
};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Load GeoTIFF tiles and composite them into one canvas.
pub fn assemble_paths<P: AsRef<Path> + Sync>(
    paths: &[P],
    config: &PipelineConfig,
) -> Result<(Canvas<f32>, Extent)> {
    let loader = TileLoader::geotiff(config.load.clone());
    assemble_with(&loader, paths)
}

/// Load tiles through `loader` and composite them into one canvas.
pub fn assemble_with<S: TileSource, P: AsRef<Path> + Sync>(
    loader: &TileLoader<S>,
    paths: &[P],
) -> Result<(Canvas<f32>, Extent)> {
    let tiles = loader.load_all(paths)?;
    Ok(Mosaic::build(&tiles)?)
}

/// A processed elevation canvas and the decimation factor applied to it.
#[derive(Debug, Clone)]
pub struct Processed {
    /// The resulting canvas.
    pub canvas: Canvas<f32>,
    /// Decimation factor used, 1 if none.
    pub decimation: u32,
}

/// Run the post-assembly chain: window mask, trim, decimate, normalize.
pub fn process(canvas: Canvas<f32>, options: &ProcessOptions) -> Result<Processed> {
    options.validate()?;
    let mut canvas = canvas;

    if let Some(window) = options.trim_window() {
        canvas = timed("Masked outside window", || mask_outside(&canvas, &window));
    }

    if options.trim {
        let before = canvas.shape();
        canvas = timed("Trimmed", || trim(&canvas));
        debug!("Trim {:?} -> {:?}", before, canvas.shape());
    }

    let decimation = options.decimation_for(canvas.height(), canvas.width());
    if decimation > 1 {
        canvas = timed("Decimated", || decimate(&canvas, decimation))?;
        debug!("Decimated by {} to {:?}", decimation, canvas.shape());
    }

    if options.normalize {
        canvas = timed("Normalized", || normalize(&canvas))?;
    }

    log_stats(&canvas);
    Ok(Processed { canvas, decimation })
}

/// Quantize `canvas` and write it as a PNG, with an optional mask PNG.
///
/// `decimation` is the factor the canvas was already decimated by.
pub fn write_quantized(
    canvas: &Canvas<f32>,
    decimation: u32,
    image_path: &Path,
    mask_path: Option<&Path>,
) -> Result<Quantized> {
    let quantized = timed("Quantized", || quantize(canvas, decimation))?;
    timed("Wrote PNG", || write_png(image_path, &quantized.image))?;
    if let Some(mask_path) = mask_path {
        write_png(mask_path, &quantized.mask)?;
    }
    info!("Recommended scale factor: {}", quantized.scale_factor);
    Ok(quantized)
}

/// Log shape and coverage of a canvas.
pub fn log_stats(canvas: &Canvas<f32>) {
    let stats = CanvasStats::of(canvas);
    info!(
        "Canvas {}x{}: {} of {} cells present ({:.1} %)",
        stats.height,
        stats.width,
        stats.present,
        stats.total,
        stats.coverage_percent()
    );
}

fn timed<T>(label: &str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = f();
    info!("{} in {:.3}s", label, start.elapsed().as_secs_f64());
    out
}
