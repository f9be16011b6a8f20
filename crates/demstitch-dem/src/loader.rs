//! Validating tile loader.
//!
//! Turns a list of tile paths into [`TileFrame`]s ready for compositing.
//! Every tile is checked against [`LoadOptions`]; what happens to a tile that
//! fails is decided by [`LoadMode`].

use crate::{DemError, GeoTiffSource, Result, SourceTile, TileSource};
use demstitch_raster::{NoDataRule, RasterError, TileFrame, ValidationError, DEFAULT_NODATA_THRESHOLD};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// File extensions picked up when indexing a directory.
const TILE_EXTENSIONS: &[&str] = &["tif", "tiff"];

/// What to do with a tile that fails to load or validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    /// Abort on the first bad tile.
    #[default]
    Strict,
    /// Log a warning, skip the tile and continue.
    Lenient,
}

/// Which pixel pitches are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PitchPolicy {
    /// Every tile must have a pitch of exactly 1 unit.
    #[default]
    Unit,
    /// Any pitch, as long as all tiles share the first tile's pitch.
    Uniform,
}

/// How missing samples are recognised.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoDataPolicy {
    /// Use the sentinel declared by the file, falling back to the default
    /// threshold when none is declared.
    #[default]
    Declared,
    /// Samples below this threshold are missing.
    Below(f32),
    /// Samples equal to this sentinel are missing.
    Sentinel(f32),
    /// Only NaN samples are missing.
    None,
}

impl NoDataPolicy {
    /// The concrete rule to apply to a tile declaring `declared`.
    pub fn rule_for(&self, declared: Option<f32>) -> NoDataRule {
        match *self {
            NoDataPolicy::Declared => declared
                .map(NoDataRule::Sentinel)
                .unwrap_or(NoDataRule::Below(DEFAULT_NODATA_THRESHOLD)),
            NoDataPolicy::Below(t) => NoDataRule::Below(t),
            NoDataPolicy::Sentinel(v) => NoDataRule::Sentinel(v),
            NoDataPolicy::None => NoDataRule::None,
        }
    }
}

/// Tile acceptance rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Strict or lenient handling of bad tiles.
    pub mode: LoadMode,
    /// Required `[width, height]`, if any.
    pub expected_size: Option<[u32; 2]>,
    /// Reject tiles with no elevation data at all.
    pub drop_empty: bool,
    /// Required EPSG code, if any.
    pub expected_epsg: Option<u16>,
    /// Accepted pixel pitches.
    pub pitch: PitchPolicy,
    /// Missing-sample recognition.
    pub nodata: NoDataPolicy,
    /// Multiply elevations by the pixel pitch after loading.
    pub rescale_by_pitch: bool,
    /// Read tiles on the rayon thread pool.
    pub parallel: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            mode: LoadMode::Strict,
            expected_size: None,
            drop_empty: false,
            expected_epsg: None,
            pitch: PitchPolicy::Unit,
            nodata: NoDataPolicy::Declared,
            rescale_by_pitch: false,
            parallel: true,
        }
    }
}

/// Loads and validates tiles from a [`TileSource`].
///
/// # Example
///
/// ```no_run
/// use demstitch_dem::{LoadMode, LoadOptions, TileLoader};
///
/// let options = LoadOptions {
///     mode: LoadMode::Lenient,
///     expected_size: Some([1500, 1500]),
///     drop_empty: true,
///     ..LoadOptions::default()
/// };
/// let loader = TileLoader::geotiff(options);
/// let tiles = loader.load_directory("dems")?;
/// println!("{} tiles ready", tiles.len());
/// # Ok::<(), demstitch_dem::DemError>(())
/// ```
#[derive(Debug, Clone)]
pub struct TileLoader<S = GeoTiffSource> {
    source: S,
    options: LoadOptions,
}

impl TileLoader<GeoTiffSource> {
    /// Create a loader reading GeoTIFF files.
    pub fn geotiff(options: LoadOptions) -> Self {
        Self::new(GeoTiffSource::new(), options)
    }
}

impl<S: TileSource> TileLoader<S> {
    /// Create a loader over an arbitrary source.
    pub fn new(source: S, options: LoadOptions) -> Self {
        Self { source, options }
    }

    /// The options in effect.
    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Load every tile file found directly inside `dir`, in file name order.
    pub fn load_directory<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<TileFrame>> {
        let paths = tile_paths_in(dir)?;
        self.load_all(&paths)
    }

    /// Load and validate tiles, keeping input order.
    ///
    /// In strict mode the first failure is returned. In lenient mode failed
    /// tiles are logged and skipped. Fails with [`RasterError::EmptyInput`]
    /// if no tile survives.
    pub fn load_all<P: AsRef<Path> + Sync>(&self, paths: &[P]) -> Result<Vec<TileFrame>> {
        info!("Loading {} tiles...", paths.len());
        let start = Instant::now();

        // Collecting a parallel iterator preserves input order.
        let results: Vec<Result<TileFrame>> = if self.options.parallel {
            paths.par_iter().map(|p| self.load_one(p.as_ref())).collect()
        } else {
            paths.iter().map(|p| self.load_one(p.as_ref())).collect()
        };

        let mut tiles: Vec<TileFrame> = Vec::with_capacity(results.len());
        let mut reference_pitch: Option<f64> = None;

        for (path, result) in paths.iter().zip(results) {
            let path = path.as_ref();
            let checked = result.and_then(|tile| {
                let pitch = *reference_pitch.get_or_insert(tile.pitch());
                if tile.pitch() != pitch {
                    return Err(DemError::rejected(
                        path,
                        ValidationError::UnexpectedPitch {
                            expected: pitch,
                            actual: tile.pitch(),
                        },
                    ));
                }
                Ok(tile)
            });

            match checked {
                Ok(tile) => tiles.push(tile),
                Err(e) => match self.options.mode {
                    LoadMode::Strict => return Err(e),
                    LoadMode::Lenient => warn!("Skipping tile {}: {}", path.display(), e),
                },
            }
        }

        if tiles.is_empty() {
            return Err(RasterError::EmptyInput.into());
        }

        info!(
            "Loaded {} of {} tiles in {:.3}s",
            tiles.len(),
            paths.len(),
            start.elapsed().as_secs_f64()
        );
        Ok(tiles)
    }

    /// Load and validate a single tile.
    pub fn load_one(&self, path: &Path) -> Result<TileFrame> {
        debug!("Loading {}", path.display());
        let tile = self.source.open(path)?;
        self.validate(tile).map_err(|e| e.with_path(path))
    }

    fn validate(&self, tile: SourceTile) -> Result<TileFrame> {
        let opts = &self.options;

        if tile.band_count != 1 {
            return Err(RasterError::from(ValidationError::BandCount(tile.band_count)).into());
        }

        if let Some(expected) = opts.expected_epsg {
            if tile.epsg != Some(expected) {
                return Err(RasterError::from(ValidationError::Projection {
                    expected,
                    actual: tile.epsg,
                })
                .into());
            }
        }

        if let Some([expected_width, expected_height]) = opts.expected_size {
            if tile.raw.width != expected_width || tile.raw.height != expected_height {
                return Err(RasterError::from(ValidationError::UnexpectedSize {
                    width: tile.raw.width,
                    height: tile.raw.height,
                    expected_width,
                    expected_height,
                })
                .into());
            }
        }

        let rule = opts.nodata.rule_for(tile.raw.declared_nodata);
        let mut frame = TileFrame::from_raw(tile.raw, rule)?;

        match opts.pitch {
            PitchPolicy::Unit => frame.require_pitch(1.0)?,
            PitchPolicy::Uniform => frame.transform().require_square_pixels()?,
        }

        if opts.drop_empty && frame.is_all_missing() {
            return Err(RasterError::from(ValidationError::AllMissing).into());
        }

        if opts.rescale_by_pitch {
            frame = frame.rescale_by_pitch()?;
        }

        Ok(frame)
    }
}

/// Tile files directly inside `dir`, sorted by path.
pub fn tile_paths_in<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        let is_tile = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| TILE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        if is_tile {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use demstitch_raster::{GeoTransform, RawTile};
    use std::collections::HashMap;

    /// In-memory source keyed by path.
    struct MemorySource {
        tiles: HashMap<PathBuf, SourceTile>,
    }

    impl MemorySource {
        fn new(entries: Vec<(&str, SourceTile)>) -> Self {
            Self {
                tiles: entries
                    .into_iter()
                    .map(|(p, t)| (PathBuf::from(p), t))
                    .collect(),
            }
        }
    }

    impl TileSource for MemorySource {
        fn open(&self, path: &Path) -> Result<SourceTile> {
            self.tiles.get(path).cloned().ok_or_else(|| {
                DemError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    path.display().to_string(),
                ))
            })
        }
    }

    fn source_tile(x: f64, pitch: f64, samples: Vec<f32>) -> SourceTile {
        SourceTile {
            raw: RawTile {
                transform: GeoTransform::north_up(x, 2.0 * pitch, pitch).unwrap(),
                width: 2,
                height: 2,
                samples,
                declared_nodata: Some(-9999.0),
            },
            band_count: 1,
            epsg: Some(26912),
        }
    }

    fn loader(entries: Vec<(&str, SourceTile)>, options: LoadOptions) -> TileLoader<MemorySource> {
        TileLoader::new(MemorySource::new(entries), options)
    }

    #[test]
    fn test_declared_sentinel_applied() {
        let l = loader(
            vec![("a.tif", source_tile(0.0, 1.0, vec![1.0, -9999.0, 3.0, 4.0]))],
            LoadOptions::default(),
        );
        let tiles = l.load_all(&["a.tif"]).unwrap();
        assert_eq!(tiles[0].present_count(), 3);
    }

    #[test]
    fn test_strict_mode_aborts() {
        let mut bad = source_tile(2.0, 1.0, vec![0.0; 4]);
        bad.band_count = 3;
        let l = loader(
            vec![("a.tif", source_tile(0.0, 1.0, vec![0.0; 4])), ("b.tif", bad)],
            LoadOptions::default(),
        );
        let err = l.load_all(&["a.tif", "b.tif"]).unwrap_err();
        match err {
            DemError::Rejected { path, source } => {
                assert_eq!(path, PathBuf::from("b.tif"));
                assert_eq!(source, ValidationError::BandCount(3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_lenient_mode_skips_bad_tiles_in_order() {
        let options = LoadOptions {
            mode: LoadMode::Lenient,
            expected_size: Some([2, 2]),
            drop_empty: true,
            ..LoadOptions::default()
        };
        let mut wrong_size = source_tile(4.0, 1.0, vec![0.0; 6]);
        wrong_size.raw.width = 3;
        let l = loader(
            vec![
                ("a.tif", source_tile(0.0, 1.0, vec![1.0; 4])),
                ("b.tif", wrong_size),
                ("c.tif", source_tile(2.0, 1.0, vec![-9999.0; 4])),
                ("d.tif", source_tile(6.0, 1.0, vec![2.0; 4])),
            ],
            options,
        );
        let tiles = l
            .load_all(&["a.tif", "b.tif", "c.tif", "missing.tif", "d.tif"])
            .unwrap();
        assert_eq!(tiles.len(), 2);
        assert_eq!(tiles[0].transform().origin_x, 0.0);
        assert_eq!(tiles[1].transform().origin_x, 6.0);
    }

    #[test]
    fn test_everything_rejected_is_empty_input() {
        let options = LoadOptions {
            mode: LoadMode::Lenient,
            drop_empty: true,
            ..LoadOptions::default()
        };
        let l = loader(
            vec![("a.tif", source_tile(0.0, 1.0, vec![-9999.0; 4]))],
            options,
        );
        assert!(matches!(
            l.load_all(&["a.tif"]),
            Err(DemError::Raster(RasterError::EmptyInput))
        ));
    }

    #[test]
    fn test_projection_check() {
        let options = LoadOptions {
            expected_epsg: Some(32612),
            ..LoadOptions::default()
        };
        let l = loader(vec![("a.tif", source_tile(0.0, 1.0, vec![0.0; 4]))], options);
        assert!(matches!(
            l.load_all(&["a.tif"]),
            Err(DemError::Rejected {
                source: ValidationError::Projection { expected: 32612, .. },
                ..
            })
        ));
    }

    #[test]
    fn test_unit_pitch_policy() {
        let l = loader(
            vec![("a.tif", source_tile(0.0, 2.0, vec![0.0; 4]))],
            LoadOptions::default(),
        );
        assert!(matches!(
            l.load_all(&["a.tif"]),
            Err(DemError::Rejected {
                source: ValidationError::UnexpectedPitch { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_uniform_pitch_policy_rejects_mixed() {
        let options = LoadOptions {
            pitch: PitchPolicy::Uniform,
            mode: LoadMode::Lenient,
            parallel: false,
            ..LoadOptions::default()
        };
        let l = loader(
            vec![
                ("a.tif", source_tile(0.0, 2.0, vec![0.0; 4])),
                ("b.tif", source_tile(4.0, 3.0, vec![0.0; 4])),
                ("c.tif", source_tile(8.0, 2.0, vec![0.0; 4])),
            ],
            options,
        );
        let tiles = l.load_all(&["a.tif", "b.tif", "c.tif"]).unwrap();
        assert_eq!(tiles.len(), 2);
        assert!(tiles.iter().all(|t| t.pitch() == 2.0));
    }

    #[test]
    fn test_uniform_pitch_with_offset_origins_assembles() {
        let options = LoadOptions {
            pitch: PitchPolicy::Uniform,
            ..LoadOptions::default()
        };
        let l = loader(
            vec![
                ("a.tif", source_tile(500015.0, 30.0, vec![1.0; 4])),
                ("b.tif", source_tile(500075.0, 30.0, vec![2.0; 4])),
            ],
            options,
        );
        let tiles = l.load_all(&["a.tif", "b.tif"]).unwrap();
        let extent = demstitch_raster::compute_extent(&tiles).unwrap();
        assert_eq!((extent.width(), extent.height()), (4, 2));
        let canvas = demstitch_raster::assemble(&tiles, &extent).unwrap();
        assert_eq!(canvas.as_slice(), &[1.0, 1.0, 2.0, 2.0, 1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_rescale_by_pitch() {
        let options = LoadOptions {
            pitch: PitchPolicy::Uniform,
            rescale_by_pitch: true,
            ..LoadOptions::default()
        };
        let l = loader(vec![("a.tif", source_tile(0.0, 2.0, vec![1.0; 4]))], options);
        let tiles = l.load_all(&["a.tif"]).unwrap();
        assert_eq!(tiles[0].samples().get(0, 0), Some(2.0));
    }

    #[test]
    fn test_nodata_policy_rules() {
        assert_eq!(
            NoDataPolicy::Declared.rule_for(Some(-1.0)),
            NoDataRule::Sentinel(-1.0)
        );
        assert_eq!(
            NoDataPolicy::Declared.rule_for(None),
            NoDataRule::Below(DEFAULT_NODATA_THRESHOLD)
        );
        assert_eq!(NoDataPolicy::Below(0.0).rule_for(Some(-1.0)), NoDataRule::Below(0.0));
        assert_eq!(NoDataPolicy::None.rule_for(Some(-1.0)), NoDataRule::None);
    }
}
