//! Concurrent tile fetch and compositing
//!
//! Every tile in the range is requested on its own thread; results come back
//! over a channel tagged with their slot so each lands in a disjoint region
//! of the composite. A tile that fails, decodes to the wrong size or misses
//! the deadline is replaced by a zeroed block instead of failing the export.

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::raster::{CompositeRaster, TileRaster};
use crate::config::limits;
use crate::domain::{TileCoord, TileRange};
use crate::error::{ExportError, Result, TileFetchError};
use crate::geometry::TILE_SIZE;

/// Anything that can produce a decoded elevation tile
pub trait TileSource: Send + Sync {
    fn fetch_tile(&self, tile: TileCoord) -> Result<TileRaster, TileFetchError>;
}

/// Admission limits for one fetch phase
#[derive(Debug, Clone)]
pub struct FetchLimits {
    /// Maximum tiles a single export may request
    pub max_tiles: usize,
    /// Wall-clock budget for all tiles together
    pub deadline: Duration,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            max_tiles: limits::MAX_TILES,
            deadline: Duration::from_secs(limits::FETCH_DEADLINE_SECS),
        }
    }
}

/// Composite raster plus bookkeeping about how it was assembled
#[derive(Debug)]
pub struct Composite {
    pub raster: CompositeRaster,
    pub range: TileRange,
    /// Tiles that were filled with zeros
    pub failed: Vec<TileCoord>,
}

/// Fetch every tile in `range` and stitch them into one raster.
///
/// Fails only with [`ExportError::AreaTooLarge`], checked before any request.
pub fn fetch_composite<S>(source: Arc<S>, range: TileRange, fetch_limits: &FetchLimits) -> Result<Composite>
where
    S: TileSource + ?Sized + 'static,
{
    let count = range.len();
    if count > fetch_limits.max_tiles {
        return Err(ExportError::AreaTooLarge {
            tiles: count,
            max: fetch_limits.max_tiles,
        });
    }

    debug!(
        zoom = range.zoom,
        tiles_x = range.tiles_x(),
        tiles_y = range.tiles_y(),
        "Fetching elevation tiles"
    );

    let tiles: Vec<TileCoord> = range.iter().collect();
    let mut results = collect_tiles(source, &tiles, fetch_limits.deadline);

    let size = TILE_SIZE as usize;
    let mut raster = CompositeRaster::new(range.tiles_x() * size, range.tiles_y() * size);
    let mut failed = Vec::new();

    for (slot, tile) in tiles.iter().enumerate() {
        let x_offset = (tile.x - range.x_min) as usize * size;
        let y_offset = (tile.y - range.y_min) as usize * size;

        let outcome = results[slot]
            .take()
            .unwrap_or_else(|| Err(TileFetchError::Deadline));
        match outcome {
            Ok(tile_raster) => raster.blit(&tile_raster, x_offset, y_offset),
            Err(e) => {
                warn!(
                    z = tile.zoom,
                    x = tile.x,
                    y = tile.y,
                    error = %e,
                    "Tile fetch failed, using flat tile"
                );
                raster.blit(&TileRaster::flat(), x_offset, y_offset);
                failed.push(*tile);
            }
        }
    }

    Ok(Composite {
        raster,
        range,
        failed,
    })
}

type TileResult = Result<TileRaster, TileFetchError>;

/// Run one worker per tile and gather results until all report or the
/// deadline passes. Slots left `None` never reported back.
fn collect_tiles<S>(source: Arc<S>, tiles: &[TileCoord], deadline: Duration) -> Vec<Option<TileResult>>
where
    S: TileSource + ?Sized + 'static,
{
    let mut results: Vec<Option<TileResult>> = (0..tiles.len()).map(|_| None).collect();
    let (tx, rx) = mpsc::channel::<(usize, TileResult)>();
    let mut pending = 0;

    for (slot, &tile) in tiles.iter().enumerate() {
        let tx = tx.clone();
        let source = Arc::clone(&source);
        let spawned = thread::Builder::new()
            .name(format!("tile-{}-{}-{}", tile.zoom, tile.x, tile.y))
            .spawn(move || {
                let result = source.fetch_tile(tile);
                // Receiver is gone once the deadline passed
                let _ = tx.send((slot, result));
            });

        match spawned {
            Ok(_) => pending += 1,
            Err(e) => warn!(x = tile.x, y = tile.y, error = %e, "Failed to spawn tile worker"),
        }
    }
    drop(tx);

    let until = Instant::now() + deadline;
    while pending > 0 {
        let remaining = until.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok((slot, result)) => {
                results[slot] = Some(result);
                pending -= 1;
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(pending, "Tile fetch deadline reached");
                break;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::elevation::encode_elevation;
    use image::{Rgb, RgbImage};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves flat tiles at a fixed elevation, failing the listed tiles
    struct MockSource {
        calls: AtomicUsize,
        failing: HashSet<(u32, u32)>,
        slow: HashSet<(u32, u32)>,
        meters: f64,
    }

    impl MockSource {
        fn new(meters: f64) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                failing: HashSet::new(),
                slow: HashSet::new(),
                meters,
            }
        }
    }

    impl TileSource for MockSource {
        fn fetch_tile(&self, tile: TileCoord) -> Result<TileRaster, TileFetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.contains(&(tile.x, tile.y)) {
                return Err(TileFetchError::Status(503));
            }
            if self.slow.contains(&(tile.x, tile.y)) {
                thread::sleep(Duration::from_secs(2));
            }
            let image = RgbImage::from_pixel(TILE_SIZE, TILE_SIZE, Rgb(encode_elevation(self.meters)));
            TileRaster::from_image(image)
        }
    }

    fn range_2x2() -> TileRange {
        TileRange {
            zoom: 12,
            x_min: 2047,
            x_max: 2048,
            y_min: 2047,
            y_max: 2048,
        }
    }

    #[test]
    fn test_composite_dimensions() {
        let source = Arc::new(MockSource::new(100.0));
        let composite = fetch_composite(source.clone(), range_2x2(), &FetchLimits::default()).unwrap();

        assert_eq!(composite.raster.width(), 512);
        assert_eq!(composite.raster.height(), 512);
        assert!(composite.failed.is_empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), 4);
        assert_eq!(composite.raster.elevation_at(400, 400), 100.0);
    }

    #[test]
    fn test_failed_tile_is_zeroed() {
        let mut source = MockSource::new(100.0);
        source.failing.insert((2048, 2047));
        let composite = fetch_composite(Arc::new(source), range_2x2(), &FetchLimits::default()).unwrap();

        assert_eq!(composite.raster.width(), 512);
        assert_eq!(composite.raster.height(), 512);
        assert_eq!(composite.failed, vec![TileCoord::new(12, 2048, 2047)]);

        // Failed tile is the north-east quadrant
        for (x, y) in [(256, 0), (511, 255), (300, 100)] {
            assert_eq!(composite.raster.pixel(x, y), [0, 0, 0]);
        }
        // Neighbours are untouched
        assert_eq!(composite.raster.elevation_at(255, 0), 100.0);
        assert_eq!(composite.raster.elevation_at(256, 256), 100.0);
    }

    #[test]
    fn test_area_guard_before_fetch() {
        let source = Arc::new(MockSource::new(0.0));
        let range = TileRange {
            zoom: 10,
            x_min: 0,
            x_max: 6,
            y_min: 0,
            y_max: 2,
        };
        let result = fetch_composite(source.clone(), range, &FetchLimits::default());

        assert!(matches!(
            result,
            Err(ExportError::AreaTooLarge { tiles: 21, max: 20 })
        ));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_deadline_fills_late_tiles() {
        let mut source = MockSource::new(50.0);
        source.slow.insert((2047, 2048));
        let limits = FetchLimits {
            max_tiles: 20,
            deadline: Duration::from_millis(300),
        };
        let composite = fetch_composite(Arc::new(source), range_2x2(), &limits).unwrap();

        assert_eq!(composite.failed, vec![TileCoord::new(12, 2047, 2048)]);
        assert_eq!(composite.raster.pixel(10, 300), [0, 0, 0]);
        assert_eq!(composite.raster.elevation_at(300, 300), 50.0);
    }
}
