//! Slippy-map tile coordinate math
//!
//! Conversions between WGS84 degrees, tile indices and global pixel
//! coordinates in the spherical Web Mercator tiling scheme, where each zoom
//! level divides the world into a `2^zoom x 2^zoom` grid of 256px tiles.

use std::f64::consts::PI;

use crate::domain::{BoundingBox, TileRange};

/// Edge length of a tile in pixels
pub const TILE_SIZE: u32 = 256;

/// Highest zoom level the exporter will request
pub const MAX_ZOOM: u8 = 15;

/// Latitude limit of the Web Mercator projection
pub const MAX_LATITUDE: f64 = 85.05112878;

#[inline]
fn world_tiles(zoom: u8) -> f64 {
    2.0_f64.powi(zoom as i32)
}

#[inline]
fn mercator_y(lat: f64) -> f64 {
    let lat_rad = lat.to_radians();
    (1.0 - lat_rad.tan().asinh() / PI) / 2.0
}

#[inline]
fn clamp_index(value: f64, zoom: u8) -> u32 {
    let max = world_tiles(zoom) - 1.0;
    value.floor().clamp(0.0, max) as u32
}

/// Tile column containing `lon` at `zoom`
pub fn longitude_to_tile_x(lon: f64, zoom: u8) -> u32 {
    clamp_index((lon + 180.0) / 360.0 * world_tiles(zoom), zoom)
}

/// Tile row containing `lat` at `zoom` (row 0 is the northern edge)
pub fn latitude_to_tile_y(lat: f64, zoom: u8) -> u32 {
    clamp_index(mercator_y(lat) * world_tiles(zoom), zoom)
}

/// Longitude of the western edge of tile column `x`
pub fn tile_x_to_longitude(x: u32, zoom: u8) -> f64 {
    x as f64 / world_tiles(zoom) * 360.0 - 180.0
}

/// Latitude of the northern edge of tile row `y`
pub fn tile_y_to_latitude(y: u32, zoom: u8) -> f64 {
    let n = PI * (1.0 - 2.0 * y as f64 / world_tiles(zoom));
    n.sinh().atan().to_degrees()
}

/// Global fractional pixel column of `lon` at `zoom`
pub fn longitude_to_pixel_x(lon: f64, zoom: u8) -> f64 {
    (lon + 180.0) / 360.0 * world_tiles(zoom) * TILE_SIZE as f64
}

/// Global fractional pixel row of `lat` at `zoom`
pub fn latitude_to_pixel_y(lat: f64, zoom: u8) -> f64 {
    mercator_y(lat) * world_tiles(zoom) * TILE_SIZE as f64
}

/// Pick the smallest zoom whose pixel coverage of the box's width reaches
/// `target_pixels`, capped at [`MAX_ZOOM`] to bound the tile count.
pub fn choose_zoom_level(bbox: &BoundingBox, target_pixels: u32) -> u8 {
    let lon_fraction = bbox.lon_span() / 360.0;
    (0..=MAX_ZOOM)
        .find(|&zoom| covered_pixel_width(lon_fraction, zoom) >= target_pixels as f64)
        .unwrap_or(MAX_ZOOM)
}

fn covered_pixel_width(lon_fraction: f64, zoom: u8) -> f64 {
    TILE_SIZE as f64 * world_tiles(zoom) * lon_fraction
}

/// Tiles covering `bbox` at `zoom`
pub fn tile_range(bbox: &BoundingBox, zoom: u8) -> TileRange {
    TileRange {
        zoom,
        x_min: longitude_to_tile_x(bbox.west, zoom),
        x_max: longitude_to_tile_x(bbox.east, zoom),
        y_min: latitude_to_tile_y(bbox.north, zoom),
        y_max: latitude_to_tile_y(bbox.south, zoom),
    }
}
