use crate::domain::{BoundingBox, TileRange};
use crate::geometry::tiles::{TILE_SIZE, latitude_to_pixel_y, longitude_to_pixel_x};

/// Web Mercator projection from WGS84 into the pixel space of a composite
/// raster whose top-left corner is the north-west corner of `range`.
///
/// Longitude maps linearly, latitude through the Mercator formula, both at
/// the zoom level the tiles were fetched at.
#[derive(Debug, Clone)]
pub struct RasterProjection {
    zoom: u8,
    origin_x: f64,
    origin_y: f64,
}

impl RasterProjection {
    pub fn new(range: &TileRange) -> Self {
        Self {
            zoom: range.zoom,
            origin_x: range.x_min as f64 * TILE_SIZE as f64,
            origin_y: range.y_min as f64 * TILE_SIZE as f64,
        }
    }

    /// Project a lon/lat point to fractional composite pixel coordinates
    ///
    /// # Returns
    /// * (x, y) in pixels, y growing southwards
    pub fn project(&self, lng: f64, lat: f64) -> (f64, f64) {
        let x = longitude_to_pixel_x(lng, self.zoom) - self.origin_x;
        let y = latitude_to_pixel_y(lat, self.zoom) - self.origin_y;
        (x, y)
    }

    /// Projected (width, height) of a bounding box in pixels
    pub fn projected_extent(&self, bbox: &BoundingBox) -> (f64, f64) {
        let (west_x, north_y) = self.project(bbox.west, bbox.north);
        let (east_x, south_y) = self.project(bbox.east, bbox.south);
        ((east_x - west_x).abs(), (south_y - north_y).abs())
    }

    /// Height over width of the box in Mercator space
    ///
    /// Raw degree spans would overstate height away from the equator.
    pub fn aspect_ratio(&self, bbox: &BoundingBox) -> f64 {
        let (width, height) = self.projected_extent(bbox);
        height / width
    }
}
