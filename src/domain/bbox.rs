use crate::error::{ExportError, Result};
use crate::geometry::tiles::MAX_LATITUDE;

/// Geographic bounding box in WGS84 degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Build from the `[west, south, east, north]` order used by export requests
    pub fn from_array(bounds: [f64; 4]) -> Self {
        let [west, south, east, north] = bounds;
        Self::new(west, south, east, north)
    }

    /// Reject boxes that would produce NaN/Inf geometry further down the pipeline.
    ///
    /// Requires finite values, `west < east`, `south < north`, longitudes within
    /// [-180, 180] and latitudes inside the Web Mercator range.
    pub fn validate(&self) -> Result<()> {
        let values = [self.west, self.south, self.east, self.north];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ExportError::InvalidBoundingBox(format!(
                "non-finite coordinate in {:?}",
                values
            )));
        }
        if self.west >= self.east {
            return Err(ExportError::InvalidBoundingBox(format!(
                "west ({}) must be less than east ({})",
                self.west, self.east
            )));
        }
        if self.south >= self.north {
            return Err(ExportError::InvalidBoundingBox(format!(
                "south ({}) must be less than north ({})",
                self.south, self.north
            )));
        }
        if self.west < -180.0 || self.east > 180.0 {
            return Err(ExportError::InvalidBoundingBox(format!(
                "longitudes must be within [-180, 180], got {}..{}",
                self.west, self.east
            )));
        }
        if self.south < -MAX_LATITUDE || self.north > MAX_LATITUDE {
            return Err(ExportError::InvalidBoundingBox(format!(
                "latitudes must be within ±{:.4}, got {}..{}",
                MAX_LATITUDE, self.south, self.north
            )));
        }
        Ok(())
    }

    pub fn lon_span(&self) -> f64 {
        self.east - self.west
    }

    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    pub fn center_lat(&self) -> f64 {
        (self.south + self.north) / 2.0
    }

    pub fn center_lon(&self) -> f64 {
        (self.west + self.east) / 2.0
    }
}
