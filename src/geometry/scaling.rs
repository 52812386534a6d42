use crate::domain::BoundingBox;

/// Meters per degree of longitude at the equator
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Converts zero-based elevation in meters to model height in mm
///
/// The horizontal scale is fixed by mapping the box's east-west ground
/// distance onto the model width; heights use the same mm-per-meter factor,
/// multiplied by the vertical exaggeration, then lifted by the base.
#[derive(Debug, Clone)]
pub struct ElevationScale {
    /// Scale factor: mm per meter
    mm_per_meter: f64,
    exaggeration: f64,
    base_mm: f64,
}

impl ElevationScale {
    pub fn new(bbox: &BoundingBox, model_width_mm: f64, exaggeration: f64, base_mm: f64) -> Self {
        let meters_per_degree = METERS_PER_DEGREE * bbox.center_lat().to_radians().cos();
        let width_m = bbox.lon_span() * meters_per_degree;
        let mm_per_meter = if width_m > 0.0 {
            model_width_mm / width_m
        } else {
            0.0
        };

        Self {
            mm_per_meter,
            exaggeration,
            base_mm,
        }
    }

    /// Height in mm of a sample `meters` above the lowest sample
    pub fn height_mm(&self, meters: f64) -> f32 {
        (meters * self.mm_per_meter * self.exaggeration + self.base_mm) as f32
    }

    /// Get the scale factor (mm per meter)
    pub fn scale_factor(&self) -> f64 {
        self.mm_per_meter
    }
}
