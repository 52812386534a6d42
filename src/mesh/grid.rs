use tracing::debug;

use crate::config::limits;
use crate::domain::BoundingBox;
use crate::error::{ExportError, Result};
use crate::geometry::{ElevationScale, RasterProjection};
use crate::terrain::{CompositeRaster, bilinear_sample};

/// Configuration for sampling the terrain into a vertex grid
#[derive(Debug, Clone)]
pub struct MeshConfig {
    /// Vertices along the west-east edge
    pub resolution: u32,
    /// Model extent along x in mm
    pub model_width_mm: f64,
    /// Multiplier applied to true-scale heights
    pub vertical_exaggeration: f64,
    /// Solid floor added under the lowest sample, in mm
    pub base_thickness_mm: f64,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            resolution: limits::DEFAULT_RESOLUTION,
            model_width_mm: limits::MODEL_WIDTH_MM,
            vertical_exaggeration: limits::VERTICAL_EXAGGERATION,
            base_thickness_mm: limits::BASE_THICKNESS_MM,
        }
    }
}

impl MeshConfig {
    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_exaggeration(mut self, exaggeration: f64) -> Self {
        self.vertical_exaggeration = exaggeration;
        self
    }

    pub fn with_base_thickness(mut self, base_mm: f64) -> Self {
        self.base_thickness_mm = base_mm;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(2..=limits::MAX_RESOLUTION).contains(&self.resolution) {
            return Err(ExportError::InvalidResolution {
                resolution: self.resolution,
                max: limits::MAX_RESOLUTION,
            });
        }
        if !self.model_width_mm.is_finite() || self.model_width_mm <= 0.0 {
            return Err(ExportError::InvalidMeshConfig(format!(
                "model width must be positive, got {}mm",
                self.model_width_mm
            )));
        }
        if !self.vertical_exaggeration.is_finite() || self.vertical_exaggeration <= 0.0 {
            return Err(ExportError::InvalidMeshConfig(format!(
                "exaggeration must be positive, got {}",
                self.vertical_exaggeration
            )));
        }
        // Zero or less leaves the lowest samples on the build plate and collapses the walls
        if !self.base_thickness_mm.is_finite() || self.base_thickness_mm <= 0.0 {
            return Err(ExportError::InvalidMeshConfig(format!(
                "base thickness must be positive, got {}mm",
                self.base_thickness_mm
            )));
        }
        Ok(())
    }
}

/// Row-major grid of model-space vertices in mm.
///
/// Row 0 is the southern edge, so north maps to increasing y and east to
/// increasing x.
#[derive(Debug, Clone)]
pub struct VertexGrid {
    width: usize,
    height: usize,
    vertices: Vec<[f32; 3]>,
    aspect_ratio: f64,
}

impl VertexGrid {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    pub fn vertices(&self) -> &[[f32; 3]] {
        &self.vertices
    }

    /// Vertex at column `i`, row `j`
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> [f32; 3] {
        self.vertices[j * self.width + i]
    }
}

/// Sample the composite raster on a regular lat/lon grid.
///
/// The grid is `resolution` vertices wide and as tall as the box's Mercator
/// aspect ratio dictates. Heights are zero-based on the lowest sample, then
/// scaled to mm, exaggerated and lifted by the base thickness.
pub fn generate_vertex_grid(
    raster: &CompositeRaster,
    projection: &RasterProjection,
    bbox: &BoundingBox,
    config: &MeshConfig,
) -> Result<VertexGrid> {
    config.validate()?;

    let aspect_ratio = projection.aspect_ratio(bbox);
    if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
        return Err(ExportError::InvalidBoundingBox(format!(
            "projected aspect ratio is {}",
            aspect_ratio
        )));
    }

    let width = config.resolution as usize;
    let height = ((config.resolution as f64 * aspect_ratio).round() as usize).max(2);
    if width * height > limits::MAX_MESH_VERTICES {
        return Err(ExportError::MeshTooLarge { width, height });
    }

    debug!(width, height, aspect_ratio, "Sampling vertex grid");

    let mut elevations = Vec::with_capacity(width * height);
    let mut min_elevation = f64::INFINITY;

    for j in 0..height {
        let t = j as f64 / (height - 1) as f64;
        let lat = bbox.south + t * bbox.lat_span();
        for i in 0..width {
            let s = i as f64 / (width - 1) as f64;
            let lng = bbox.west + s * bbox.lon_span();

            let (px, py) = projection.project(lng, lat);
            let elevation = bilinear_sample(raster, px, py);
            min_elevation = min_elevation.min(elevation);
            elevations.push(elevation);
        }
    }

    let scale = ElevationScale::new(
        bbox,
        config.model_width_mm,
        config.vertical_exaggeration,
        config.base_thickness_mm,
    );
    let x_step = config.model_width_mm / (width - 1) as f64;
    let y_step = config.model_width_mm * aspect_ratio / (height - 1) as f64;

    let vertices = elevations
        .iter()
        .enumerate()
        .map(|(idx, &elevation)| {
            let i = idx % width;
            let j = idx / width;
            [
                (i as f64 * x_step) as f32,
                (j as f64 * y_step) as f32,
                scale.height_mm(elevation - min_elevation),
            ]
        })
        .collect();

    Ok(VertexGrid {
        width,
        height,
        vertices,
        aspect_ratio,
    })
}

#[cfg(test)]
pub(crate) fn grid_from_heights(
    width: usize,
    height: usize,
    spacing: f32,
    z: impl Fn(usize, usize) -> f32,
) -> VertexGrid {
    let vertices = (0..height)
        .flat_map(|j| (0..width).map(move |i| (i, j)))
        .map(|(i, j)| [i as f32 * spacing, j as f32 * spacing, z(i, j)])
        .collect();
    VertexGrid {
        width,
        height,
        vertices,
        aspect_ratio: (height - 1) as f64 / (width - 1) as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::tile_range;
    use crate::terrain::elevation::encode_elevation;

    fn equator_setup() -> (BoundingBox, RasterProjection, CompositeRaster) {
        let bbox = BoundingBox::new(-0.01, -0.01, 0.01, 0.01);
        let range = tile_range(&bbox, 12);
        let projection = RasterProjection::new(&range);
        let raster = CompositeRaster::new(512, 512);
        (bbox, projection, raster)
    }

    #[test]
    fn test_flat_grid_sits_on_base() {
        let (bbox, projection, raster) = equator_setup();
        let config = MeshConfig::default().with_resolution(16).with_base_thickness(3.0);
        let grid = generate_vertex_grid(&raster, &projection, &bbox, &config).unwrap();

        assert_eq!(grid.width(), 16);
        assert_eq!(grid.height(), 16);
        assert!(grid.vertices().iter().all(|v| (v[2] - 3.0).abs() < 1e-6));
    }

    #[test]
    fn test_extents_and_orientation() {
        let (bbox, projection, raster) = equator_setup();
        let config = MeshConfig::default().with_resolution(32);
        let grid = generate_vertex_grid(&raster, &projection, &bbox, &config).unwrap();

        let sw = grid.get(0, 0);
        let ne = grid.get(grid.width() - 1, grid.height() - 1);
        assert_eq!(sw[0], 0.0);
        assert_eq!(sw[1], 0.0);
        assert!((ne[0] - 100.0).abs() < 1e-4);
        assert!((ne[1] as f64 - 100.0 * grid.aspect_ratio()).abs() < 1e-3);
    }

    #[test]
    fn test_north_is_positive_y() {
        // Raise the northern half of the raster (rows above the equator)
        let (bbox, projection, mut raster) = equator_setup();
        for y in 0..256 {
            for x in 0..512 {
                raster.set_pixel(x, y, encode_elevation(100.0));
            }
        }
        for y in 256..512 {
            for x in 0..512 {
                raster.set_pixel(x, y, encode_elevation(0.0));
            }
        }

        let config = MeshConfig::default().with_resolution(8).with_base_thickness(1.0);
        let grid = generate_vertex_grid(&raster, &projection, &bbox, &config).unwrap();

        let south = grid.get(3, 0);
        let north = grid.get(3, grid.height() - 1);
        assert!((south[2] - 1.0).abs() < 1e-6);
        assert!(north[2] > south[2]);

        // 100m * (100mm / 2226m) * 1.5 above the base
        let expected = 100.0 * (100.0 / (0.02 * 111_320.0)) * 1.5 + 1.0;
        assert!((north[2] as f64 - expected).abs() < 1e-3);
    }

    #[test]
    fn test_tall_box_gets_more_rows() {
        let bbox = BoundingBox::new(10.0, 45.0, 10.01, 45.03);
        let range = tile_range(&bbox, 13);
        let projection = RasterProjection::new(&range);
        let raster = CompositeRaster::new(range.tiles_x() * 256, range.tiles_y() * 256);
        let config = MeshConfig::default().with_resolution(20);
        let grid = generate_vertex_grid(&raster, &projection, &bbox, &config).unwrap();

        assert_eq!(grid.width(), 20);
        // 3x taller in degrees, stretched further by Mercator at 45°
        assert!(grid.height() > 60);
        assert!(grid.aspect_ratio() > 3.0);
    }

    #[test]
    fn test_resolution_bounds() {
        let (bbox, projection, raster) = equator_setup();
        for resolution in [0, 1, limits::MAX_RESOLUTION + 1] {
            let config = MeshConfig::default().with_resolution(resolution);
            assert!(matches!(
                generate_vertex_grid(&raster, &projection, &bbox, &config),
                Err(ExportError::InvalidResolution { .. })
            ));
        }
    }

    #[test]
    fn test_base_thickness_must_be_positive() {
        let (bbox, projection, raster) = equator_setup();
        for base in [-3.0, 0.0, f64::NAN, f64::INFINITY] {
            let config = MeshConfig::default().with_resolution(4).with_base_thickness(base);
            assert!(matches!(
                config.validate(),
                Err(ExportError::InvalidMeshConfig(_))
            ));
            assert!(generate_vertex_grid(&raster, &projection, &bbox, &config).is_err());
        }
    }

    #[test]
    fn test_exaggeration_must_be_positive() {
        for exaggeration in [f64::NAN, f64::NEG_INFINITY, 0.0, -1.5] {
            let config = MeshConfig::default().with_exaggeration(exaggeration);
            assert!(matches!(
                config.validate(),
                Err(ExportError::InvalidMeshConfig(_))
            ));
        }
        assert!(MeshConfig::default().with_exaggeration(0.25).validate().is_ok());
    }

    #[test]
    fn test_valid_grid_has_no_inward_walls() {
        // Every vertex above the plate keeps walls and base facing outward
        let (bbox, projection, raster) = equator_setup();
        let config = MeshConfig::default().with_resolution(4).with_base_thickness(0.5);
        let grid = generate_vertex_grid(&raster, &projection, &bbox, &config).unwrap();

        let mut inward = 0;
        crate::mesh::stl::for_each_triangle(&grid, |face, tri| {
            let o = face.outward();
            let d = tri.normal[0] * o[0] + tri.normal[1] * o[1] + tri.normal[2] * o[2];
            if d <= 0.0 {
                inward += 1;
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(inward, 0);
    }

    #[test]
    fn test_mesh_too_large() {
        // 1:4 aspect at full resolution exceeds the vertex cap
        let bbox = BoundingBox::new(0.0, 0.0, 0.01, 0.04);
        let range = tile_range(&bbox, 12);
        let projection = RasterProjection::new(&range);
        let raster = CompositeRaster::new(range.tiles_x() * 256, range.tiles_y() * 256);
        let config = MeshConfig::default().with_resolution(limits::MAX_RESOLUTION);

        assert!(matches!(
            generate_vertex_grid(&raster, &projection, &bbox, &config),
            Err(ExportError::MeshTooLarge { .. })
        ));
    }
}
