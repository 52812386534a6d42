//! End-to-end terrain export: bounding box in, binary STL out

use std::sync::Arc;
use std::time::Instant;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::domain::{BoundingBox, TileCoord, TileRange};
use crate::error::{ExportError, Result};
use crate::geometry::{RasterProjection, choose_zoom_level, tile_range};
use crate::mesh::stl::DEFAULT_HEADER;
use crate::mesh::{MeshConfig, generate_vertex_grid, serialize_terrain, triangle_count};
use crate::terrain::{FetchLimits, TileSource, fetch_composite};

/// Everything one export needs to know. Immutable per invocation.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub bounds: BoundingBox,
    pub mesh: MeshConfig,
    /// Text written into the 80-byte STL header
    pub header: String,
}

impl ExportOptions {
    pub fn new(bounds: BoundingBox) -> Self {
        Self {
            bounds,
            mesh: MeshConfig::default(),
            header: DEFAULT_HEADER.to_string(),
        }
    }

    pub fn with_mesh(mut self, mesh: MeshConfig) -> Self {
        self.mesh = mesh;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.bounds.validate()?;
        self.mesh.validate()
    }
}

/// JSON request body: `{ "bounds": [w, s, e, n], "resolution"?, "minHeight"? }`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub bounds: [f64; 4],
    #[serde(default)]
    pub resolution: Option<u32>,
    /// Base thickness in mm
    #[serde(default)]
    pub min_height: Option<f64>,
    #[serde(default)]
    pub exaggeration: Option<f64>,
}

impl ExportRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ExportError::InvalidRequest(e.to_string()))
    }

    pub fn into_options(self) -> ExportOptions {
        let mut mesh = MeshConfig::default();
        if let Some(resolution) = self.resolution {
            mesh = mesh.with_resolution(resolution);
        }
        if let Some(base) = self.min_height {
            mesh = mesh.with_base_thickness(base);
        }
        if let Some(exaggeration) = self.exaggeration {
            mesh = mesh.with_exaggeration(exaggeration);
        }
        ExportOptions::new(BoundingBox::from_array(self.bounds)).with_mesh(mesh)
    }
}

/// Result of a successful export
#[derive(Debug)]
pub struct TerrainExport {
    /// Complete binary STL file
    pub stl: Vec<u8>,
    pub range: TileRange,
    /// Tiles that could not be fetched and were flattened
    pub failed_tiles: Vec<TileCoord>,
    pub mesh_width: usize,
    pub mesh_height: usize,
    pub triangles: usize,
}

impl TerrainExport {
    pub fn zoom(&self) -> u8 {
        self.range.zoom
    }
}

/// Run the whole pipeline for one bounding box.
///
/// Network failures on individual tiles never fail the export; only invalid
/// input, the tile-count guard and the mesh-size guard do.
pub fn export_terrain<S>(
    options: &ExportOptions,
    source: Arc<S>,
    fetch_limits: &FetchLimits,
) -> Result<TerrainExport>
where
    S: TileSource + ?Sized + 'static,
{
    options.validate()?;
    let bbox = &options.bounds;

    let zoom = choose_zoom_level(bbox, options.mesh.resolution);
    let range = tile_range(bbox, zoom);
    info!(zoom, tiles = range.len(), "Selected tile range");

    let start = Instant::now();
    let composite = fetch_composite(source, range, fetch_limits)?;
    if !composite.failed.is_empty() {
        warn!(
            failed = composite.failed.len(),
            total = range.len(),
            "Some tiles were replaced with flat terrain"
        );
    }
    debug!(elapsed_ms = start.elapsed().as_millis() as u64, "Composite ready");

    let projection = RasterProjection::new(&range);
    let grid = generate_vertex_grid(&composite.raster, &projection, bbox, &options.mesh)?;

    let stl = serialize_terrain(&grid, &options.header)?;
    let triangles = triangle_count(grid.width(), grid.height());
    info!(
        width = grid.width(),
        height = grid.height(),
        triangles,
        bytes = stl.len(),
        "Serialized terrain"
    );

    Ok(TerrainExport {
        stl,
        range,
        failed_tiles: composite.failed,
        mesh_width: grid.width(),
        mesh_height: grid.height(),
        triangles,
    })
}
