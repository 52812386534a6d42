//! terrain2stl - Generate 3D-printable STL terrain models from elevation tiles

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod geometry;
pub mod logging;
pub mod mesh;
pub mod terrain;

pub use domain::BoundingBox;
pub use error::{ExportError, TileFetchError};
pub use export::{ExportOptions, ExportRequest, TerrainExport, export_terrain};
