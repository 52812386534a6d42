pub mod elevation;
pub mod fetch;
pub mod raster;

pub use elevation::{bilinear_sample, decode_elevation};
pub use fetch::{Composite, FetchLimits, TileSource, fetch_composite};
pub use raster::{CompositeRaster, TileRaster};
