pub mod projection;
pub mod scaling;
pub mod tiles;

pub use projection::RasterProjection;
pub use scaling::ElevationScale;
pub use tiles::{TILE_SIZE, choose_zoom_level, tile_range};
