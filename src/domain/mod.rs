pub mod bbox;
pub mod tile;

pub use bbox::BoundingBox;
pub use tile::{TileCoord, TileRange};
