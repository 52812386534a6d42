use thiserror::Error;

/// Errors that abort a terrain export
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Invalid bounding box: {0}")]
    InvalidBoundingBox(String),

    #[error("Invalid resolution {resolution}: must be between 2 and {max}")]
    InvalidResolution { resolution: u32, max: u32 },

    #[error(
        "Area too large: {tiles} tiles needed (max {max}). Try a smaller area or a lower resolution"
    )]
    AreaTooLarge { tiles: usize, max: usize },

    #[error("Invalid mesh settings: {0}")]
    InvalidMeshConfig(String),

    #[error("Mesh too large: {width}x{height} vertices")]
    MeshTooLarge { width: usize, height: usize },

    #[error("STL serialization wrote {written} bytes into a {expected} byte buffer")]
    SerializationMismatch { expected: usize, written: usize },

    #[error("Invalid export request: {0}")]
    InvalidRequest(String),
}

/// Errors from fetching a single tile. Never fatal to an export.
#[derive(Debug, Error)]
pub enum TileFetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Tile server returned status {0}")]
    Status(u16),

    #[error("Failed to decode tile image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Tile is {width}x{height}, expected {expected}x{expected}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: u32,
    },

    #[error("Tile fetch did not finish before the deadline")]
    Deadline,
}

pub type Result<T, E = ExportError> = std::result::Result<T, E>;
