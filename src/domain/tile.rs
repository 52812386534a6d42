/// A slippy-map tile at a given zoom level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }
}

/// Inclusive rectangle of tiles covering a bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub zoom: u8,
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
}

impl TileRange {
    pub fn tiles_x(&self) -> usize {
        (self.x_max - self.x_min + 1) as usize
    }

    pub fn tiles_y(&self) -> usize {
        (self.y_max - self.y_min + 1) as usize
    }

    /// Total number of tiles in the range
    pub fn len(&self) -> usize {
        self.tiles_x() * self.tiles_y()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tiles in row-major order (north row first)
    pub fn iter(&self) -> impl Iterator<Item = TileCoord> + '_ {
        (self.y_min..=self.y_max)
            .flat_map(move |y| (self.x_min..=self.x_max).map(move |x| TileCoord::new(self.zoom, x, y)))
    }
}
