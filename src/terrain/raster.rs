use image::RgbImage;

use super::elevation::decode_elevation;
use crate::error::TileFetchError;
use crate::geometry::TILE_SIZE;

/// Channels per pixel (RGB)
pub const CHANNELS: usize = 3;

/// A decoded elevation tile, `TILE_SIZE` square, RGB
#[derive(Debug, Clone)]
pub struct TileRaster {
    pixels: Vec<u8>,
}

impl TileRaster {
    /// Wrap a decoded image, rejecting anything that isn't a full tile
    pub fn from_image(image: RgbImage) -> Result<Self, TileFetchError> {
        if image.width() != TILE_SIZE || image.height() != TILE_SIZE {
            return Err(TileFetchError::SizeMismatch {
                width: image.width(),
                height: image.height(),
                expected: TILE_SIZE,
            });
        }
        Ok(Self {
            pixels: image.into_raw(),
        })
    }

    /// Tile with every channel zeroed
    pub fn flat() -> Self {
        let size = TILE_SIZE as usize;
        Self {
            pixels: vec![0; size * size * CHANNELS],
        }
    }

    fn row(&self, y: usize) -> &[u8] {
        let stride = TILE_SIZE as usize * CHANNELS;
        &self.pixels[y * stride..(y + 1) * stride]
    }
}

/// Contiguous RGB raster stitched from a block of tiles
#[derive(Debug, Clone)]
pub struct CompositeRaster {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl CompositeRaster {
    /// Zero-filled raster of the given pixel dimensions
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height * CHANNELS],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Copy a tile in with its top-left corner at pixel (x_offset, y_offset)
    pub fn blit(&mut self, tile: &TileRaster, x_offset: usize, y_offset: usize) {
        let size = TILE_SIZE as usize;
        let row_bytes = size * CHANNELS;
        for y in 0..size {
            let start = ((y_offset + y) * self.width + x_offset) * CHANNELS;
            self.pixels[start..start + row_bytes].copy_from_slice(tile.row(y));
        }
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width + x) * CHANNELS;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]]
    }

    #[cfg(test)]
    pub(crate) fn set_pixel(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        let i = (y * self.width + x) * CHANNELS;
        self.pixels[i..i + CHANNELS].copy_from_slice(&rgb);
    }

    /// Decoded elevation of a single pixel in meters
    #[inline]
    pub fn elevation_at(&self, x: usize, y: usize) -> f64 {
        let [r, g, b] = self.pixel(x, y);
        decode_elevation(r, g, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_tile_size_enforced() {
        let small = RgbImage::new(128, 128);
        assert!(matches!(
            TileRaster::from_image(small),
            Err(TileFetchError::SizeMismatch { width: 128, .. })
        ));
        assert!(TileRaster::from_image(RgbImage::new(TILE_SIZE, TILE_SIZE)).is_ok());
    }

    #[test]
    fn test_blit_places_tile_at_offset() {
        let image = RgbImage::from_pixel(TILE_SIZE, TILE_SIZE, Rgb([128, 10, 0]));
        let tile = TileRaster::from_image(image).unwrap();

        let mut composite = CompositeRaster::new(512, 512);
        composite.blit(&tile, 256, 0);

        assert_eq!(composite.pixel(256, 0), [128, 10, 0]);
        assert_eq!(composite.pixel(511, 255), [128, 10, 0]);
        assert_eq!(composite.pixel(255, 0), [0, 0, 0]);
        assert_eq!(composite.pixel(256, 256), [0, 0, 0]);
        assert_eq!(composite.elevation_at(300, 100), 10.0);
    }

    #[test]
    fn test_flat_tile_is_zeroed() {
        let mut composite = CompositeRaster::new(256, 256);
        composite.set_pixel(5, 5, [1, 2, 3]);
        composite.blit(&TileRaster::flat(), 0, 0);
        assert_eq!(composite.pixel(5, 5), [0, 0, 0]);
    }
}
