//! Terrarium RGB elevation decoding and sub-pixel sampling

use super::raster::CompositeRaster;

/// Offset that lets the unsigned encoding represent sea floor
const ELEVATION_OFFSET: f64 = 32768.0;

/// Decode a terrarium-encoded pixel into meters.
///
/// `r * 256 + g + b / 256 - 32768`
#[inline]
pub fn decode_elevation(r: u8, g: u8, b: u8) -> f64 {
    r as f64 * 256.0 + g as f64 + b as f64 / 256.0 - ELEVATION_OFFSET
}

/// Inverse of [`decode_elevation`], used to build fixtures
#[cfg(test)]
pub(crate) fn encode_elevation(meters: f64) -> [u8; 3] {
    let v = meters + ELEVATION_OFFSET;
    let r = (v / 256.0).floor();
    let g = (v - r * 256.0).floor();
    let b = ((v - r * 256.0 - g) * 256.0).round();
    [r as u8, g as u8, b as u8]
}

/// Bilinearly interpolated elevation at fractional pixel coordinates.
///
/// Coordinates are clamped to `[0, dim - 1.001]` so the right and bottom
/// neighbours always exist.
pub fn bilinear_sample(raster: &CompositeRaster, x: f64, y: f64) -> f64 {
    let x = x.clamp(0.0, raster.width() as f64 - 1.001);
    let y = y.clamp(0.0, raster.height() as f64 - 1.001);

    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let wx = x - x0 as f64;
    let wy = y - y0 as f64;

    let h00 = raster.elevation_at(x0, y0);
    let h01 = raster.elevation_at(x0 + 1, y0);
    let h10 = raster.elevation_at(x0, y0 + 1);
    let h11 = raster.elevation_at(x0 + 1, y0 + 1);

    let top = h00 * (1.0 - wx) + h01 * wx;
    let bottom = h10 * (1.0 - wx) + h11 * wx;
    top * (1.0 - wy) + bottom * wy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_fixed_points() {
        assert_eq!(decode_elevation(0, 0, 0), -32768.0);
        assert_eq!(decode_elevation(128, 0, 0), 0.0);
        assert_eq!(decode_elevation(128, 1, 128), 1.5);
        assert_eq!(decode_elevation(127, 255, 0), -1.0);
    }

    #[test]
    fn test_encode_roundtrip_for_fixtures() {
        for meters in [-420.0, 0.0, 12.5, 4807.75] {
            let [r, g, b] = encode_elevation(meters);
            assert_eq!(decode_elevation(r, g, b), meters);
        }
    }

    fn gradient_raster() -> CompositeRaster {
        // Elevation = 10 * x + 100 * y
        let mut raster = CompositeRaster::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                raster.set_pixel(x, y, encode_elevation((10 * x + 100 * y) as f64));
            }
        }
        raster
    }

    #[test]
    fn test_sample_exact_pixels() {
        let raster = gradient_raster();
        for y in 0..3 {
            for x in 0..3 {
                let expected = raster.elevation_at(x, y);
                assert_eq!(bilinear_sample(&raster, x as f64, y as f64), expected);
            }
        }
    }

    #[test]
    fn test_sample_interpolates() {
        let raster = gradient_raster();
        let h = bilinear_sample(&raster, 1.5, 0.5);
        assert!((h - 65.0).abs() < 1e-9);
        let h = bilinear_sample(&raster, 0.25, 1.75);
        assert!((h - 177.5).abs() < 1e-9);
    }

    #[test]
    fn test_sample_clamps_out_of_bounds() {
        let raster = gradient_raster();
        assert_eq!(bilinear_sample(&raster, -5.0, -5.0), 0.0);
        let far = bilinear_sample(&raster, 100.0, 100.0);
        // Clamped just inside the last pixel: 10 * 2.999 + 100 * 2.999
        assert!((far - 329.89).abs() < 1e-6);
    }
}
