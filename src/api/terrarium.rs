use std::time::Duration;

use tracing::debug;

use crate::config::TileSourceConfig;
use crate::domain::TileCoord;
use crate::error::TileFetchError;
use crate::terrain::{TileRaster, TileSource};

/// HTTP client for terrarium-encoded PNG elevation tiles
#[derive(Debug)]
pub struct TerrariumClient {
    client: reqwest::blocking::Client,
    url_template: String,
    max_retries: u32,
}

impl TerrariumClient {
    pub fn new(config: &TileSourceConfig) -> Result<Self, TileFetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url_template: config.url_template.clone(),
            max_retries: config.max_retries,
        })
    }

    /// Fill the `{z}`, `{x}` and `{y}` placeholders of the template
    pub fn tile_url(&self, tile: TileCoord) -> String {
        expand_template(&self.url_template, tile)
    }

    /// Download raw tile bytes, retrying on throttling and server errors
    fn download(&self, url: &str) -> Result<Vec<u8>, TileFetchError> {
        let mut last_status = 0;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let wait = Duration::from_millis(500 * attempt as u64);
                debug!(url, attempt, status = last_status, "Retrying tile request");
                std::thread::sleep(wait);
            }

            let response = self.client.get(url).send()?;
            let status = response.status();

            if status.is_success() {
                return Ok(response.bytes()?.to_vec());
            }
            // 429 = Too Many Requests, 5xx = server side; both are retriable
            if status.as_u16() == 429 || status.is_server_error() {
                last_status = status.as_u16();
                continue;
            }
            return Err(TileFetchError::Status(status.as_u16()));
        }

        Err(TileFetchError::Status(last_status))
    }
}

impl TileSource for TerrariumClient {
    fn fetch_tile(&self, tile: TileCoord) -> Result<TileRaster, TileFetchError> {
        let url = self.tile_url(tile);
        let bytes = self.download(&url)?;
        decode_tile(&bytes)
    }
}

fn expand_template(template: &str, tile: TileCoord) -> String {
    template
        .replace("{z}", &tile.zoom.to_string())
        .replace("{x}", &tile.x.to_string())
        .replace("{y}", &tile.y.to_string())
}

/// Decode an encoded tile image into RGB pixels
pub fn decode_tile(bytes: &[u8]) -> Result<TileRaster, TileFetchError> {
    let image = image::load_from_memory(bytes)?;
    TileRaster::from_image(image.to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::TILE_SIZE;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([128, 20, 64, 255]));
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        img.write_to(&mut cursor, image::ImageFormat::Png).unwrap();
        buffer
    }

    #[test]
    fn test_expand_template() {
        let url = expand_template(
            "https://tiles.example.com/terrarium/{z}/{x}/{y}.png",
            TileCoord::new(12, 2047, 2048),
        );
        assert_eq!(url, "https://tiles.example.com/terrarium/12/2047/2048.png");
    }

    #[test]
    fn test_client_uses_configured_template() {
        let config = TileSourceConfig {
            url_template: "http://localhost/{z}-{x}-{y}".to_string(),
            ..Default::default()
        };
        let client = TerrariumClient::new(&config).unwrap();
        assert_eq!(client.tile_url(TileCoord::new(3, 1, 2)), "http://localhost/3-1-2");
    }

    #[test]
    fn test_decode_rgba_png_drops_alpha() {
        let tile = decode_tile(&png_bytes(TILE_SIZE, TILE_SIZE)).unwrap();
        let mut composite = crate::terrain::CompositeRaster::new(256, 256);
        composite.blit(&tile, 0, 0);
        assert_eq!(composite.pixel(17, 200), [128, 20, 64]);
        assert_eq!(composite.elevation_at(17, 200), 20.25);
    }

    #[test]
    fn test_decode_wrong_size_fails() {
        assert!(matches!(
            decode_tile(&png_bytes(64, 64)),
            Err(TileFetchError::SizeMismatch { width: 64, .. })
        ));
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(
            decode_tile(b"not a png"),
            Err(TileFetchError::Decode(_))
        ));
    }

    #[test]
    fn test_rgb_fixture_decodes() {
        let img = RgbImage::from_pixel(TILE_SIZE, TILE_SIZE, Rgb([128, 0, 0]));
        let mut buffer = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        assert!(decode_tile(&buffer).is_ok());
    }
}
