//! Heightmap raster decoding.
//!
//! Remote elevation tiles arrive as terrain-RGB rasters: each pixel packs a
//! 24-bit elevation into its red, green and blue channels. This module decodes
//! those rasters into flat height-sample arrays and resamples them to the
//! vertex resolution a clipmap level asks for.

use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use thiserror::Error;

/// Default vertical amplitude applied to the packed 24-bit channel value.
pub const DEFAULT_AMPLITUDE: f64 = 0.04;
/// Default vertical offset subtracted after amplitude scaling.
pub const DEFAULT_OFFSET: f64 = 0.0;

/// Errors produced while turning raster bytes into height samples.
#[derive(Debug, Error)]
pub enum HeightmapError {
    /// The fetched bytes were not a decodable image.
    #[error("failed to decode heightmap raster: {0}")]
    Decode(#[from] image::ImageError),

    /// The raster was not square.
    #[error("heightmap raster is {width}x{height}, expected a square image")]
    NotSquare { width: u32, height: u32 },
}

/// Decodes raw raster bytes (PNG) into an RGBA image.
pub fn decode_raster(bytes: &[u8]) -> Result<RgbaImage, HeightmapError> {
    let image = image::load_from_memory(bytes)?.to_rgba8();
    if image.width() != image.height() {
        return Err(HeightmapError::NotSquare {
            width: image.width(),
            height: image.height(),
        });
    }
    Ok(image)
}

/// Resamples a decoded raster to `size × size` pixels.
///
/// Returns the input unchanged when it is already the requested size.
/// Triangle filtering keeps constant regions exact and interpolates edges.
pub fn resample(image: &RgbaImage, size: u32) -> RgbaImage {
    if image.width() == size {
        return image.clone();
    }
    DynamicImage::ImageRgba8(image.clone())
        .resize_exact(size, size, FilterType::Triangle)
        .to_rgba8()
}

/// Decodes a terrain-RGB raster into row-major height samples.
///
/// Each pixel's height is `(R·65536 + G·256 + B) · amplitude − offset`,
/// floored to a whole unit. Rows run north to south, matching the mesh
/// builder's vertex layout.
pub fn decode_heights(image: &RgbaImage, amplitude: f64, offset: f64) -> Vec<f32> {
    let mut heights = Vec::with_capacity((image.width() * image.height()) as usize);

    for pixel in image.pixels() {
        let [r, g, b, _] = pixel.0;
        let packed = (r as u32) * 65536 + (g as u32) * 256 + b as u32;
        let height = (packed as f64 * amplitude - offset).floor();
        heights.push(height as f32);
    }

    heights
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn raster_of(pixel: [u8; 4], size: u32) -> RgbaImage {
        RgbaImage::from_pixel(size, size, Rgba(pixel))
    }

    #[test]
    fn test_decode_red_channel_height() {
        // R=10 packs to 10*65536; at amplitude 0.04 that is 26214.4, floored.
        let image = raster_of([10, 0, 0, 255], 2);
        let heights = decode_heights(&image, 0.04, 0.0);
        assert_eq!(heights, vec![26214.0; 4]);
    }

    #[test]
    fn test_decode_packs_all_channels() {
        let image = raster_of([1, 2, 3, 255], 1);
        let heights = decode_heights(&image, 1.0, 0.0);
        assert_eq!(heights[0], 65536.0 + 512.0 + 3.0);
    }

    #[test]
    fn test_decode_applies_offset() {
        let image = raster_of([0, 0, 100, 255], 1);
        let heights = decode_heights(&image, 1.0, 50.0);
        assert_eq!(heights[0], 50.0);
    }

    #[test]
    fn test_resample_preserves_constant_rasters() {
        let image = raster_of([0, 0, 42, 255], 8);
        let resized = resample(&image, 5);
        assert_eq!(resized.width(), 5);
        for pixel in resized.pixels() {
            assert_eq!(pixel.0[2], 42, "constant raster must stay constant");
        }
    }

    #[test]
    fn test_resample_same_size_is_identity() {
        let image = raster_of([9, 9, 9, 255], 4);
        let resized = resample(&image, 4);
        assert_eq!(resized, image);
    }

    #[test]
    fn test_decode_raster_rejects_non_square() {
        let image = RgbaImage::new(4, 2);
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(image)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        assert!(matches!(
            decode_raster(&bytes),
            Err(HeightmapError::NotSquare { .. })
        ));
    }
}
