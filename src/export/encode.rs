//! Bitmap to PNG/JPEG bytes

use super::options::ExportFormat;
use crate::error::{Error, Result};
use crate::page::Color;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};
use log::{debug, warn};

/// Outputs smaller than this are suspicious but still delivered.
pub const MIN_EXPECTED_BLOB_BYTES: usize = 10_000;

/// Encode a capture as PNG (lossless, alpha kept).
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgba8,
    )?;
    finish(bytes, ExportFormat::Png)
}

/// Encode a capture as JPEG. Any remaining transparency is flattened onto
/// `matte`; `quality` is 0.0 - 1.0.
pub fn encode_jpeg(image: &RgbaImage, quality: f32, matte: Color) -> Result<Vec<u8>> {
    let matte = Color { a: 255, ..matte };
    let rgb = RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let c = Color::rgba(r, g, b, a).over(matte);
        image::Rgb([c.r, c.g, c.b])
    });

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, jpeg_quality(quality)).write_image(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ExtendedColorType::Rgb8,
    )?;
    finish(bytes, ExportFormat::Jpg)
}

/// Map 0.0 - 1.0 onto the encoder's 1 - 100 scale.
pub fn jpeg_quality(quality: f32) -> u8 {
    let quality = if quality.is_finite() { quality } else { 1.0 };
    (quality.clamp(0.0, 1.0) * 100.0).round().clamp(1.0, 100.0) as u8
}

fn finish(bytes: Vec<u8>, format: ExportFormat) -> Result<Vec<u8>> {
    if bytes.is_empty() {
        return Err(Error::BlobEncodingFailed {
            format: format.to_string(),
        });
    }
    if bytes.len() < MIN_EXPECTED_BLOB_BYTES {
        warn!(
            "Export blob is smaller than expected ({} bytes) - possible quality issues",
            bytes.len()
        );
    }
    debug!("Encoded {} ({} bytes)", format, bytes.len());
    Ok(bytes)
}
