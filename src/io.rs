// ============================================================================
// IMAGE I/O — the codec boundary between bytes and surfaces
// ============================================================================

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, DynamicImage, ImageEncoder};

use crate::canvas::{Surface, premultiply, unpremultiply};
use crate::error::EditError;

/// Formats the save path offers. JPEG quality is 1–100.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveFormat {
    Png,
    Jpeg { quality: u8 },
    Bmp,
}

/// Decode an image byte stream into a premultiplied surface. Failures are
/// recoverable: the caller's document is untouched.
pub fn decode(bytes: &[u8]) -> Result<Surface, EditError> {
    let img = image::load_from_memory(bytes)?;
    let mut rgba = img.to_rgba8();
    for px in rgba.pixels_mut() {
        *px = premultiply(*px);
    }
    Ok(Surface::from_premultiplied(rgba))
}

/// Encode a surface to bytes. Alpha is un-premultiplied on the way out;
/// JPEG flattens to RGB.
pub fn encode(surface: &Surface, format: SaveFormat) -> Result<Vec<u8>, EditError> {
    let mut rgba = surface.as_image().clone();
    for px in rgba.pixels_mut() {
        *px = unpremultiply(*px);
    }
    let (w, h) = (rgba.width(), rgba.height());

    let mut out = Vec::new();
    match format {
        SaveFormat::Png => {
            PngEncoder::new(&mut out).write_image(rgba.as_raw(), w, h, ColorType::Rgba8)?;
        }
        SaveFormat::Jpeg { quality } => {
            if quality == 0 || quality > 100 {
                return Err(EditError::InvalidParameter(format!(
                    "JPEG quality {quality} out of range (1–100)"
                )));
            }
            let rgb = DynamicImage::ImageRgba8(rgba).to_rgb8();
            JpegEncoder::new_with_quality(&mut out, quality).write_image(
                rgb.as_raw(),
                w,
                h,
                ColorType::Rgb8,
            )?;
        }
        SaveFormat::Bmp => {
            BmpEncoder::new(&mut out).encode(rgba.as_raw(), w, h, ColorType::Rgba8)?;
        }
    }
    Ok(out)
}
