//! Image utilities for PDF rendering
//!
//! Photos arrive as raw PNG or JPEG bytes. They are decoded once, split into
//! RGB samples plus an optional alpha channel, and written as Flate-compressed
//! image XObjects (the alpha channel becomes a DeviceGray soft mask).

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::io::Reader as ImageReader;
use image::{DynamicImage, GenericImageView};
use pdf_writer::{Filter, Pdf, Ref};
use std::io::{Cursor, Write};

use crate::error::{RenderError, RenderResult};

/// A decoded photo ready to be written to the PDF.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    rgb: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

/// Decode PNG or JPEG bytes, sniffing the format from the data itself.
pub fn decode_image(data: &[u8]) -> RenderResult<DecodedImage> {
    if data.is_empty() {
        return Err(RenderError::Image("image data is empty".into()));
    }

    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| RenderError::Image(format!("Failed to read image format: {}", e)))?;
    let format = reader.format();
    if format.is_none() {
        return Err(RenderError::Image("unrecognized image format".into()));
    }
    let image = reader.decode()?;

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(RenderError::Image(format!(
            "image has degenerate size {}x{}",
            width, height
        )));
    }

    let (rgb, alpha) = split_alpha(image);
    log::debug!(
        "decoded {:?} image {}x{} (alpha: {})",
        format,
        width,
        height,
        alpha.is_some()
    );
    Ok(DecodedImage {
        width,
        height,
        rgb,
        alpha,
    })
}

/// RGB samples plus the alpha channel, if the image has a non-opaque one.
fn split_alpha(image: DynamicImage) -> (Vec<u8>, Option<Vec<u8>>) {
    if !image.color().has_alpha() {
        return (image.to_rgb8().into_raw(), None);
    }

    let rgba = image.to_rgba8();
    let pixels = rgba.as_raw();
    let mut rgb = Vec::with_capacity(pixels.len() / 4 * 3);
    let mut alpha = Vec::with_capacity(pixels.len() / 4);
    for chunk in pixels.chunks_exact(4) {
        rgb.extend_from_slice(&chunk[..3]);
        alpha.push(chunk[3]);
    }

    if alpha.iter().all(|a| *a == u8::MAX) {
        (rgb, None)
    } else {
        (rgb, Some(alpha))
    }
}

fn deflate(data: &[u8]) -> RenderResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Write the image (and its soft mask) as XObjects.
pub fn add_image_to_pdf(
    pdf: &mut Pdf,
    image: &DecodedImage,
    image_id: Ref,
    next_ref_id: &mut i32,
) -> RenderResult<()> {
    // SMask first so the two writers never overlap
    let smask_id = match &image.alpha {
        Some(alpha) => {
            let smask_id = Ref::new(*next_ref_id);
            *next_ref_id += 1;
            let compressed = deflate(alpha)?;
            let mut smask = pdf.image_xobject(smask_id, &compressed);
            smask.filter(Filter::FlateDecode);
            smask.width(image.width as i32);
            smask.height(image.height as i32);
            smask.color_space().device_gray();
            smask.bits_per_component(8);
            Some(smask_id)
        }
        None => None,
    };

    let compressed = deflate(&image.rgb)?;
    let mut xobject = pdf.image_xobject(image_id, &compressed);
    xobject.filter(Filter::FlateDecode);
    xobject.width(image.width as i32);
    xobject.height(image.height as i32);
    xobject.color_space().device_rgb();
    xobject.bits_per_component(8);
    if let Some(smask_id) = smask_id {
        xobject.s_mask(smask_id);
    }

    log::debug!(
        "image XObject {}: {}x{}, {} compressed bytes",
        image_id.get(),
        image.width,
        image.height,
        compressed.len()
    );
    Ok(())
}

/// Scale `width x height` down (never up) to fit inside the bounds,
/// keeping the aspect ratio.
pub fn fit_image(width: f64, height: f64, max_width: f64, max_height: f64) -> (f64, f64) {
    if width <= 0.0 || height <= 0.0 {
        return (0.0, 0.0);
    }
    let scale = (max_width / width).min(max_height / height).min(1.0);
    (width * scale, height * scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgb, RgbImage, Rgba, RgbaImage};

    fn encode(image: DynamicImage, format: ImageOutputFormat) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, format).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_decode_png_and_jpeg() {
        let rgb = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 20, Rgb([200, 30, 30])));

        let png = decode_image(&encode(rgb.clone(), ImageOutputFormat::Png)).unwrap();
        assert_eq!((png.width, png.height), (40, 20));
        assert!(png.alpha.is_none());

        let jpeg = decode_image(&encode(rgb, ImageOutputFormat::Jpeg(85))).unwrap();
        assert_eq!((jpeg.width, jpeg.height), (40, 20));
        assert_eq!(jpeg.rgb.len(), 40 * 20 * 3);
    }

    #[test]
    fn test_translucent_png_keeps_alpha() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 255, 128])));
        let decoded = decode_image(&encode(rgba, ImageOutputFormat::Png)).unwrap();
        assert!(decoded.alpha.is_some());

        let opaque = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 255, 255])));
        let decoded = decode_image(&encode(opaque, ImageOutputFormat::Png)).unwrap();
        assert!(decoded.alpha.is_none());
    }

    #[test]
    fn test_garbage_is_an_image_error() {
        assert!(matches!(decode_image(b""), Err(RenderError::Image(_))));
        assert!(matches!(
            decode_image(b"this is not a picture at all"),
            Err(RenderError::Image(_))
        ));
        // PNG signature followed by junk
        let mut truncated = b"\x89PNG\r\n\x1a\n".to_vec();
        truncated.extend_from_slice(&[0u8; 16]);
        assert!(matches!(decode_image(&truncated), Err(RenderError::Image(_))));
    }

    #[test]
    fn test_fit_image() {
        assert_eq!(fit_image(800.0, 600.0, 400.0, 1000.0), (400.0, 300.0));
        assert_eq!(fit_image(200.0, 100.0, 400.0, 1000.0), (200.0, 100.0));
        assert_eq!(fit_image(400.0, 2000.0, 400.0, 500.0), (100.0, 500.0));
        assert_eq!(fit_image(0.0, 10.0, 400.0, 500.0), (0.0, 0.0));
    }
}
