//! Raster image codec and resize, in process via the `image` crate.

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::domain::error::{AlfredError, Result};

const TOOL: &str = "image-codec";
const ICO_MAX: u32 = 256;

fn fail(message: impl Into<String>) -> AlfredError {
    AlfredError::conversion(TOOL, message)
}

fn format_for(ext: &str) -> Result<ImageFormat> {
    ImageFormat::from_extension(ext).ok_or_else(|| fail(format!("no encoder for .{ext}")))
}

fn load(input: &Path) -> Result<DynamicImage> {
    image::open(input).map_err(|e| fail(format!("cannot decode {}: {e}", input.display())))
}

/// Adapts pixel layout to what each encoder accepts.
fn prepare(img: DynamicImage, format: ImageFormat) -> DynamicImage {
    match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        ImageFormat::Ico => {
            let (w, h) = img.dimensions();
            let img = if w > ICO_MAX || h > ICO_MAX {
                img.thumbnail(ICO_MAX, ICO_MAX)
            } else {
                img
            };
            DynamicImage::ImageRgba8(img.to_rgba8())
        }
        ImageFormat::Gif | ImageFormat::WebP | ImageFormat::Bmp => {
            DynamicImage::ImageRgba8(img.to_rgba8())
        }
        _ => img,
    }
}

fn save(img: DynamicImage, target: &str, output: &Path) -> Result<()> {
    let format = format_for(target)?;
    prepare(img, format)
        .save_with_format(output, format)
        .map_err(|e| fail(format!("cannot encode .{target}: {e}")))
}

pub fn convert(input: &Path, target: &str, output: &Path) -> Result<()> {
    save(load(input)?, target, output)
}

/// Fit within `width` x `height`, keeping the aspect ratio.
pub fn resize(input: &Path, width: u32, height: u32, target: &str, output: &Path) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(AlfredError::InvalidInput(format!(
            "Cannot resize to {width}x{height}"
        )));
    }
    let img = load(input)?;
    tracing::info!("Resizing {} from {:?} to fit {width}x{height}", input.display(), img.dimensions());
    save(img.resize(width, height, FilterType::Lanczos3), target, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};
    use tempfile::TempDir;

    fn sample_png(dir: &TempDir, w: u32, h: u32) -> std::path::PathBuf {
        let path = dir.path().join("sample.png");
        let buffer = ImageBuffer::from_fn(w, h, |x, y| Rgba([(x % 255) as u8, (y % 255) as u8, 128, 200]));
        buffer.save(&path).unwrap();
        path
    }

    #[test]
    fn test_png_to_each_raster_format() {
        let dir = TempDir::new().unwrap();
        let input = sample_png(&dir, 16, 8);

        for target in ["jpg", "gif", "bmp", "tiff", "webp", "ico"] {
            let output = dir.path().join(format!("out.{target}"));
            convert(&input, target, &output).unwrap();
            let decoded = image::open(&output).unwrap();
            assert_eq!(decoded.dimensions(), (16, 8), "{target}");
        }
    }

    #[test]
    fn test_ico_is_capped_at_256() {
        let dir = TempDir::new().unwrap();
        let input = sample_png(&dir, 512, 300);
        let output = dir.path().join("icon.ico");
        convert(&input, "ico", &output).unwrap();

        let (w, h) = image::open(&output).unwrap().dimensions();
        assert!(w <= 256 && h <= 256);
    }

    #[test]
    fn test_resize_keeps_aspect_ratio() {
        let dir = TempDir::new().unwrap();
        let input = sample_png(&dir, 200, 100);
        let output = dir.path().join("small.png");
        resize(&input, 50, 50, "png", &output).unwrap();

        assert_eq!(image::open(&output).unwrap().dimensions(), (50, 25));
    }

    #[test]
    fn test_corrupt_input_is_conversion_error() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("broken.png");
        std::fs::write(&input, b"not a png").unwrap();
        let err = convert(&input, "jpg", &dir.path().join("x.jpg")).unwrap_err();
        assert!(matches!(err, AlfredError::Conversion { tool, .. } if tool == "image-codec"));
    }
}
