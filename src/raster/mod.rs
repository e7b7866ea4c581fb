//! Rasterization of the visible crop region into a new embedded source.

use std::io::Cursor;

use base64::{engine::general_purpose, Engine as _};
use image::{DynamicImage, GenericImageView, ImageFormat};
use thiserror::Error;

use crate::crop_info::CropInfo;

const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("source is not a base64 image data uri")]
    NotDataUri,
    #[error("failed to decode base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),
    #[error("bitmap has no pixels")]
    EmptyBitmap,
}

pub type RasterResult<T> = std::result::Result<T, RasterError>;

/// Pixel rectangle inside the natural-resolution bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Visible sub-region of a `width` x `height` bitmap after trimming the
/// fractions in `info`. Always at least one pixel and inside the bitmap.
pub fn visible_region(width: u32, height: u32, info: &CropInfo) -> Option<PixelRegion> {
    if width == 0 || height == 0 {
        return None;
    }
    let (x, region_width) = axis_span(width, info.left, info.visible_width_fraction());
    let (y, region_height) = axis_span(height, info.top, info.visible_height_fraction());
    Some(PixelRegion {
        x,
        y,
        width: region_width,
        height: region_height,
    })
}

fn axis_span(extent: u32, leading: f64, visible: f64) -> (u32, u32) {
    let extent_f = f64::from(extent);
    let start = (extent_f * leading.clamp(0.0, 1.0)).round() as u32;
    let start = start.min(extent - 1);
    let length = (extent_f * visible.clamp(0.0, 1.0)).round() as u32;
    (start, length.clamp(1, extent - start))
}

pub fn crop_bitmap(bitmap: &DynamicImage, info: &CropInfo) -> RasterResult<DynamicImage> {
    let (width, height) = bitmap.dimensions();
    let region = visible_region(width, height, info).ok_or(RasterError::EmptyBitmap)?;
    Ok(bitmap.crop_imm(region.x, region.y, region.width, region.height))
}

pub fn encode_png_data_uri(bitmap: &DynamicImage) -> RasterResult<String> {
    let mut buf = Cursor::new(Vec::new());
    bitmap.write_to(&mut buf, ImageFormat::Png)?;
    let encoded = general_purpose::STANDARD.encode(buf.into_inner());
    Ok(format!("{PNG_DATA_URI_PREFIX}{encoded}"))
}

/// Crops `bitmap` to the region left visible by `info` and returns it as a
/// PNG data uri.
pub fn rasterize_crop(bitmap: &DynamicImage, info: &CropInfo) -> RasterResult<String> {
    let cropped = crop_bitmap(bitmap, info)?;
    tracing::debug!(
        width = cropped.width(),
        height = cropped.height(),
        "rasterized crop region"
    );
    encode_png_data_uri(&cropped)
}

pub fn bitmap_from_data_uri(src: &str) -> RasterResult<DynamicImage> {
    if !src.starts_with("data:image/") {
        return Err(RasterError::NotDataUri);
    }
    let payload_start = src.find(";base64,").ok_or(RasterError::NotDataUri)?;
    let bytes = general_purpose::STANDARD.decode(&src[payload_start + 8..])?;
    Ok(image::load_from_memory(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn quadrant_bitmap(width: u32, height: u32) -> DynamicImage {
        let image = RgbaImage::from_fn(width, height, |x, y| {
            let red = if x < width / 2 { 255 } else { 0 };
            let blue = if y < height / 2 { 255 } else { 0 };
            Rgba([red, 0, blue, 255])
        });
        DynamicImage::ImageRgba8(image)
    }

    fn info(left: f64, top: f64, right: f64, bottom: f64) -> CropInfo {
        CropInfo {
            src: "a.png".to_string(),
            left,
            right,
            top,
            bottom,
        }
    }

    #[test]
    fn visible_region_uses_natural_pixels() {
        let region = visible_region(800, 600, &info(0.125, 50.0 / 600.0, 0.0, 0.0))
            .expect("non-empty bitmap");
        assert_eq!(
            region,
            PixelRegion {
                x: 100,
                y: 50,
                width: 700,
                height: 550,
            }
        );
    }

    #[test]
    fn visible_region_never_leaves_the_bitmap() {
        let region = visible_region(10, 10, &info(0.99, 0.0, 0.0, 0.0)).expect("region");
        assert_eq!(region.x, 10 - 1);
        assert_eq!(region.width, 1);
        assert!(visible_region(0, 10, &info(0.0, 0.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn rasterize_crop_keeps_only_the_visible_quadrant() {
        let bitmap = quadrant_bitmap(40, 20);
        let uri = rasterize_crop(&bitmap, &info(0.5, 0.5, 0.0, 0.0)).expect("rasterize");
        assert!(uri.starts_with(PNG_DATA_URI_PREFIX));

        let decoded = bitmap_from_data_uri(&uri).expect("decode round trip");
        assert_eq!(decoded.dimensions(), (20, 10));
        assert_eq!(decoded.get_pixel(0, 0), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn bitmap_from_data_uri_rejects_other_sources() {
        assert!(matches!(
            bitmap_from_data_uri("https://example.com/a.png"),
            Err(RasterError::NotDataUri)
        ));
        assert!(matches!(
            bitmap_from_data_uri("data:image/png,raw"),
            Err(RasterError::NotDataUri)
        ));
        assert!(matches!(
            bitmap_from_data_uri("data:image/png;base64,@@@"),
            Err(RasterError::Base64(_))
        ));
    }
}
