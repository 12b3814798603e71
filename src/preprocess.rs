//! Fixed image-filtering pipelines applied before model submission.
//!
//! Both profiles are pure and deterministic: the same input always yields
//! byte-identical output.

use crate::error::Result;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::{adaptive_threshold, equalize_histogram};
use imageproc::filter::{median_filter, sharpen3x3};
use std::io::Cursor;

/// Contrast scaling applied about the image mean in the sharpen profile.
const CONTRAST_FACTOR: f32 = 2.0;

/// Median-filter radius used for denoising in the binarize profile.
const MEDIAN_RADIUS: u32 = 1;

/// Neighborhood radius for the adaptive mean threshold.
const THRESHOLD_BLOCK_RADIUS: u32 = 25;

/// Enhancement pipeline variants for handwriting legibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnhanceProfile {
    /// Grayscale, contrast boost, sharpening. Suits photographed labels and
    /// printed prescriptions.
    #[default]
    Sharpen,
    /// Grayscale, denoise, equalize, adaptive binarization. Suits dense
    /// handwriting on uneven paper.
    Binarize,
}

/// Runs the selected enhancement pipeline over one raster image.
pub fn enhance(input: &DynamicImage, profile: EnhanceProfile) -> GrayImage {
    let gray = input.to_luma8();
    match profile {
        EnhanceProfile::Sharpen => sharpen3x3(&scale_contrast(&gray, CONTRAST_FACTOR)),
        EnhanceProfile::Binarize => {
            let denoised = median_filter(&gray, MEDIAN_RADIUS, MEDIAN_RADIUS);
            let equalized = equalize_histogram(&denoised);
            adaptive_threshold(&equalized, THRESHOLD_BLOCK_RADIUS)
        }
    }
}

/// Decodes raster bytes, enhances them, and re-encodes as PNG.
pub fn enhance_bytes(data: &[u8], profile: EnhanceProfile) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(data)?;
    let enhanced = enhance(&decoded, profile);

    let mut out = Vec::new();
    DynamicImage::ImageLuma8(enhanced).write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)?;
    Ok(out)
}

/// Scales pixel values away from the image mean by `factor`, clamped to the
/// valid range. A factor of 1.0 is the identity.
fn scale_contrast(image: &GrayImage, factor: f32) -> GrayImage {
    let count = (image.width() as u64 * image.height() as u64).max(1);
    let sum: u64 = image.pixels().map(|p| u64::from(p.0[0])).sum();
    let mean = sum as f32 / count as f32;

    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let value = f32::from(image.get_pixel(x, y).0[0]);
        let scaled = mean + factor * (value - mean);
        Luma([scaled.round().clamp(0.0, 255.0) as u8])
    })
}
