use image::{GrayImage, Luma, RgbImage};
use imageproc::edges::canny;
use imageproc::filter::separable_filter_equal;
use log::debug;

use crate::config::{DetectorConfig, PreprocessMode};

/// Single-channel map where non-zero pixels are edges or foreground.
pub type BinaryMap = GrayImage;

/// Convert an RGB frame to luminance
pub fn to_luminance(frame: &RgbImage) -> GrayImage {
    let (width, height) = frame.dimensions();
    let mut gray = GrayImage::new(width, height);

    for (x, y, pixel) in frame.enumerate_pixels() {
        // Standard luminance conversion
        let luma = 0.299 * pixel[0] as f64 + 0.587 * pixel[1] as f64 + 0.114 * pixel[2] as f64;
        gray.put_pixel(x, y, Luma([luma.round().clamp(0.0, 255.0) as u8]));
    }

    gray
}

/// 1-D Gaussian kernel of odd `size`.
///
/// A non-positive `sigma` is derived from the kernel size. Small kernels with a
/// derived sigma use the fixed binomial weights, so a 5-tap kernel is exactly
/// `[1, 4, 6, 4, 1] / 16`.
pub fn gaussian_kernel(size: u32, sigma: f64) -> Vec<f32> {
    if sigma <= 0.0 {
        match size {
            1 => return vec![1.0],
            3 => return vec![0.25, 0.5, 0.25],
            5 => return vec![0.0625, 0.25, 0.375, 0.25, 0.0625],
            7 => {
                return vec![
                    0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125,
                ]
            }
            _ => {}
        }
    }

    let sigma = if sigma > 0.0 {
        sigma
    } else {
        0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8
    };
    let center = (size / 2) as f64;
    let weights: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = weights.iter().sum();

    weights.iter().map(|w| (w / total) as f32).collect()
}

/// Smooth with a square Gaussian kernel whose sigma is derived from its size.
///
/// Borders are padded by repeating the edge pixel.
pub fn smooth(gray: &GrayImage, kernel_size: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 || kernel_size <= 1 {
        return gray.clone();
    }

    separable_filter_equal(gray, &gaussian_kernel(kernel_size, 0.0))
}

/// Apply Canny edge detection
fn detect_edges(gray: &GrayImage, low_threshold: f32, high_threshold: f32) -> BinaryMap {
    canny(gray, low_threshold, high_threshold)
}

/// Inverted adaptive threshold against a Gaussian-weighted local mean.
///
/// A pixel is set when it is at least `offset` darker than its neighbourhood,
/// so flat regions of any brightness come out empty.
pub fn adaptive_threshold_inv(gray: &GrayImage, block_size: u32, offset: f64) -> BinaryMap {
    let (width, height) = gray.dimensions();
    let local_mean = smooth(gray, block_size);

    let mut binary = GrayImage::new(width, height);
    for (x, y, pixel) in gray.enumerate_pixels() {
        let cutoff = local_mean.get_pixel(x, y)[0] as f64 - offset;
        if pixel[0] as f64 <= cutoff {
            binary.put_pixel(x, y, Luma([255]));
        }
    }

    binary
}

/// Turn a color frame into the binary map contours are traced on
pub fn preprocess(frame: &RgbImage, config: &DetectorConfig) -> BinaryMap {
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return GrayImage::new(width, height);
    }

    let gray = to_luminance(frame);
    let blurred = smooth(&gray, config.blur_kernel);

    match config.mode {
        PreprocessMode::Edges { low, high } => {
            debug!("Applied Canny edge detection ({:.1}, {:.1})", low, high);
            detect_edges(&blurred, low, high)
        }
        PreprocessMode::Adaptive { block_size, offset } => {
            debug!(
                "Applied adaptive threshold (block {}, offset {:.1})",
                block_size, offset
            );
            adaptive_threshold_inv(&blurred, block_size, offset)
        }
    }
}
