//! # Binarization
//!
//! Turns a grayscale raster into a [`BinaryMask`] with either a global fixed
//! threshold or a Gaussian-weighted local (adaptive) threshold.

use std::time::Instant;

use image::{GrayImage, Luma};
use imageproc::filter::separable_filter_equal;

use crate::errors::{SegmentationError, SegmentationResult};
use crate::raster::{BinaryMask, Raster};

use super::types::BinarizationMode;

/// Binarizes a single-channel raster.
///
/// * `Fixed` marks every pixel `>= threshold` as foreground.
/// * `Adaptive` marks a pixel as foreground when it is darker than the
///   Gaussian-weighted mean of its `window_size` neighborhood minus `bias`,
///   so dark glyphs on light paper come out as foreground.
///
/// # Errors
///
/// `InvalidParameter` for an out-of-range threshold or a non-positive or
/// even window, `DimensionMismatch` when the raster has more than one channel.
///
/// # Examples
///
/// ```
/// use glyph_segmenter::raster::Raster;
/// use glyph_segmenter::segmentation::{binarize, BinarizationMode};
///
/// let raster = Raster::from_gray(3, 1, vec![10, 128, 250]).unwrap();
/// let mask = binarize(&raster, &BinarizationMode::Fixed { threshold: 128 }).unwrap();
/// assert!(!mask.is_foreground(0, 0));
/// assert!(mask.is_foreground(1, 0));
/// ```
pub fn binarize(raster: &Raster, mode: &BinarizationMode) -> SegmentationResult<BinaryMask> {
    mode.validate()?;
    if !raster.is_grayscale() {
        return Err(SegmentationError::DimensionMismatch {
            expected: "1 channel".to_string(),
            actual: format!("{} channels", raster.channels()),
        });
    }

    let start_time = Instant::now();
    let mask = match *mode {
        BinarizationMode::Fixed { threshold } => fixed_threshold(raster, threshold as u8),
        BinarizationMode::Adaptive { window_size, bias } => {
            adaptive_threshold(raster, window_size as usize, bias)
        }
    };

    tracing::debug!(
        target: "glyph_segmentation",
        "Binarization completed in {}ms: mode={:?}, dimensions={}x{}, foreground={}",
        start_time.elapsed().as_millis(),
        mode,
        raster.width(),
        raster.height(),
        mask.foreground_count()
    );

    Ok(mask)
}

fn fixed_threshold(raster: &Raster, threshold: u8) -> BinaryMask {
    let cells: Vec<bool> = raster.data().iter().map(|&v| v >= threshold).collect();
    BinaryMask::from_bools(raster.width(), raster.height(), &cells)
}

fn adaptive_threshold(raster: &Raster, window_size: usize, bias: f32) -> BinaryMask {
    let width = raster.width();
    let height = raster.height();
    if width == 0 || height == 0 {
        return BinaryMask::empty(width, height);
    }

    // The local mean is quantized to 8 bits, so a flat neighborhood never
    // reads brighter than itself.
    let means = local_means(raster, window_size);
    let cells: Vec<bool> = raster
        .data()
        .iter()
        .zip(means.as_raw())
        .map(|(&v, &mean)| (v as f32) < mean as f32 - bias)
        .collect();
    BinaryMask::from_bools(width, height, &cells)
}

/// Gaussian-weighted neighborhood means, edges padded by continuity.
fn local_means(raster: &Raster, window_size: usize) -> GrayImage {
    let gray = GrayImage::from_fn(raster.width(), raster.height(), |x, y| {
        Luma([raster.pixel(x, y)[0]])
    });
    let kernel = gaussian_kernel(window_size);
    separable_filter_equal(&gray, kernel.as_slice())
}

/// Normalized 1-D Gaussian weights for an odd window.
///
/// Sigma follows the usual window-derived rule
/// `0.3 * ((size - 1) * 0.5 - 1) + 0.8`.
fn gaussian_kernel(size: usize) -> Vec<f32> {
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let radius = (size / 2) as f32;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let weights: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - radius;
            (-(d * d) / two_sigma_sq).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster_from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> Raster {
        let mut data = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Raster::from_gray(width, height, data).expect("valid test raster")
    }

    #[test]
    fn test_fixed_threshold_includes_equality() {
        let raster = Raster::from_gray(4, 1, vec![127, 128, 129, 0]).unwrap();
        let mask = binarize(&raster, &BinarizationMode::Fixed { threshold: 128 }).unwrap();
        assert!(!mask.is_foreground(0, 0));
        assert!(mask.is_foreground(1, 0));
        assert!(mask.is_foreground(2, 0));
        assert!(!mask.is_foreground(3, 0));
    }

    #[test]
    fn test_fixed_threshold_zero_marks_everything() {
        let raster = raster_from_fn(5, 5, |x, y| (x * y) as u8);
        let mask = binarize(&raster, &BinarizationMode::Fixed { threshold: 0 }).unwrap();
        assert_eq!(mask.foreground_count(), 25);
    }

    #[test]
    fn test_threshold_256_rejected() {
        let raster = Raster::filled(2, 2, 1, 0).unwrap();
        let result = binarize(&raster, &BinarizationMode::Fixed { threshold: 256 });
        assert!(matches!(
            result,
            Err(SegmentationError::InvalidParameter { name: "threshold", .. })
        ));
    }

    #[test]
    fn test_even_window_rejected() {
        let raster = Raster::filled(2, 2, 1, 0).unwrap();
        let mode = BinarizationMode::Adaptive {
            window_size: 10,
            bias: 2.0,
        };
        assert!(matches!(
            binarize(&raster, &mode),
            Err(SegmentationError::InvalidParameter { name: "window_size", .. })
        ));
    }

    #[test]
    fn test_color_raster_rejected() {
        let raster = Raster::filled(2, 2, 3, 0).unwrap();
        let result = binarize(&raster, &BinarizationMode::fixed_default());
        assert!(matches!(result, Err(SegmentationError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_adaptive_uniform_image_is_background() {
        let raster = Raster::filled(20, 20, 1, 200).unwrap();
        let mask = binarize(&raster, &BinarizationMode::adaptive_default()).unwrap();
        assert_eq!(mask.foreground_count(), 0);
    }

    #[test]
    fn test_adaptive_marks_dark_stroke() {
        // Dark vertical stroke on light paper
        let raster = raster_from_fn(30, 20, |x, _| if (14..16).contains(&x) { 20 } else { 220 });
        let mask = binarize(&raster, &BinarizationMode::adaptive_default()).unwrap();
        for y in 0..20 {
            assert!(mask.is_foreground(14, y));
            assert!(mask.is_foreground(15, y));
            assert!(!mask.is_foreground(2, y));
            assert!(!mask.is_foreground(27, y));
        }
    }

    #[test]
    fn test_adaptive_handles_illumination_gradient() {
        // Background brightens left to right; the stroke stays darker than its surroundings
        let raster = raster_from_fn(60, 10, |x, _| {
            let paper = 100 + (x * 2) as u8;
            if x == 45 {
                paper - 60
            } else {
                paper
            }
        });
        let mask = binarize(&raster, &BinarizationMode::adaptive_default()).unwrap();
        assert!(mask.is_foreground(45, 5));
        assert!(!mask.is_foreground(10, 5));
    }

    #[test]
    fn test_adaptive_flat_raster_has_no_foreground_at_any_level() {
        for window_size in [1, 11, 31] {
            let mode = BinarizationMode::Adaptive {
                window_size,
                bias: 0.0,
            };
            for level in 0..=255u8 {
                let raster = Raster::filled(16, 16, 1, level).unwrap();
                let mask = binarize(&raster, &mode).unwrap();
                assert_eq!(
                    mask.foreground_count(),
                    0,
                    "level {} with window {}",
                    level,
                    window_size
                );
            }
        }
    }

    #[test]
    fn test_adaptive_window_wider_than_raster() {
        let raster = raster_from_fn(4, 3, |x, _| if x == 1 { 10 } else { 200 });
        let mode = BinarizationMode::Adaptive {
            window_size: 31,
            bias: 2.0,
        };
        let mask = binarize(&raster, &mode).unwrap();
        assert!(mask.is_foreground(1, 1));
        assert!(!mask.is_foreground(3, 1));
    }

    #[test]
    fn test_gaussian_kernel_is_normalized_and_symmetric() {
        let kernel = gaussian_kernel(11);
        let sum: f32 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!((kernel[0] - kernel[10]).abs() < 1e-7);
        assert!(kernel[5] > kernel[4]);
    }
}
