//! # Morphological Shaping
//!
//! Binary erosion and dilation over arbitrary structuring elements, plus the
//! plan runner that chains them in a caller-chosen order. Pixels outside the
//! mask always count as background, for both operations.

use std::time::Instant;

use crate::errors::{SegmentationError, SegmentationResult};
use crate::raster::BinaryMask;

use super::kernel::{make_kernel_xy, StructuringElement};
use super::types::{MorphOperation, MorphStep};

/// Erodes `mask`: a foreground pixel survives only if every pixel under the
/// kernel is foreground.
pub fn erode(
    mask: &BinaryMask,
    kernel: &StructuringElement,
    iterations: u32,
) -> SegmentationResult<BinaryMask> {
    repeat(mask, kernel, iterations, erode_once)
}

/// Dilates `mask`: a pixel becomes foreground if any pixel under the kernel
/// is foreground.
pub fn dilate(
    mask: &BinaryMask,
    kernel: &StructuringElement,
    iterations: u32,
) -> SegmentationResult<BinaryMask> {
    repeat(mask, kernel, iterations, dilate_once)
}

/// Erosion followed by dilation with the same kernel.
///
/// Detaches glyphs joined by thin bridges and drops specks smaller than the
/// kernel.
pub fn opening(mask: &BinaryMask, kernel: &StructuringElement) -> SegmentationResult<BinaryMask> {
    let eroded = erode(mask, kernel, 1)?;
    dilate(&eroded, kernel, 1)
}

/// Dilation followed by erosion with the same kernel.
///
/// Fuses the strokes of a glyph that binarization broke apart.
pub fn closing(mask: &BinaryMask, kernel: &StructuringElement) -> SegmentationResult<BinaryMask> {
    let dilated = dilate(mask, kernel, 1)?;
    erode(&dilated, kernel, 1)
}

/// Runs an ordered morphological plan, building each step's kernel.
///
/// An empty plan returns a copy of the input mask.
pub fn apply_plan(mask: &BinaryMask, plan: &[MorphStep]) -> SegmentationResult<BinaryMask> {
    let mut current = mask.clone();
    for (step_index, step) in plan.iter().enumerate() {
        let start_time = Instant::now();
        let kernel = make_kernel_xy(step.shape, step.radius_x, step.radius_y)?;
        current = apply_step(&current, step, &kernel)?;

        tracing::debug!(
            target: "glyph_segmentation",
            "Morphology step {} completed in {}ms: operation={:?}, shape={:?}, kernel={}x{}, iterations={}, foreground={}",
            step_index,
            start_time.elapsed().as_millis(),
            step.operation,
            step.shape,
            kernel.width(),
            kernel.height(),
            step.iterations,
            current.foreground_count()
        );
    }
    Ok(current)
}

pub(crate) fn apply_step(
    mask: &BinaryMask,
    step: &MorphStep,
    kernel: &StructuringElement,
) -> SegmentationResult<BinaryMask> {
    match step.operation {
        MorphOperation::Erode => erode(mask, kernel, step.iterations),
        MorphOperation::Dilate => dilate(mask, kernel, step.iterations),
    }
}

fn repeat(
    mask: &BinaryMask,
    kernel: &StructuringElement,
    iterations: u32,
    pass: fn(&BinaryMask, &[(i64, i64)]) -> BinaryMask,
) -> SegmentationResult<BinaryMask> {
    if iterations == 0 {
        return Err(SegmentationError::invalid(
            "iterations",
            iterations,
            "at least one pass is required",
        ));
    }

    let offsets = kernel.offsets();
    let mut current = pass(mask, &offsets);
    for _ in 1..iterations {
        current = pass(&current, &offsets);
    }
    Ok(current)
}

fn erode_once(mask: &BinaryMask, offsets: &[(i64, i64)]) -> BinaryMask {
    BinaryMask::from_fn(mask.width(), mask.height(), |x, y| {
        mask.is_foreground(x, y)
            && offsets
                .iter()
                .all(|&(dx, dy)| mask.is_foreground_at(x as i64 + dx, y as i64 + dy))
    })
}

fn dilate_once(mask: &BinaryMask, offsets: &[(i64, i64)]) -> BinaryMask {
    // Dilation reflects the kernel: pixel p is covered when some foreground
    // q satisfies q + offset = p.
    BinaryMask::from_fn(mask.width(), mask.height(), |x, y| {
        offsets
            .iter()
            .any(|&(dx, dy)| mask.is_foreground_at(x as i64 - dx, y as i64 - dy))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::kernel::make_kernel;
    use crate::segmentation::types::KernelShape;

    fn square(width: u32, height: u32, x0: u32, y0: u32, size: u32) -> BinaryMask {
        BinaryMask::from_fn(width, height, |x, y| {
            (x0..x0 + size).contains(&x) && (y0..y0 + size).contains(&y)
        })
    }

    #[test]
    fn test_erode_shrinks_square() {
        let mask = square(12, 12, 3, 3, 5);
        let kernel = make_kernel(KernelShape::Rectangle, 1).unwrap();
        let eroded = erode(&mask, &kernel, 1).unwrap();
        assert_eq!(eroded.foreground_count(), 9);
        assert!(eroded.is_foreground(4, 4));
        assert!(!eroded.is_foreground(3, 3));
    }

    #[test]
    fn test_dilate_grows_single_pixel_to_kernel() {
        let mask = BinaryMask::from_fn(9, 9, |x, y| x == 4 && y == 4);
        let kernel = make_kernel(KernelShape::Cross, 2).unwrap();
        let dilated = dilate(&mask, &kernel, 1).unwrap();
        assert_eq!(dilated.foreground_count(), kernel.active_count());
        assert!(dilated.is_foreground(4, 2));
        assert!(dilated.is_foreground(6, 4));
        assert!(!dilated.is_foreground(5, 5));
    }

    #[test]
    fn test_border_counts_as_background_for_erosion() {
        let mask = BinaryMask::from_fn(5, 5, |_, _| true);
        let kernel = make_kernel(KernelShape::Rectangle, 1).unwrap();
        let eroded = erode(&mask, &kernel, 1).unwrap();
        assert_eq!(eroded.foreground_count(), 9);
        assert!(!eroded.is_foreground(0, 2));
    }

    #[test]
    fn test_iterations_chain_passes() {
        let mask = BinaryMask::from_fn(11, 11, |x, y| x == 5 && y == 5);
        let kernel = make_kernel(KernelShape::Rectangle, 1).unwrap();
        let twice = dilate(&mask, &kernel, 2).unwrap();
        let once_more = dilate(&dilate(&mask, &kernel, 1).unwrap(), &kernel, 1).unwrap();
        assert_eq!(twice, once_more);
        assert_eq!(twice.foreground_count(), 25);
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let mask = BinaryMask::empty(3, 3);
        let kernel = make_kernel(KernelShape::Rectangle, 1).unwrap();
        assert!(matches!(
            erode(&mask, &kernel, 0),
            Err(SegmentationError::InvalidParameter { name: "iterations", .. })
        ));
    }

    #[test]
    fn test_opening_removes_speck_keeps_block() {
        let mut cells = vec![false; 20 * 20];
        for y in 5..12 {
            for x in 5..12 {
                cells[y * 20 + x] = true;
            }
        }
        cells[2 * 20 + 16] = true;
        let mask = BinaryMask::from_bools(20, 20, &cells);
        let kernel = make_kernel(KernelShape::Rectangle, 1).unwrap();
        let opened = opening(&mask, &kernel).unwrap();
        assert!(!opened.is_foreground(16, 2));
        assert_eq!(opened.foreground_count(), 49);
    }

    #[test]
    fn test_opening_separates_bridged_blobs() {
        // Two 6x6 blocks joined by a one-pixel bridge
        let mask = BinaryMask::from_fn(20, 10, |x, y| {
            ((2..8).contains(&x) || (10..16).contains(&x)) && (2..8).contains(&y)
                || ((8..10).contains(&x) && y == 4)
        });
        let kernel = make_kernel(KernelShape::Rectangle, 1).unwrap();
        let opened = opening(&mask, &kernel).unwrap();
        assert!(!opened.is_foreground(8, 4));
        assert!(!opened.is_foreground(9, 4));
        assert!(opened.is_foreground(4, 4));
        assert!(opened.is_foreground(12, 4));
    }

    #[test]
    fn test_closing_bridges_gap() {
        let mask = BinaryMask::from_fn(20, 10, |x, y| (5..15).contains(&x) && x != 9 && (3..7).contains(&y));
        let kernel = make_kernel(KernelShape::Rectangle, 1).unwrap();
        let closed = closing(&mask, &kernel).unwrap();
        assert!(closed.is_foreground(9, 4));
        assert!(closed.foreground_count() >= mask.foreground_count());
    }

    #[test]
    fn test_apply_plan_runs_in_order() {
        let mask = square(30, 30, 10, 10, 8);
        let plan = [
            MorphStep::dilate(KernelShape::Rectangle, 1).with_iterations(2),
            MorphStep::erode(KernelShape::Rectangle, 1).with_iterations(2),
        ];
        let shaped = apply_plan(&mask, &plan).unwrap();
        // Closing a convex block far from the border restores it
        assert_eq!(shaped, mask);
    }

    #[test]
    fn test_apply_plan_rejects_bad_step() {
        let mask = BinaryMask::empty(4, 4);
        let plan = [MorphStep::erode(KernelShape::Ellipse, -2)];
        assert!(apply_plan(&mask, &plan).is_err());
    }

    #[test]
    fn test_empty_plan_is_identity() {
        let mask = square(8, 8, 2, 2, 3);
        assert_eq!(apply_plan(&mask, &[]).unwrap(), mask);
    }
}
