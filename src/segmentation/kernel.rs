//! # Structuring Elements
//!
//! Builds the boolean kernels used by erosion and dilation. Kernels are
//! always odd-sized and centered: a radius `r` along an axis gives
//! `2r + 1` cells on that axis.

use crate::errors::{SegmentationError, SegmentationResult};

use super::types::KernelShape;

/// Immutable, centered morphological kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuringElement {
    shape: KernelShape,
    radius_x: u32,
    radius_y: u32,
    cells: Vec<bool>,
}

/// Builds a square kernel of the given shape.
pub fn make_kernel(shape: KernelShape, radius: i32) -> SegmentationResult<StructuringElement> {
    make_kernel_xy(shape, radius, radius)
}

/// Builds a kernel with independent horizontal and vertical radii.
///
/// Fails with `InvalidParameter` when either radius is negative.
pub fn make_kernel_xy(
    shape: KernelShape,
    radius_x: i32,
    radius_y: i32,
) -> SegmentationResult<StructuringElement> {
    if radius_x < 0 {
        return Err(SegmentationError::invalid(
            "radius_x",
            radius_x,
            "kernel radius must be >= 0",
        ));
    }
    if radius_y < 0 {
        return Err(SegmentationError::invalid(
            "radius_y",
            radius_y,
            "kernel radius must be >= 0",
        ));
    }

    let (rx, ry) = (radius_x as u32, radius_y as u32);
    let (w, h) = (2 * rx + 1, 2 * ry + 1);
    let mut cells = Vec::with_capacity(w as usize * h as usize);
    for row in 0..h {
        let dy = row as i64 - ry as i64;
        for col in 0..w {
            let dx = col as i64 - rx as i64;
            cells.push(cell_is_set(shape, dx, dy, rx, ry));
        }
    }

    Ok(StructuringElement {
        shape,
        radius_x: rx,
        radius_y: ry,
        cells,
    })
}

fn cell_is_set(shape: KernelShape, dx: i64, dy: i64, rx: u32, ry: u32) -> bool {
    match shape {
        KernelShape::Rectangle => true,
        KernelShape::Cross => dx == 0 || dy == 0,
        KernelShape::Ellipse => {
            // A zero radius collapses that axis to the center line
            if (rx == 0 && dx != 0) || (ry == 0 && dy != 0) {
                return false;
            }
            let nx = if rx == 0 { 0.0 } else { dx as f64 / rx as f64 };
            let ny = if ry == 0 { 0.0 } else { dy as f64 / ry as f64 };
            nx * nx + ny * ny <= 1.0
        }
    }
}

impl StructuringElement {
    pub fn shape(&self) -> KernelShape {
        self.shape
    }

    pub fn radius_x(&self) -> u32 {
        self.radius_x
    }

    pub fn radius_y(&self) -> u32 {
        self.radius_y
    }

    /// Kernel width in cells (always odd).
    pub fn width(&self) -> u32 {
        2 * self.radius_x + 1
    }

    /// Kernel height in cells (always odd).
    pub fn height(&self) -> u32 {
        2 * self.radius_y + 1
    }

    /// Whether the cell at `(col, row)` of the kernel grid is set.
    pub fn is_set(&self, col: u32, row: u32) -> bool {
        self.cells[(row * self.width() + col) as usize]
    }

    pub fn active_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// `(dx, dy)` offsets from the center for every set cell.
    pub fn offsets(&self) -> Vec<(i64, i64)> {
        let mut offsets = Vec::with_capacity(self.active_count());
        for row in 0..self.height() {
            for col in 0..self.width() {
                if self.is_set(col, row) {
                    offsets.push((
                        col as i64 - self.radius_x as i64,
                        row as i64 - self.radius_y as i64,
                    ));
                }
            }
        }
        offsets
    }
}
