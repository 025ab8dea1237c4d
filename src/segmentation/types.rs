//! # Shared Types for Glyph Segmentation
//!
//! Geometry, configuration enums and result types passed between the
//! segmentation stages.

use serde::{Deserialize, Serialize};

use crate::errors::{SegmentationError, SegmentationResult};
use crate::raster::Raster;

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Binarization strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BinarizationMode {
    /// Global threshold: pixels `>= threshold` become foreground.
    Fixed { threshold: i32 },
    /// Gaussian-weighted local threshold with inverse polarity: pixels
    /// darker than `mean - bias` become foreground.
    Adaptive { window_size: i32, bias: f32 },
}

impl BinarizationMode {
    pub const DEFAULT_THRESHOLD: i32 = 128;
    pub const DEFAULT_WINDOW_SIZE: i32 = 11;
    pub const DEFAULT_BIAS: f32 = 2.0;

    pub fn fixed_default() -> Self {
        BinarizationMode::Fixed {
            threshold: Self::DEFAULT_THRESHOLD,
        }
    }

    pub fn adaptive_default() -> Self {
        BinarizationMode::Adaptive {
            window_size: Self::DEFAULT_WINDOW_SIZE,
            bias: Self::DEFAULT_BIAS,
        }
    }

    /// Rejects out-of-range thresholds and even or non-positive windows.
    pub fn validate(&self) -> SegmentationResult<()> {
        match *self {
            BinarizationMode::Fixed { threshold } => {
                if !(0..=255).contains(&threshold) {
                    return Err(SegmentationError::invalid(
                        "threshold",
                        threshold,
                        "must be between 0 and 255",
                    ));
                }
            }
            BinarizationMode::Adaptive { window_size, bias } => {
                if window_size <= 0 {
                    return Err(SegmentationError::invalid(
                        "window_size",
                        window_size,
                        "must be positive",
                    ));
                }
                if window_size % 2 == 0 {
                    return Err(SegmentationError::invalid(
                        "window_size",
                        window_size,
                        "must be odd",
                    ));
                }
                if !bias.is_finite() {
                    return Err(SegmentationError::invalid("bias", bias, "must be finite"));
                }
            }
        }
        Ok(())
    }
}

impl Default for BinarizationMode {
    fn default() -> Self {
        Self::fixed_default()
    }
}

/// Shape of a structuring element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelShape {
    Rectangle,
    Cross,
    Ellipse,
}

/// Morphological operation applied by one plan step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MorphOperation {
    Erode,
    Dilate,
}

/// One entry of a morphological plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorphStep {
    pub operation: MorphOperation,
    pub shape: KernelShape,
    /// Horizontal radius; kernel width is `2 * radius_x + 1`
    pub radius_x: i32,
    /// Vertical radius; kernel height is `2 * radius_y + 1`
    pub radius_y: i32,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
}

fn default_iterations() -> u32 {
    1
}

impl MorphStep {
    /// Step with a square (isotropic) kernel.
    pub fn new(operation: MorphOperation, shape: KernelShape, radius: i32, iterations: u32) -> Self {
        Self {
            operation,
            shape,
            radius_x: radius,
            radius_y: radius,
            iterations,
        }
    }

    pub fn erode(shape: KernelShape, radius: i32) -> Self {
        Self::new(MorphOperation::Erode, shape, radius, 1)
    }

    pub fn dilate(shape: KernelShape, radius: i32) -> Self {
        Self::new(MorphOperation::Dilate, shape, radius, 1)
    }

    pub fn with_radii(mut self, radius_x: i32, radius_y: i32) -> Self {
        self.radius_x = radius_x;
        self.radius_y = radius_y;
        self
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }
}

/// Pixel adjacency used when grouping foreground into components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Connectivity {
    #[serde(rename = "4")]
    Four,
    #[default]
    #[serde(rename = "8")]
    Eight,
}

/// A connected foreground region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    pub bbox: BoundingBox,
    /// Number of foreground pixels in the region
    pub area: u64,
    /// Raster-scan rank of the region's first pixel
    pub discovery_index: usize,
}

/// Components found by one extraction call, geometry only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentSet {
    components: Vec<Component>,
}

impl ComponentSet {
    pub fn new(components: Vec<Component>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn boxes(&self) -> Vec<BoundingBox> {
        self.components.iter().map(|c| c.bbox).collect()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Sum of the regions' foreground pixel counts.
    pub fn total_area(&self) -> u64 {
        self.components.iter().map(|c| c.area).sum()
    }

    /// Turns an empty set into [`SegmentationError::EmptyResult`].
    pub fn require_non_empty(&self) -> SegmentationResult<&Self> {
        if self.is_empty() {
            Err(SegmentationError::EmptyResult)
        } else {
            Ok(self)
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Component> {
        self.components.iter()
    }
}

impl<'a> IntoIterator for &'a ComponentSet {
    type Item = &'a Component;
    type IntoIter = std::slice::Iter<'a, Component>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.iter()
    }
}

/// An ordered glyph cut out of the source raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphCrop {
    /// Zero-based position in reading order
    pub index: usize,
    /// Rectangle of the source raster the glyph was copied from
    pub bbox: BoundingBox,
    /// Owned copy of the source pixels
    pub image: Raster,
}
