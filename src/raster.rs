//! # Raster Buffers
//!
//! In-memory pixel buffers shared by every segmentation stage. A [`Raster`]
//! holds the caller's source pixels (grayscale or 3-channel color) and a
//! [`BinaryMask`] holds the two-valued output of binarization and
//! morphology. Both are immutable in shape: every transformation returns a
//! new buffer.

use image::{DynamicImage, GrayImage, Luma, RgbImage};

use crate::errors::{SegmentationError, SegmentationResult};
use crate::segmentation::types::BoundingBox;

/// Sample value of a foreground mask pixel.
pub const FOREGROUND: u8 = 255;
/// Sample value of a background mask pixel.
pub const BACKGROUND: u8 = 0;

/// Row-major 8-bit raster with 1 (grayscale) or 3 (color) channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl Raster {
    /// Wraps an existing sample buffer.
    ///
    /// Fails with `DimensionMismatch` when the channel count is not 1 or 3,
    /// or when `data.len() != width * height * channels`.
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> SegmentationResult<Self> {
        if channels != 1 && channels != 3 {
            return Err(SegmentationError::DimensionMismatch {
                expected: "1 or 3 channels".to_string(),
                actual: format!("{} channels", channels),
            });
        }
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(SegmentationError::DimensionMismatch {
                expected: format!("{} samples ({}x{}x{})", expected, width, height, channels),
                actual: format!("{} samples", data.len()),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Single-channel raster from a row-major intensity buffer.
    pub fn from_gray(width: u32, height: u32, data: Vec<u8>) -> SegmentationResult<Self> {
        Self::new(width, height, 1, data)
    }

    /// Raster of the given shape with every sample set to `value`.
    pub fn filled(width: u32, height: u32, channels: u8, value: u8) -> SegmentationResult<Self> {
        let len = width as usize * height as usize * channels as usize;
        Self::new(width, height, channels, vec![value; len])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Raw row-major samples.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_grayscale(&self) -> bool {
        self.channels == 1
    }

    /// Samples of the pixel at `(x, y)`, one per channel.
    ///
    /// Panics when the coordinate lies outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let start = self.offset(x, y);
        &self.data[start..start + self.channels as usize]
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "({}, {}) outside {}x{} raster",
            x,
            y,
            self.width,
            self.height
        );
        (y as usize * self.width as usize + x as usize) * self.channels as usize
    }

    /// Reduces a color raster to one luma channel (BT.601 weights).
    ///
    /// Grayscale rasters come back as a plain copy.
    pub fn to_grayscale(&self) -> Raster {
        if self.is_grayscale() {
            return self.clone();
        }
        let data = self
            .data
            .chunks_exact(3)
            .map(|rgb| {
                let luma = 0.299 * rgb[0] as f32 + 0.587 * rgb[1] as f32 + 0.114 * rgb[2] as f32;
                luma.round().clamp(0.0, 255.0) as u8
            })
            .collect();
        Raster {
            width: self.width,
            height: self.height,
            channels: 1,
            data,
        }
    }

    /// Whether `bbox` lies completely inside this raster.
    pub fn contains(&self, bbox: &BoundingBox) -> bool {
        bbox.width > 0
            && bbox.height > 0
            && bbox.right() <= self.width as u64
            && bbox.bottom() <= self.height as u64
    }

    /// Deep copy of the rectangle covered by `bbox`.
    pub fn crop(&self, bbox: &BoundingBox) -> SegmentationResult<Raster> {
        if !self.contains(bbox) {
            return Err(SegmentationError::OutOfBounds {
                bbox: *bbox,
                width: self.width,
                height: self.height,
            });
        }

        let row_len = bbox.width as usize * self.channels as usize;
        let mut data = Vec::with_capacity(row_len * bbox.height as usize);
        for y in bbox.y..bbox.y + bbox.height {
            let start = self.offset(bbox.x, y);
            data.extend_from_slice(&self.data[start..start + row_len]);
        }

        Ok(Raster {
            width: bbox.width,
            height: bbox.height,
            channels: self.channels,
            data,
        })
    }

    /// Draws full-height vertical lines of intensity `value` at each column.
    ///
    /// Used to force a split between glyphs that touch on a known column
    /// before the mask is shaped. Only defined for grayscale rasters.
    pub fn with_vertical_separators(&self, columns: &[u32], value: u8) -> SegmentationResult<Raster> {
        if !self.is_grayscale() {
            return Err(SegmentationError::DimensionMismatch {
                expected: "1 channel".to_string(),
                actual: format!("{} channels", self.channels),
            });
        }
        if let Some(&column) = columns.iter().find(|&&c| c >= self.width) {
            return Err(SegmentationError::invalid(
                "separator_columns",
                column,
                format!("column must be below raster width {}", self.width),
            ));
        }

        let mut data = self.data.clone();
        for &column in columns {
            for y in 0..self.height {
                data[self.offset(column, y)] = value;
            }
        }
        Ok(Raster {
            width: self.width,
            height: self.height,
            channels: 1,
            data,
        })
    }

    /// Converts a decoded image, keeping grayscale images single-channel.
    ///
    /// Alpha is dropped and wider sample types are narrowed to 8 bits.
    pub fn from_dynamic_image(image: &DynamicImage) -> Raster {
        match image {
            DynamicImage::ImageLuma8(gray) => Raster {
                width: gray.width(),
                height: gray.height(),
                channels: 1,
                data: gray.as_raw().clone(),
            },
            DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLumaA16(_) => {
                let gray = image.to_luma8();
                Raster {
                    width: gray.width(),
                    height: gray.height(),
                    channels: 1,
                    data: gray.into_raw(),
                }
            }
            _ => {
                let rgb = image.to_rgb8();
                Raster {
                    width: rgb.width(),
                    height: rgb.height(),
                    channels: 3,
                    data: rgb.into_raw(),
                }
            }
        }
    }

    /// Converts back into an `image` buffer for encoding.
    pub fn to_dynamic_image(&self) -> SegmentationResult<DynamicImage> {
        let mismatch = || SegmentationError::Image(format!(
            "buffer does not fit a {}x{}x{} image",
            self.width, self.height, self.channels
        ));
        match self.channels {
            1 => GrayImage::from_raw(self.width, self.height, self.data.clone())
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(mismatch),
            _ => RgbImage::from_raw(self.width, self.height, self.data.clone())
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(mismatch),
        }
    }
}

/// Single-channel raster whose samples are exactly [`FOREGROUND`] or [`BACKGROUND`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl BinaryMask {
    /// All-background mask.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![BACKGROUND; width as usize * height as usize],
        }
    }

    /// Builds a mask by evaluating `is_foreground` at every pixel.
    pub fn from_fn(width: u32, height: u32, mut is_foreground: impl FnMut(u32, u32) -> bool) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(if is_foreground(x, y) { FOREGROUND } else { BACKGROUND });
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub(crate) fn from_bools(width: u32, height: u32, cells: &[bool]) -> Self {
        debug_assert_eq!(cells.len(), width as usize * height as usize);
        Self {
            width,
            height,
            data: cells
                .iter()
                .map(|&fg| if fg { FOREGROUND } else { BACKGROUND })
                .collect(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw row-major samples (0 or 255).
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Panics when the coordinate lies outside the mask.
    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        assert!(
            x < self.width && y < self.height,
            "({}, {}) outside {}x{} mask",
            x,
            y,
            self.width,
            self.height
        );
        self.data[y as usize * self.width as usize + x as usize] == FOREGROUND
    }

    /// Foreground test for signed coordinates; anything outside is background.
    pub(crate) fn is_foreground_at(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }
        self.is_foreground(x as u32, y as u32)
    }

    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&v| v == FOREGROUND).count()
    }

    /// Copies the mask into an `image` buffer for labelling or encoding.
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            Luma([self.data[y as usize * self.width as usize + x as usize]])
        })
    }

    /// The mask as a plain single-channel raster.
    pub fn to_raster(&self) -> Raster {
        Raster {
            width: self.width,
            height: self.height,
            channels: 1,
            data: self.data.clone(),
        }
    }
}
