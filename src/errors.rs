//! # Segmentation Error Types
//!
//! This module defines the error type shared by every stage of the glyph
//! segmentation pipeline and by the thin persistence layer around it.

use std::fmt;

use crate::segmentation::types::BoundingBox;

/// Errors raised by the segmentation pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentationError {
    /// A configuration value is outside its accepted range
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },
    /// Raster geometry or channel count does not fit the requested operation
    DimensionMismatch { expected: String, actual: String },
    /// A bounding box is not contained in the raster it is cut from
    OutOfBounds {
        bbox: BoundingBox,
        width: u32,
        height: u32,
    },
    /// No glyph components were found
    EmptyResult,
    /// Image decoding or encoding failed
    Image(String),
    /// Output workspace file system failure
    Io(String),
}

impl SegmentationError {
    /// Shorthand for building an [`SegmentationError::InvalidParameter`].
    pub fn invalid(name: &'static str, value: impl fmt::Display, reason: impl Into<String>) -> Self {
        SegmentationError::InvalidParameter {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SegmentationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentationError::InvalidParameter { name, value, reason } => {
                write!(f, "[INVALID_PARAMETER] {} = {} ({})", name, value, reason)
            }
            SegmentationError::DimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "[DIMENSION_MISMATCH] expected {}, got {}",
                    expected, actual
                )
            }
            SegmentationError::OutOfBounds {
                bbox,
                width,
                height,
            } => write!(
                f,
                "[OUT_OF_BOUNDS] box ({}, {}, {}x{}) exceeds raster {}x{}",
                bbox.x, bbox.y, bbox.width, bbox.height, width, height
            ),
            SegmentationError::EmptyResult => {
                write!(f, "[EMPTY_RESULT] no glyph components found")
            }
            SegmentationError::Image(msg) => write!(f, "[IMAGE] {}", msg),
            SegmentationError::Io(msg) => write!(f, "[IO] {}", msg),
        }
    }
}

impl std::error::Error for SegmentationError {}

impl From<image::ImageError> for SegmentationError {
    fn from(err: image::ImageError) -> Self {
        SegmentationError::Image(err.to_string())
    }
}

impl From<std::io::Error> for SegmentationError {
    fn from(err: std::io::Error) -> Self {
        SegmentationError::Io(err.to_string())
    }
}

/// Result type alias for convenience
pub type SegmentationResult<T> = Result<T, SegmentationError>;

/// Structured error logging shared by the pipeline and the binary
pub mod error_logging {
    use tracing::error;

    /// Log a failed segmentation stage with the raster it was working on
    pub fn log_segmentation_error(
        error: &impl std::fmt::Display,
        stage: &str,
        dimensions: Option<(u32, u32)>,
    ) {
        error!(
            error = %error,
            stage = %stage,
            dimensions = ?dimensions,
            "Glyph segmentation failed"
        );
    }

    /// Log output workspace errors with path context
    pub fn log_output_error(error: &impl std::fmt::Display, operation: &str, path: Option<&str>) {
        error!(
            error = %error,
            operation = %operation,
            path = ?path,
            "Output workspace operation failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_display() {
        let err = SegmentationError::invalid("threshold", 256, "must be between 0 and 255");
        assert_eq!(
            err.to_string(),
            "[INVALID_PARAMETER] threshold = 256 (must be between 0 and 255)"
        );
    }

    #[test]
    fn test_out_of_bounds_display() {
        let err = SegmentationError::OutOfBounds {
            bbox: BoundingBox::new(5, 6, 10, 10),
            width: 8,
            height: 8,
        };
        assert!(err.to_string().contains("box (5, 6, 10x10) exceeds raster 8x8"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: SegmentationError = io.into();
        assert!(matches!(err, SegmentationError::Io(ref m) if m.contains("missing")));
    }
}
