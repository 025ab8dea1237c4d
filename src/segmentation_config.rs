//! # Segmentation Configuration Module
//!
//! This module defines the configuration surface of the glyph segmentation
//! pipeline: binarization mode, morphological plan, connectivity and the
//! optional separator-line augmentation. Configurations can be built in
//! code, loaded from JSON, or derived from environment variables.

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{SegmentationError, SegmentationResult};
use crate::segmentation::kernel::make_kernel_xy;
use crate::segmentation::types::{BinarizationMode, Connectivity, KernelShape, MorphStep};

// Calibration of the bundled plan; tuned for scanned single-line text
pub const DEFAULT_ERODE_RADII: (i32, i32) = (2, 3);
pub const DEFAULT_DILATE_RADII: (i32, i32) = (3, 4);
/// Upper bound on kernel radius accepted from configuration input
pub const MAX_KERNEL_RADIUS: i32 = 64;
/// Upper bound on iterations of a single plan step
pub const MAX_ITERATIONS: u32 = 32;
/// Upper bound on the adaptive binarization window
pub const MAX_ADAPTIVE_WINDOW: i32 = 255;

/// Full configuration of one segmentation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// How the grayscale raster is turned into a mask
    pub binarization: BinarizationMode,
    /// Ordered erode/dilate steps applied to the mask
    pub morphology: Vec<MorphStep>,
    /// Pixel adjacency for component extraction
    pub connectivity: Connectivity,
    /// Columns where a full-height separator line is drawn before binarization
    pub separator_columns: Vec<u32>,
    /// Gray level of the separator lines
    pub separator_value: u8,
    /// Keep every intermediate mask in the result (debug dumps, tuning previews)
    pub keep_intermediates: bool,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            binarization: BinarizationMode::adaptive_default(),
            morphology: vec![
                MorphStep::erode(KernelShape::Ellipse, 0)
                    .with_radii(DEFAULT_ERODE_RADII.0, DEFAULT_ERODE_RADII.1),
                MorphStep::dilate(KernelShape::Ellipse, 0)
                    .with_radii(DEFAULT_DILATE_RADII.0, DEFAULT_DILATE_RADII.1),
            ],
            connectivity: Connectivity::Eight,
            separator_columns: Vec::new(),
            separator_value: 255,
            keep_intermediates: false,
        }
    }
}

impl SegmentationConfig {
    /// Fixed threshold followed by a dilate-then-erode merge plan.
    ///
    /// Repeated dilation joins the vertically stacked fragments of a glyph
    /// (the dot of an "i", broken strokes) and the matching erosions give
    /// back the original width.
    pub fn merge_preset(threshold: i32, radius: i32, iterations: u32) -> Self {
        Self {
            binarization: BinarizationMode::Fixed { threshold },
            morphology: vec![
                MorphStep::dilate(KernelShape::Rectangle, radius).with_iterations(iterations),
                MorphStep::erode(KernelShape::Rectangle, radius).with_iterations(iterations),
            ],
            ..Self::default()
        }
    }

    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> SegmentationResult<Self> {
        let config: SegmentationConfig = serde_json::from_str(json).map_err(|e| {
            SegmentationError::invalid("config", "json", format!("failed to parse configuration: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> SegmentationResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SegmentationError::Io(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    /// Defaults overlaid with `GLYPH_*` environment variables.
    ///
    /// Recognized variables: `GLYPH_THRESHOLD_MODE` (`fixed` or `adaptive`),
    /// `GLYPH_FIXED_THRESHOLD`, `GLYPH_ADAPTIVE_WINDOW`, `GLYPH_ADAPTIVE_BIAS`
    /// and `GLYPH_CONNECTIVITY` (`4` or `8`). Unparsable values are errors,
    /// never silently replaced.
    pub fn from_env() -> SegmentationResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> SegmentationResult<Self> {
        let mut config = Self::default();

        let mode = lookup("GLYPH_THRESHOLD_MODE").unwrap_or_else(|| "adaptive".to_string());
        config.binarization = match mode.trim().to_lowercase().as_str() {
            "fixed" => BinarizationMode::Fixed {
                threshold: parse_var(&lookup, "GLYPH_FIXED_THRESHOLD", "threshold")?
                    .unwrap_or(BinarizationMode::DEFAULT_THRESHOLD),
            },
            "adaptive" => BinarizationMode::Adaptive {
                window_size: parse_var(&lookup, "GLYPH_ADAPTIVE_WINDOW", "window_size")?
                    .unwrap_or(BinarizationMode::DEFAULT_WINDOW_SIZE),
                bias: parse_var(&lookup, "GLYPH_ADAPTIVE_BIAS", "bias")?
                    .unwrap_or(BinarizationMode::DEFAULT_BIAS),
            },
            other => {
                return Err(SegmentationError::invalid(
                    "threshold_mode",
                    other,
                    "expected 'fixed' or 'adaptive'",
                ))
            }
        };

        if let Some(raw) = lookup("GLYPH_CONNECTIVITY") {
            config.connectivity = match raw.trim() {
                "4" => Connectivity::Four,
                "8" => Connectivity::Eight,
                other => {
                    return Err(SegmentationError::invalid(
                        "connectivity",
                        other,
                        "expected 4 or 8",
                    ))
                }
            };
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates every parameter up front so a run never fails half-way on
    /// a configuration error.
    pub fn validate(&self) -> SegmentationResult<()> {
        self.binarization.validate()?;
        if let BinarizationMode::Adaptive { window_size, .. } = self.binarization {
            if window_size > MAX_ADAPTIVE_WINDOW {
                return Err(SegmentationError::invalid(
                    "window_size",
                    window_size,
                    format!("adaptive window cannot exceed {}", MAX_ADAPTIVE_WINDOW),
                ));
            }
        }

        for step in &self.morphology {
            make_kernel_xy(step.shape, step.radius_x, step.radius_y)?;
            if step.radius_x > MAX_KERNEL_RADIUS || step.radius_y > MAX_KERNEL_RADIUS {
                return Err(SegmentationError::invalid(
                    "radius",
                    format!("{}x{}", step.radius_x, step.radius_y),
                    format!("kernel radius cannot exceed {}", MAX_KERNEL_RADIUS),
                ));
            }
            if step.iterations == 0 || step.iterations > MAX_ITERATIONS {
                return Err(SegmentationError::invalid(
                    "iterations",
                    step.iterations,
                    format!("must be between 1 and {}", MAX_ITERATIONS),
                ));
            }
        }

        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    name: &'static str,
) -> SegmentationResult<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| SegmentationError::invalid(name, raw, format!("{} is not a valid number", key))),
    }
}
