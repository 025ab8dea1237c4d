//! # Glyph Segmentation Pipeline
//!
//! Composes the segmentation stages into one run:
//! grayscale reduction → optional separator lines → binarization →
//! morphological plan → component extraction → ordering and cropping.
//!
//! Each run owns all of its buffers, so separate [`GlyphSegmenter`] calls
//! can proceed on different threads without coordination.

use std::time::Instant;

use crate::errors::{error_logging, SegmentationResult};
use crate::raster::{BinaryMask, Raster};
use crate::segmentation::kernel::{make_kernel_xy, StructuringElement};
use crate::segmentation::morphology::apply_step;
use crate::segmentation::types::{ComponentSet, GlyphCrop, MorphOperation, MorphStep};
use crate::segmentation::{binarize, extract_components, order_and_crop};
use crate::segmentation_config::SegmentationConfig;

/// Output of one segmentation run.
#[derive(Debug, Clone)]
pub struct SegmentationOutcome {
    /// Glyphs in reading order
    pub glyphs: Vec<GlyphCrop>,
    /// Components the glyphs were cut from, in the same order
    pub components: ComponentSet,
    /// Mask the components were extracted from
    pub mask: BinaryMask,
    /// Named intermediate masks, only filled when `keep_intermediates` is set
    pub intermediates: Vec<(String, BinaryMask)>,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}

impl SegmentationOutcome {
    /// True when the source held no glyphs; a blank page is valid input.
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// Validated, reusable segmentation pipeline.
#[derive(Debug, Clone)]
pub struct GlyphSegmenter {
    config: SegmentationConfig,
    kernels: Vec<(MorphStep, StructuringElement)>,
}

impl GlyphSegmenter {
    /// Validates `config` and prebuilds the kernels of its plan.
    pub fn new(config: SegmentationConfig) -> SegmentationResult<Self> {
        config.validate()?;
        let kernels = config
            .morphology
            .iter()
            .map(|step| Ok((*step, make_kernel_xy(step.shape, step.radius_x, step.radius_y)?)))
            .collect::<SegmentationResult<Vec<_>>>()?;
        Ok(Self { config, kernels })
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    /// Runs the full pipeline on `source`.
    ///
    /// Crops are copied from `source` itself, in its original channel
    /// layout, never from the binarized intermediate.
    pub fn segment(&self, source: &Raster) -> SegmentationResult<SegmentationOutcome> {
        let start_time = Instant::now();
        metrics::counter!("glyph_segmentation_runs_total").increment(1);

        match self.run(source) {
            Ok((mask, intermediates)) => {
                let components = extract_components(&mask, self.config.connectivity);
                let glyphs = order_and_crop(source, &components).inspect_err(|e| {
                    error_logging::log_segmentation_error(
                        e,
                        "order_and_crop",
                        Some((source.width(), source.height())),
                    )
                })?;

                metrics::counter!("glyph_segmentation_glyphs_total").increment(glyphs.len() as u64);
                if glyphs.is_empty() {
                    metrics::counter!("glyph_segmentation_empty_total").increment(1);
                    tracing::warn!(
                        target: "glyph_segmentation",
                        width = source.width(),
                        height = source.height(),
                        "No glyph components found"
                    );
                }

                let processing_time = start_time.elapsed();
                metrics::histogram!("glyph_segmentation_duration_seconds")
                    .record(processing_time.as_secs_f64());
                let processing_time_ms = processing_time.as_millis() as u32;
                tracing::info!(
                    target: "glyph_segmentation",
                    glyphs = glyphs.len(),
                    width = source.width(),
                    height = source.height(),
                    channels = source.channels(),
                    processing_time_ms,
                    "Glyph segmentation completed"
                );

                Ok(SegmentationOutcome {
                    glyphs,
                    components,
                    mask,
                    intermediates,
                    processing_time_ms,
                })
            }
            Err(e) => {
                metrics::histogram!("glyph_segmentation_duration_seconds")
                    .record(start_time.elapsed().as_secs_f64());
                error_logging::log_segmentation_error(
                    &e,
                    "shape_mask",
                    Some((source.width(), source.height())),
                );
                Err(e)
            }
        }
    }

    /// Binarizes and shapes `source` without extracting components.
    ///
    /// This is what a parameter-tuning view renders after every change.
    pub fn preview(&self, source: &Raster) -> SegmentationResult<BinaryMask> {
        self.run(source).map(|(mask, _)| mask)
    }

    /// Debug name of the mask produced by plan step `index`.
    ///
    /// `eroded` / `dilated` when the operation occurs once in the plan,
    /// prefixed with the step index otherwise.
    fn stage_name(&self, index: usize) -> String {
        let operation = self.kernels[index].0.operation;
        let name = match operation {
            MorphOperation::Erode => "eroded",
            MorphOperation::Dilate => "dilated",
        };
        let occurrences = self
            .kernels
            .iter()
            .filter(|(step, _)| step.operation == operation)
            .count();
        if occurrences == 1 {
            name.to_string()
        } else {
            format!("{}_{}", index, name)
        }
    }

    fn run(&self, source: &Raster) -> SegmentationResult<(BinaryMask, Vec<(String, BinaryMask)>)> {
        let keep = self.config.keep_intermediates;
        let mut intermediates = Vec::new();

        let mut gray = source.to_grayscale();
        if !self.config.separator_columns.is_empty() {
            gray = gray.with_vertical_separators(
                &self.config.separator_columns,
                self.config.separator_value,
            )?;
        }

        let mut mask = binarize(&gray, &self.config.binarization)?;
        if keep {
            intermediates.push(("binary".to_string(), mask.clone()));
        }

        for (index, (step, kernel)) in self.kernels.iter().enumerate() {
            mask = apply_step(&mask, step, kernel)?;
            tracing::debug!(
                target: "glyph_segmentation",
                "Morphology step {}: operation={:?}, kernel={}x{}, iterations={}, foreground={}",
                index,
                step.operation,
                kernel.width(),
                kernel.height(),
                step.iterations,
                mask.foreground_count()
            );
            if keep {
                intermediates.push((self.stage_name(index), mask.clone()));
            }
        }

        Ok((mask, intermediates))
    }
}
