//! # Output Workspace
//!
//! Persists segmentation results to disk: prepares the output directory,
//! removes crops left over from an earlier run and writes one PNG per glyph
//! named after its index.

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{error_logging, SegmentationError, SegmentationResult};
use crate::raster::BinaryMask;
use crate::segmentation::types::GlyphCrop;

/// Default file name prefix for glyph crops (`letter_0.png`, `letter_1.png`, ...)
pub const DEFAULT_PREFIX: &str = "letter";

/// Directory receiving the crops of one run.
#[derive(Debug, Clone)]
pub struct OutputWorkspace {
    dir: PathBuf,
    prefix: String,
}

impl OutputWorkspace {
    /// Creates `dir` if needed and deletes stale `{prefix}_*.png` files.
    ///
    /// Returns the workspace and the number of stale files removed.
    pub fn prepare(dir: impl AsRef<Path>, prefix: &str) -> SegmentationResult<(Self, usize)> {
        let dir = dir.as_ref().to_path_buf();
        if prefix.is_empty() || prefix.contains(['/', '\\']) {
            return Err(SegmentationError::invalid(
                "prefix",
                prefix,
                "must be a non-empty file name component",
            ));
        }

        fs::create_dir_all(&dir).map_err(|e| {
            error_logging::log_output_error(&e, "create_dir", dir.to_str());
            SegmentationError::Io(format!("failed to create {}: {}", dir.display(), e))
        })?;

        let workspace = Self {
            dir,
            prefix: prefix.to_string(),
        };
        let removed = workspace.remove_stale()?;
        Ok((workspace, removed))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a glyph with the given index is written to.
    pub fn glyph_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}_{}.png", self.prefix, index))
    }

    fn is_stale_crop(&self, file_name: &str) -> bool {
        file_name
            .strip_prefix(&self.prefix)
            .and_then(|rest| rest.strip_prefix('_'))
            .and_then(|rest| rest.strip_suffix(".png"))
            .is_some()
    }

    fn remove_stale(&self) -> SegmentationResult<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if entry.file_type()?.is_file() && self.is_stale_crop(name) {
                fs::remove_file(entry.path())?;
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::debug!(
                target: "glyph_output",
                "Removed {} stale crops from {}",
                removed,
                self.dir.display()
            );
        }
        Ok(removed)
    }

    /// Writes every glyph as `{prefix}_{index}.png`, returning the paths in order.
    pub fn write_glyphs(&self, glyphs: &[GlyphCrop]) -> SegmentationResult<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(glyphs.len());
        for glyph in glyphs {
            let path = self.glyph_path(glyph.index);
            glyph.image.to_dynamic_image()?.save(&path).map_err(|e| {
                error_logging::log_output_error(&e, "write_glyph", path.to_str());
                SegmentationError::from(e)
            })?;
            written.push(path);
        }

        tracing::info!(
            target: "glyph_output",
            count = written.len(),
            dir = %self.dir.display(),
            "Glyph crops written"
        );
        Ok(written)
    }

    /// Writes intermediate masks as `tmp_{stage}.png` for inspection.
    pub fn write_debug_masks(&self, masks: &[(String, BinaryMask)]) -> SegmentationResult<Vec<PathBuf>> {
        masks
            .iter()
            .map(|(stage, mask)| {
                let path = self.dir.join(format!("tmp_{}.png", stage));
                mask.to_gray_image().save(&path)?;
                Ok(path)
            })
            .collect()
    }
}
