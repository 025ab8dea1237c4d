//! # Glyph Segmenter
//!
//! Cuts individual glyphs out of a scanned single-line text image and hands
//! them back as ordered, owned crops, ready for a recognizer or for manual
//! inspection.
//!
//! The pipeline runs binarization, morphological shaping, connected
//! component extraction, then ordering and cropping. Every stage is a pure
//! function over in-memory buffers; persistence lives in [`output`].

pub mod errors;
pub mod observability;
pub mod output;
pub mod pipeline;
pub mod raster;
pub mod segmentation;
pub mod segmentation_config;

// Re-export types for easier access
pub use errors::{SegmentationError, SegmentationResult};
pub use pipeline::{GlyphSegmenter, SegmentationOutcome};
pub use raster::{BinaryMask, Raster};
pub use segmentation_config::SegmentationConfig;
