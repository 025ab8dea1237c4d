//! # Glyph Segmentation Stages
//!
//! The individual stages of the segmentation pipeline, each a pure function
//! from an input buffer to a new output buffer:
//! - `thresholding`: fixed and Gaussian adaptive binarization
//! - `kernel`: structuring element factory
//! - `morphology`: erosion, dilation and plan execution
//! - `components`: external connected component extraction
//! - `cropping`: reading-order sort and source-raster crops
//! - `types`: shared geometry, enums and result types

pub mod components;
pub mod cropping;
pub mod kernel;
pub mod morphology;
pub mod thresholding;
pub mod types;

pub use types::{
    BinarizationMode, BoundingBox, Component, ComponentSet, Connectivity, GlyphCrop, KernelShape,
    MorphOperation, MorphStep,
};

pub use components::extract_components;
pub use cropping::{order_and_crop, order_components};
pub use kernel::{make_kernel, make_kernel_xy, StructuringElement};
pub use morphology::{apply_plan, closing, dilate, erode, opening};
pub use thresholding::binarize;
