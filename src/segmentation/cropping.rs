//! # Ordering and Cropping
//!
//! Puts components into left-to-right reading order and copies each glyph
//! out of the source raster. Ordering assumes a single horizontal line of
//! text; it is not a layout solver.

use std::time::Instant;

use crate::errors::{SegmentationError, SegmentationResult};
use crate::raster::Raster;

use super::types::{ComponentSet, GlyphCrop};

/// Sorts components by x, then y, then discovery index.
pub fn order_components(set: ComponentSet) -> ComponentSet {
    let mut components = set.components().to_vec();
    components.sort_by_key(|c| (c.bbox.x, c.bbox.y, c.discovery_index));
    ComponentSet::new(components)
}

/// Orders `components` and deep-copies each box out of `source`.
///
/// `source` is the raster the mask was computed from, before any
/// binarization, and may be grayscale or color. Crops are numbered from
/// zero in reading order.
///
/// # Errors
///
/// `OutOfBounds` when a box does not fit inside `source`, which means the
/// mask and the source raster disagree in size. Nothing is returned in that
/// case, not even the crops that did fit.
pub fn order_and_crop(source: &Raster, components: &ComponentSet) -> SegmentationResult<Vec<GlyphCrop>> {
    let start_time = Instant::now();
    let ordered = order_components(components.clone());

    if let Some(outside) = ordered.iter().find(|c| !source.contains(&c.bbox)) {
        return Err(SegmentationError::OutOfBounds {
            bbox: outside.bbox,
            width: source.width(),
            height: source.height(),
        });
    }

    let crops = ordered
        .iter()
        .enumerate()
        .map(|(index, component)| {
            Ok(GlyphCrop {
                index,
                bbox: component.bbox,
                image: source.crop(&component.bbox)?,
            })
        })
        .collect::<SegmentationResult<Vec<_>>>()?;

    tracing::debug!(
        target: "glyph_segmentation",
        "Cropped {} glyphs in {}ms from {}x{} source",
        crops.len(),
        start_time.elapsed().as_millis(),
        source.width(),
        source.height()
    );

    Ok(crops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::types::{BoundingBox, Component};

    fn component(x: u32, y: u32, discovery_index: usize) -> Component {
        Component {
            bbox: BoundingBox::new(x, y, 2, 2),
            area: 4,
            discovery_index,
        }
    }

    fn numbered_source(width: u32, height: u32) -> Raster {
        let data = (0..width * height).map(|v| (v % 251) as u8).collect();
        Raster::from_gray(width, height, data).unwrap()
    }

    #[test]
    fn test_order_by_x_then_y_then_discovery() {
        let set = ComponentSet::new(vec![
            component(10, 5, 0),
            component(3, 9, 1),
            component(3, 1, 2),
            component(10, 5, 3),
        ]);
        let ordered = order_components(set);
        let keys: Vec<_> = ordered
            .iter()
            .map(|c| (c.bbox.x, c.bbox.y, c.discovery_index))
            .collect();
        assert_eq!(keys, vec![(3, 1, 2), (3, 9, 1), (10, 5, 0), (10, 5, 3)]);
    }

    #[test]
    fn test_crops_are_indexed_in_reading_order() {
        let source = numbered_source(20, 10);
        let set = ComponentSet::new(vec![component(12, 2, 0), component(1, 4, 1)]);
        let crops = order_and_crop(&source, &set).unwrap();
        assert_eq!(crops.len(), 2);
        assert_eq!(crops[0].index, 0);
        assert_eq!(crops[0].bbox.x, 1);
        assert_eq!(crops[1].index, 1);
        assert_eq!(crops[1].bbox.x, 12);
    }

    #[test]
    fn test_crop_is_exact_copy() {
        let source = numbered_source(20, 10);
        let set = ComponentSet::new(vec![component(4, 3, 0)]);
        let crops = order_and_crop(&source, &set).unwrap();
        let crop = &crops[0].image;
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(crop.pixel(x, y), source.pixel(4 + x, 3 + y));
            }
        }
    }

    #[test]
    fn test_box_outside_source_fails() {
        let source = numbered_source(8, 8);
        let set = ComponentSet::new(vec![component(1, 1, 0), component(7, 7, 1)]);
        assert!(matches!(
            order_and_crop(&source, &set),
            Err(SegmentationError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_empty_set_gives_no_crops() {
        let source = numbered_source(8, 8);
        let crops = order_and_crop(&source, &ComponentSet::default()).unwrap();
        assert!(crops.is_empty());
    }
}
