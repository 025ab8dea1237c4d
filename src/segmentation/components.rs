//! # Component Extraction
//!
//! Groups foreground pixels into connected regions and reports one bounding
//! box per external region. Regions sitting inside the hole of another
//! region (the dot drawn inside an "O", for example) are dropped, as are the
//! holes themselves.

use std::collections::HashMap;
use std::time::Instant;

use image::Luma;
use imageproc::region_labelling::{connected_components, Connectivity as LabelConnectivity};

use crate::raster::{BinaryMask, BACKGROUND, FOREGROUND};

use super::cropping::order_components;
use super::types::{BoundingBox, Component, ComponentSet, Connectivity};

#[derive(Debug)]
struct RegionStats {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    area: u64,
    discovery_index: usize,
    external: bool,
}

impl RegionStats {
    fn new(x: u32, y: u32, discovery_index: usize) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            area: 0,
            discovery_index,
            external: false,
        }
    }

    fn add(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.area += 1;
    }

    fn bbox(&self) -> BoundingBox {
        BoundingBox::new(
            self.min_x,
            self.min_y,
            self.max_x - self.min_x + 1,
            self.max_y - self.min_y + 1,
        )
    }
}

/// Finds the external connected foreground regions of `mask`.
///
/// The returned set is already in reading order (x, then y, then discovery
/// index). An all-background mask yields an empty set.
pub fn extract_components(mask: &BinaryMask, connectivity: Connectivity) -> ComponentSet {
    let start_time = Instant::now();
    let (width, height) = (mask.width(), mask.height());
    if width == 0 || height == 0 {
        return ComponentSet::default();
    }

    let gray = mask.to_gray_image();
    let labels = connected_components(&gray, to_label_connectivity(connectivity), Luma([BACKGROUND]));
    let outer_background = outer_background(mask, connectivity);

    let mut regions: HashMap<u32, RegionStats> = HashMap::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let label = label[0];
        if label == 0 {
            continue;
        }
        let next_index = regions.len();
        let region = regions
            .entry(label)
            .or_insert_with(|| RegionStats::new(x, y, next_index));
        region.add(x, y);
        if !region.external && touches_outside(x, y, width, height, &outer_background) {
            region.external = true;
        }
    }

    let total = regions.len();
    let components: Vec<Component> = regions
        .into_values()
        .filter(|r| r.external && r.area > 0)
        .map(|r| Component {
            bbox: r.bbox(),
            area: r.area,
            discovery_index: r.discovery_index,
        })
        .collect();

    let set = order_components(ComponentSet::new(components));

    tracing::debug!(
        target: "glyph_segmentation",
        "Component extraction completed in {}ms: connectivity={:?}, regions={}, external={}",
        start_time.elapsed().as_millis(),
        connectivity,
        total,
        set.len()
    );

    set
}

fn to_label_connectivity(connectivity: Connectivity) -> LabelConnectivity {
    match connectivity {
        Connectivity::Four => LabelConnectivity::Four,
        Connectivity::Eight => LabelConnectivity::Eight,
    }
}

/// Marks background pixels reachable from the border.
///
/// Background uses the connectivity complementary to the foreground so that
/// an 8-connected ring really encloses its hole.
fn outer_background(mask: &BinaryMask, connectivity: Connectivity) -> Vec<bool> {
    let background = image::GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        Luma([if mask.is_foreground(x, y) { BACKGROUND } else { FOREGROUND }])
    });
    let complementary = match connectivity {
        Connectivity::Four => LabelConnectivity::Eight,
        Connectivity::Eight => LabelConnectivity::Four,
    };
    let labels = connected_components(&background, complementary, Luma([BACKGROUND]));

    let (width, height) = (mask.width(), mask.height());
    let mut border_labels = std::collections::HashSet::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let on_border = x == 0 || y == 0 || x + 1 == width || y + 1 == height;
        if on_border && label[0] != 0 {
            border_labels.insert(label[0]);
        }
    }

    labels
        .pixels()
        .map(|label| label[0] != 0 && border_labels.contains(&label[0]))
        .collect()
}

/// Whether a foreground pixel lies on the raster edge or 4-touches outer background.
///
/// A region whose outline meets outer background always has such a
/// 4-adjacent pair, for either foreground connectivity.
fn touches_outside(x: u32, y: u32, width: u32, height: u32, outer: &[bool]) -> bool {
    if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
        return true;
    }
    let idx = |x: u32, y: u32| y as usize * width as usize + x as usize;
    outer[idx(x - 1, y)] || outer[idx(x + 1, y)] || outer[idx(x, y - 1)] || outer[idx(x, y + 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squares(width: u32, height: u32, squares: &[(u32, u32, u32)]) -> BinaryMask {
        BinaryMask::from_fn(width, height, |x, y| {
            squares
                .iter()
                .any(|&(sx, sy, size)| (sx..sx + size).contains(&x) && (sy..sy + size).contains(&y))
        })
    }

    #[test]
    fn test_empty_mask_yields_empty_set() {
        let mask = BinaryMask::empty(50, 20);
        let set = extract_components(&mask, Connectivity::Eight);
        assert!(set.is_empty());
    }

    #[test]
    fn test_two_squares() {
        let mask = squares(100, 40, &[(80, 10, 10), (0, 10, 10)]);
        let set = extract_components(&mask, Connectivity::Eight);
        assert_eq!(set.boxes(), vec![BoundingBox::new(0, 10, 10, 10), BoundingBox::new(80, 10, 10, 10)]);
        assert_eq!(set.total_area(), 200);
    }

    #[test]
    fn test_diagonal_touch_depends_on_connectivity() {
        let mask = squares(10, 10, &[(1, 1, 2), (3, 3, 2)]);
        assert_eq!(extract_components(&mask, Connectivity::Eight).len(), 1);
        assert_eq!(extract_components(&mask, Connectivity::Four).len(), 2);
    }

    #[test]
    fn test_ring_reports_single_outer_box() {
        // 7x7 ring with a hole and a dot inside the hole
        let mask = BinaryMask::from_fn(15, 15, |x, y| {
            let on_ring = (3..10).contains(&x)
                && (3..10).contains(&y)
                && (x == 3 || x == 9 || y == 3 || y == 9);
            on_ring || (x == 6 && y == 6)
        });
        let set = extract_components(&mask, Connectivity::Eight);
        assert_eq!(set.len(), 1);
        assert_eq!(set.boxes()[0], BoundingBox::new(3, 3, 7, 7));
        assert_eq!(set.components()[0].area, 24);
    }

    #[test]
    fn test_region_touching_border_is_external() {
        let mask = squares(10, 10, &[(0, 0, 3)]);
        let set = extract_components(&mask, Connectivity::Eight);
        assert_eq!(set.boxes(), vec![BoundingBox::new(0, 0, 3, 3)]);
    }

    #[test]
    fn test_discovery_index_follows_raster_scan() {
        // Lower square is further left but discovered second
        let mask = squares(30, 30, &[(20, 2, 3), (5, 20, 3)]);
        let set = extract_components(&mask, Connectivity::Eight);
        let first = set.components()[0];
        assert_eq!(first.bbox.x, 5);
        assert_eq!(first.discovery_index, 1);
    }
}
