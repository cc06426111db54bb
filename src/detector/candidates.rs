use std::collections::HashMap;

use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};

use crate::config::DetectionConfig;

use super::types::{BoundingBox, Candidate, SearchRegion};

/// Bounding boxes of connected foreground regions, filtered by the inclusive
/// area and aspect-ratio bounds. Returned sorted topmost-then-leftmost so the
/// pipeline is deterministic for identical input.
pub fn extract(mask: &GrayImage, cfg: &DetectionConfig) -> Vec<BoundingBox> {
    if mask.width() == 0 || mask.height() == 0 {
        return Vec::new();
    }

    let labeled = connected_components(mask, Connectivity::Eight, Luma([0u8]));

    // label -> (min_x, min_y, max_x, max_y)
    let mut extents: HashMap<u32, (u32, u32, u32, u32)> = HashMap::new();
    for (x, y, label) in labeled.enumerate_pixels() {
        let label = label[0];
        if label == 0 {
            continue;
        }
        extents
            .entry(label)
            .and_modify(|(min_x, min_y, max_x, max_y)| {
                *min_x = (*min_x).min(x);
                *min_y = (*min_y).min(y);
                *max_x = (*max_x).max(x);
                *max_y = (*max_y).max(y);
            })
            .or_insert((x, y, x, y));
    }

    let mut boxes: Vec<BoundingBox> = extents
        .into_values()
        .map(|(min_x, min_y, max_x, max_y)| BoundingBox {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        })
        .filter(|b| {
            let area = b.area();
            if area < cfg.min_icon_area || area > cfg.max_icon_area {
                return false;
            }
            let aspect = b.aspect_ratio();
            cfg.min_aspect_ratio <= aspect && aspect <= cfg.max_aspect_ratio
        })
        .collect();

    boxes.sort_by_key(|b| (b.y, b.x));
    boxes
}

fn fill_ratio(mask: &GrayImage, bbox: &BoundingBox) -> f32 {
    let mut foreground = 0u32;
    for y in bbox.y..bbox.y + bbox.height {
        for x in bbox.x..bbox.x + bbox.width {
            if mask.get_pixel(x, y)[0] != 0 {
                foreground += 1;
            }
        }
    }
    foreground as f32 / bbox.area() as f32
}

/// True when `a` beats `b`: strictly greater score, or an exact score tie
/// broken leftmost-then-topmost so selection never depends on extraction
/// order.
fn beats(a: &Candidate, b: &Candidate) -> bool {
    if a.score() != b.score() {
        return a.score() > b.score();
    }
    (a.bbox.x, a.bbox.y) < (b.bbox.x, b.bbox.y)
}

/// Score surviving boxes by fill ratio and pick the single best candidate,
/// with its center mapped from region-local to full-frame coordinates.
/// Multiple survivors are expected, not an error; the top few are logged for
/// diagnosis.
pub fn score_and_select(
    boxes: &[BoundingBox],
    mask: &GrayImage,
    region: SearchRegion,
    cfg: &DetectionConfig,
) -> Option<Candidate> {
    let mut survivors: Vec<Candidate> = Vec::new();
    let mut best: Option<Candidate> = None;

    for bbox in boxes {
        let ratio = fill_ratio(mask, bbox);
        if ratio < cfg.fill_ratio_threshold {
            continue;
        }

        let (cx, cy) = bbox.center();
        let candidate = Candidate {
            bbox: *bbox,
            fill_ratio: ratio,
            center: (region.x_min + cx, region.y_min + cy),
        };
        survivors.push(candidate);

        match &best {
            Some(current) if !beats(&candidate, current) => {}
            _ => best = Some(candidate),
        }
    }

    if survivors.len() > 1 {
        log_top_candidates(&survivors, &best);
    } else if let Some(only) = survivors.first() {
        tracing::debug!(
            center = ?only.center,
            fill_ratio = only.fill_ratio,
            "single candidate icon"
        );
    }

    best
}

/// Bounded top-k diagnostic: sort a copy, report the best three.
fn log_top_candidates(survivors: &[Candidate], best: &Option<Candidate>) {
    let mut ranked: Vec<&Candidate> = survivors.iter().collect();
    ranked.sort_by(|a, b| b.score().total_cmp(&a.score()));
    tracing::debug!(count = survivors.len(), "multiple candidate icons");
    for (rank, cand) in ranked.iter().take(3).enumerate() {
        let selected = best.map(|b| b.center == cand.center).unwrap_or(false);
        tracing::debug!(
            rank = rank + 1,
            center = ?cand.center,
            score = cand.score(),
            fill_ratio = cand.fill_ratio,
            selected,
            "candidate"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectionConfig;
    use crate::detector::segment::FOREGROUND;

    fn fill_rect(mask: &mut GrayImage, x: u32, y: u32, w: u32, h: u32) {
        for yy in y..y + h {
            for xx in x..x + w {
                mask.put_pixel(xx, yy, Luma([FOREGROUND]));
            }
        }
    }

    fn region() -> SearchRegion {
        SearchRegion { x_min: 0, y_min: 0, x_max: 1920, y_max: 1000 }
    }

    #[test]
    fn empty_mask_yields_no_candidates() {
        let mask = GrayImage::new(640, 480);
        let cfg = DetectionConfig::default();
        let boxes = extract(&mask, &cfg);
        assert!(boxes.is_empty());
        assert!(score_and_select(&boxes, &mask, region(), &cfg).is_none());
    }

    #[test]
    fn zero_sized_mask_is_handled() {
        let mask = GrayImage::new(0, 0);
        let cfg = DetectionConfig::default();
        assert!(extract(&mask, &cfg).is_empty());
    }

    #[test]
    fn area_bounds_are_inclusive() {
        let cfg = DetectionConfig::default();

        // Exactly min area: 16x16 = 256.
        let mut mask = GrayImage::new(200, 200);
        fill_rect(&mut mask, 10, 10, 16, 16);
        assert_eq!(extract(&mask, &cfg).len(), 1);

        // Exactly max area: 128x128 = 16384.
        let mut mask = GrayImage::new(300, 300);
        fill_rect(&mut mask, 10, 10, 128, 128);
        assert_eq!(extract(&mask, &cfg).len(), 1);

        // Below min: 10x10.
        let mut mask = GrayImage::new(200, 200);
        fill_rect(&mut mask, 10, 10, 10, 10);
        assert!(extract(&mask, &cfg).is_empty());

        // Above max: 129x129.
        let mut mask = GrayImage::new(300, 300);
        fill_rect(&mut mask, 10, 10, 129, 129);
        assert!(extract(&mask, &cfg).is_empty());
    }

    #[test]
    fn aspect_bounds_are_inclusive() {
        let cfg = DetectionConfig::default();

        // 0.7 exactly: 28/40.
        let mut mask = GrayImage::new(200, 200);
        fill_rect(&mut mask, 10, 10, 28, 40);
        assert_eq!(extract(&mask, &cfg).len(), 1);

        // 1.4 exactly: 56/40.
        let mut mask = GrayImage::new(200, 200);
        fill_rect(&mut mask, 10, 10, 56, 40);
        assert_eq!(extract(&mask, &cfg).len(), 1);

        // Too wide: 64/32 = 2.0.
        let mut mask = GrayImage::new(200, 200);
        fill_rect(&mut mask, 10, 10, 64, 32);
        assert!(extract(&mask, &cfg).is_empty());

        // Too tall: 20/40 = 0.5.
        let mut mask = GrayImage::new(200, 200);
        fill_rect(&mut mask, 10, 10, 20, 40);
        assert!(extract(&mask, &cfg).is_empty());
    }

    #[test]
    fn extraction_order_is_deterministic() {
        let mut mask = GrayImage::new(400, 400);
        fill_rect(&mut mask, 200, 50, 32, 32);
        fill_rect(&mut mask, 30, 50, 32, 32);
        fill_rect(&mut mask, 100, 200, 32, 32);
        let cfg = DetectionConfig::default();
        let boxes = extract(&mask, &cfg);
        assert_eq!(boxes.len(), 3);
        assert_eq!((boxes[0].x, boxes[0].y), (30, 50));
        assert_eq!((boxes[1].x, boxes[1].y), (200, 50));
        assert_eq!((boxes[2].x, boxes[2].y), (100, 200));
    }

    #[test]
    fn higher_fill_ratio_wins() {
        let cfg = DetectionConfig::default();
        let mut mask = GrayImage::new(1000, 1000);
        // Solid square: fill ratio 1.0.
        fill_rect(&mut mask, 184, 184, 32, 32);
        // Sparse square: an L of pixels along two edges inside a 32x32 box,
        // fill ratio well under 1.0 but above threshold.
        fill_rect(&mut mask, 784, 784, 32, 8);
        fill_rect(&mut mask, 784, 784, 8, 32);

        let boxes = extract(&mask, &cfg);
        assert_eq!(boxes.len(), 2);
        let best = score_and_select(&boxes, &mask, region(), &cfg).unwrap();
        assert_eq!(best.center, (200, 200));
        assert!(best.fill_ratio > 0.9);
    }

    #[test]
    fn exact_tie_breaks_leftmost_then_topmost() {
        let cfg = DetectionConfig::default();
        let mut mask = GrayImage::new(600, 600);
        // Two identical solid squares, both fill ratio 1.0.
        fill_rect(&mut mask, 400, 100, 32, 32);
        fill_rect(&mut mask, 100, 400, 32, 32);

        let boxes = extract(&mask, &cfg);
        let best = score_and_select(&boxes, &mask, region(), &cfg).unwrap();
        // Leftmost wins regardless of vertical position.
        assert_eq!(best.bbox.x, 100);
    }

    #[test]
    fn fill_ratio_threshold_drops_sparse_boxes() {
        let mut cfg = DetectionConfig::default();
        cfg.fill_ratio_threshold = 0.5;
        let mut mask = GrayImage::new(200, 200);
        // A C-shaped stroke spanning a 40x40 extent: one connected component
        // that passes area and aspect filters but covers well under half of
        // its bounding box.
        fill_rect(&mut mask, 20, 20, 40, 4);
        fill_rect(&mut mask, 20, 56, 40, 4);
        fill_rect(&mut mask, 20, 20, 4, 40);

        let boxes = extract(&mask, &cfg);
        assert_eq!(boxes.len(), 1);
        assert!(score_and_select(&boxes, &mask, region(), &cfg).is_none());
    }

    #[test]
    fn center_maps_back_to_frame_coordinates() {
        let cfg = DetectionConfig::default();
        let offset_region = SearchRegion { x_min: 100, y_min: 50, x_max: 700, y_max: 650 };
        let mut mask = GrayImage::new(600, 600);
        fill_rect(&mut mask, 184, 184, 32, 32);

        let boxes = extract(&mask, &cfg);
        let best = score_and_select(&boxes, &mask, offset_region, &cfg).unwrap();
        assert_eq!(best.center, (300, 250));
    }
}
