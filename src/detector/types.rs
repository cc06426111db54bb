use serde::{Deserialize, Serialize};

/// Axis-aligned search rectangle in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRegion {
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
}

impl SearchRegion {
    /// Clamp the region to actual frame dimensions so a region partially or
    /// wholly outside the frame degrades to a smaller or empty rectangle.
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> SearchRegion {
        let x_min = self.x_min.min(frame_width);
        let y_min = self.y_min.min(frame_height);
        SearchRegion {
            x_min,
            y_min,
            x_max: self.x_max.clamp(x_min, frame_width),
            y_max: self.y_max.clamp(y_min, frame_height),
        }
    }

    pub fn width(&self) -> u32 {
        self.x_max.saturating_sub(self.x_min)
    }

    pub fn height(&self) -> u32 {
        self.y_max.saturating_sub(self.y_min)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Inclusive HSV bounds. Hue on the 0..180 scale, saturation/value 0..255.
#[derive(Debug, Clone, Copy)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| self.lower[i] <= hsv[i] && hsv[i] <= self.upper[i])
    }
}

/// Bounding box in region-local pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn area(&self) -> u32 {
        self.width * self.height
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Box center, integer division matching the selection contract.
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }
}

/// A connected color-matched region surviving size and shape filters,
/// competing for selection as the detected icon.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub bbox: BoundingBox,
    /// Fraction of the bounding box covered by mask foreground.
    pub fill_ratio: f32,
    /// Box center mapped to full-frame coordinates.
    pub center: (u32, u32),
}

impl Candidate {
    /// Score is the fill ratio alone; all screen locations weigh equally.
    pub fn score(&self) -> f32 {
        self.fill_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_region_inside_frame_is_identity() {
        let r = SearchRegion { x_min: 10, y_min: 20, x_max: 100, y_max: 200 };
        assert_eq!(r.clamp_to(1920, 1080), r);
    }

    #[test]
    fn clamp_region_beyond_frame_shrinks() {
        let r = SearchRegion { x_min: 0, y_min: 0, x_max: 4000, y_max: 3000 };
        let c = r.clamp_to(1920, 1080);
        assert_eq!(c.x_max, 1920);
        assert_eq!(c.y_max, 1080);
        assert!(!c.is_empty());
    }

    #[test]
    fn clamp_region_wholly_outside_is_empty() {
        let r = SearchRegion { x_min: 2000, y_min: 1500, x_max: 2500, y_max: 1600 };
        let c = r.clamp_to(1920, 1080);
        assert!(c.is_empty());
        assert_eq!(c.width(), 0);
    }

    #[test]
    fn hsv_range_bounds_are_inclusive() {
        let range = HsvRange { lower: [95, 70, 70], upper: [125, 255, 255] };
        assert!(range.contains([95, 70, 70]));
        assert!(range.contains([125, 255, 255]));
        assert!(range.contains([110, 200, 128]));
        assert!(!range.contains([94, 255, 255]));
        assert!(!range.contains([126, 70, 70]));
        assert!(!range.contains([110, 69, 255]));
    }

    #[test]
    fn bbox_center_uses_integer_division() {
        let b = BoundingBox { x: 468, y: 468, width: 64, height: 64 };
        assert_eq!(b.center(), (500, 500));
        let odd = BoundingBox { x: 0, y: 0, width: 5, height: 5 };
        assert_eq!(odd.center(), (2, 2));
    }
}
