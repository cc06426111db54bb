use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology;

use super::types::HsvRange;

pub const FOREGROUND: u8 = 255;

/// RGB to HSV on the OpenCV byte scale: hue halved into 0..180 so it fits a
/// byte, saturation and value stretched to 0..255.
pub fn rgb_to_hsv(pixel: &Rgb<u8>) -> [u8; 3] {
    let r = pixel[0] as f32 / 255.0;
    let g = pixel[1] as f32 / 255.0;
    let b = pixel[2] as f32 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let mut h_deg = if delta == 0.0 {
        0.0
    } else if (max - r).abs() < f32::EPSILON {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if (max - g).abs() < f32::EPSILON {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    if h_deg < 0.0 {
        h_deg += 360.0;
    }

    let h = ((h_deg / 2.0).round() as u16).min(179) as u8;
    let s = if max == 0.0 { 0.0 } else { delta / max * 255.0 };
    let v = max * 255.0;
    [h, s.round() as u8, v.round() as u8]
}

/// Binary mask of pixels whose HSV value falls within the inclusive range.
pub fn segment(sub_frame: &RgbImage, range: &HsvRange) -> GrayImage {
    let mut mask = GrayImage::new(sub_frame.width(), sub_frame.height());
    for (x, y, pixel) in sub_frame.enumerate_pixels() {
        if range.contains(rgb_to_hsv(pixel)) {
            mask.put_pixel(x, y, Luma([FOREGROUND]));
        }
    }
    mask
}

/// One pass of opening to kill speckle noise, then two passes of closing to
/// merge small gaps within a single icon. 3x3 square structuring element
/// (LInf ball of radius 1). Opening must run first so closing cannot weld
/// noise into real features.
pub fn refine(mask: &GrayImage) -> GrayImage {
    let opened = morphology::open(mask, Norm::LInf, 1);
    let closed = morphology::close(&opened, Norm::LInf, 1);
    morphology::close(&closed, Norm::LInf, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blue_range() -> HsvRange {
        HsvRange { lower: [95, 70, 70], upper: [125, 255, 255] }
    }

    #[test]
    fn primary_colors_convert_to_expected_hues() {
        assert_eq!(rgb_to_hsv(&Rgb([255, 0, 0])), [0, 255, 255]);
        assert_eq!(rgb_to_hsv(&Rgb([0, 255, 0])), [60, 255, 255]);
        assert_eq!(rgb_to_hsv(&Rgb([0, 0, 255])), [120, 255, 255]);
        assert_eq!(rgb_to_hsv(&Rgb([0, 0, 0])), [0, 0, 0]);
        assert_eq!(rgb_to_hsv(&Rgb([255, 255, 255])), [0, 0, 255]);
    }

    #[test]
    fn pure_blue_is_inside_default_range() {
        assert!(blue_range().contains(rgb_to_hsv(&Rgb([0, 0, 255]))));
        assert!(!blue_range().contains(rgb_to_hsv(&Rgb([255, 0, 0]))));
        // Dark blue below the value bound.
        assert!(!blue_range().contains(rgb_to_hsv(&Rgb([0, 0, 40]))));
    }

    #[test]
    fn segment_marks_only_in_range_pixels() {
        let mut img = RgbImage::new(4, 1);
        img.put_pixel(0, 0, Rgb([0, 0, 255]));
        img.put_pixel(1, 0, Rgb([255, 0, 0]));
        img.put_pixel(2, 0, Rgb([30, 60, 230]));
        img.put_pixel(3, 0, Rgb([0, 0, 0]));
        let mask = segment(&img, &blue_range());
        assert_eq!(mask.get_pixel(0, 0)[0], FOREGROUND);
        assert_eq!(mask.get_pixel(1, 0)[0], 0);
        assert_eq!(mask.get_pixel(2, 0)[0], FOREGROUND);
        assert_eq!(mask.get_pixel(3, 0)[0], 0);
    }

    #[test]
    fn refine_removes_isolated_pixels() {
        let mut mask = GrayImage::new(20, 20);
        mask.put_pixel(10, 10, Luma([FOREGROUND]));
        let refined = refine(&mask);
        assert!(refined.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn refine_keeps_solid_blocks_and_fills_pinholes() {
        let mut mask = GrayImage::new(32, 32);
        for y in 8..24 {
            for x in 8..24 {
                mask.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
        mask.put_pixel(15, 15, Luma([0]));
        let refined = refine(&mask);
        assert_eq!(refined.get_pixel(15, 15)[0], FOREGROUND);
        assert_eq!(refined.get_pixel(12, 12)[0], FOREGROUND);
        assert_eq!(refined.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn refine_is_deterministic() {
        let mut mask = GrayImage::new(16, 16);
        for y in 4..12 {
            for x in 4..12 {
                mask.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
        assert_eq!(refine(&mask), refine(&mask));
    }
}
