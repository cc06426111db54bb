//! Diagnostic side output: an annotated copy of the captured frame with a
//! marker circle, directional arrow, and text labels at the detected icon,
//! written to a screenshots directory. Never required for correctness.

use std::path::PathBuf;

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};

use crate::errors::PostpadResult;

const MARKER: Rgb<u8> = Rgb([0, 255, 0]);
const CIRCLE_RADIUS: i32 = 40;

/// Output channel the retry controller invokes after a successful selection.
/// Implementations must not fail the detection: report problems and move on.
pub trait AnnotationSink {
    fn on_detected(&self, frame: &RgbImage, center: (u32, u32));
}

/// Writes annotated detection screenshots, optionally keyed by the post id
/// that triggered the search.
pub struct ScreenshotWriter {
    dir: PathBuf,
    post_id: Option<u32>,
}

impl ScreenshotWriter {
    pub fn new(dir: impl Into<PathBuf>, post_id: Option<u32>) -> Self {
        Self { dir: dir.into(), post_id }
    }

    fn write(&self, frame: &RgbImage, center: (u32, u32)) -> PostpadResult<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let annotated = annotate(frame, center);

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let filename = match self.post_id {
            Some(id) => format!("detection_post_{id}_{timestamp}.png"),
            None => format!("detection_{timestamp}.png"),
        };
        let path = self.dir.join(filename);
        annotated.save(&path)?;
        Ok(path)
    }
}

impl AnnotationSink for ScreenshotWriter {
    fn on_detected(&self, frame: &RgbImage, center: (u32, u32)) {
        match self.write(frame, center) {
            Ok(path) => tracing::info!(path = %path.display(), "annotated screenshot saved"),
            Err(e) => tracing::warn!(error = %e, "failed to save annotated screenshot"),
        }
    }
}

/// Copy the frame and draw the detection marker: circle around the icon,
/// arrow pointing at it from the upper left, coordinate label, and a
/// success tag underneath.
pub fn annotate(frame: &RgbImage, center: (u32, u32)) -> RgbImage {
    let mut canvas = frame.clone();
    let (cx, cy) = (center.0 as i32, center.1 as i32);

    for r in CIRCLE_RADIUS - 1..=CIRCLE_RADIUS + 1 {
        draw_hollow_circle_mut(&mut canvas, (cx, cy), r, MARKER);
    }

    draw_arrow(
        &mut canvas,
        (cx as f32 - 80.0, cy as f32 - 80.0),
        (cx as f32 - 45.0, cy as f32 - 45.0),
    );

    let label = format!("ICON DETECTED: ({}, {})", center.0, center.1);
    draw_text(&mut canvas, &label, cx - 100, cy - 90, 2);
    draw_text(&mut canvas, "SUCCESS", cx - 50, cy + 70, 2);

    canvas
}

fn draw_arrow(canvas: &mut RgbImage, start: (f32, f32), end: (f32, f32)) {
    draw_line_segment_mut(canvas, start, end, MARKER);

    let (dx, dy) = (end.0 - start.0, end.1 - start.1);
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return;
    }
    // Two barbs swept back from the tip, 30% of the shaft length.
    let (ux, uy) = (dx / len, dy / len);
    let (px, py) = (-uy, ux);
    let barb = len * 0.3;
    for side in [1.0f32, -1.0] {
        let bx = end.0 - ux * barb + px * barb * 0.5 * side;
        let by = end.1 - uy * barb + py * barb * 0.5 * side;
        draw_line_segment_mut(canvas, end, (bx, by), MARKER);
    }
}

/// Render text with the built-in 5x5 bitmap font, `scale` pixels per font
/// pixel. Glyphs falling outside the canvas are clipped.
fn draw_text(canvas: &mut RgbImage, text: &str, x: i32, y: i32, scale: i32) {
    let step = 5 * scale + scale;
    for (i, c) in text.to_uppercase().chars().enumerate() {
        draw_glyph(canvas, c, x + i as i32 * step, y, scale);
    }
}

fn draw_glyph(canvas: &mut RgbImage, c: char, x: i32, y: i32, scale: i32) {
    let glyph = match c {
        '0'..='9' => MINI_FONT[(c as u8 - b'0') as usize],
        'A'..='Z' => MINI_FONT[10 + (c as u8 - b'A') as usize],
        ':' => [0b00000, 0b00100, 0b00000, 0b00100, 0b00000],
        '(' => [0b00010, 0b00100, 0b00100, 0b00100, 0b00010],
        ')' => [0b01000, 0b00100, 0b00100, 0b00100, 0b01000],
        ',' => [0b00000, 0b00000, 0b00000, 0b00100, 0b01000],
        _ => return,
    };
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);
    for (row, &bits) in glyph.iter().enumerate() {
        for bit in 0..5i32 {
            if (bits >> (4 - bit)) & 1 == 0 {
                continue;
            }
            for sy in 0..scale {
                for sx in 0..scale {
                    let px = x + bit * scale + sx;
                    let py = y + row as i32 * scale + sy;
                    if px >= 0 && px < w && py >= 0 && py < h {
                        canvas.put_pixel(px as u32, py as u32, MARKER);
                    }
                }
            }
        }
    }
}

/// 5x5 bitmap glyphs: digits 0-9 then letters A-Z.
const MINI_FONT: [[u8; 5]; 36] = [
    [0b01110, 0b10001, 0b10001, 0b10001, 0b01110], // 0
    [0b00100, 0b01100, 0b00100, 0b00100, 0b01110], // 1
    [0b01110, 0b10001, 0b00110, 0b01000, 0b11111], // 2
    [0b11110, 0b00001, 0b00110, 0b00001, 0b11110], // 3
    [0b00110, 0b01010, 0b10010, 0b11111, 0b00010], // 4
    [0b11111, 0b10000, 0b11110, 0b00001, 0b11110], // 5
    [0b01110, 0b10000, 0b11110, 0b10001, 0b01110], // 6
    [0b11111, 0b00001, 0b00010, 0b00100, 0b00100], // 7
    [0b01110, 0b10001, 0b01110, 0b10001, 0b01110], // 8
    [0b01110, 0b10001, 0b01111, 0b00001, 0b01110], // 9
    [0b01110, 0b10001, 0b11111, 0b10001, 0b10001], // A
    [0b11110, 0b10001, 0b11110, 0b10001, 0b11110], // B
    [0b01110, 0b10000, 0b10000, 0b10000, 0b01110], // C
    [0b11100, 0b10010, 0b10001, 0b10010, 0b11100], // D
    [0b11111, 0b10000, 0b11110, 0b10000, 0b11111], // E
    [0b11111, 0b10000, 0b11110, 0b10000, 0b10000], // F
    [0b01110, 0b10000, 0b10011, 0b10001, 0b01110], // G
    [0b10001, 0b10001, 0b11111, 0b10001, 0b10001], // H
    [0b01110, 0b00100, 0b00100, 0b00100, 0b01110], // I
    [0b00111, 0b00010, 0b00010, 0b10010, 0b01100], // J
    [0b10001, 0b10010, 0b11100, 0b10010, 0b10001], // K
    [0b10000, 0b10000, 0b10000, 0b10000, 0b11111], // L
    [0b10001, 0b11011, 0b10101, 0b10001, 0b10001], // M
    [0b10001, 0b11001, 0b10101, 0b10011, 0b10001], // N
    [0b01110, 0b10001, 0b10001, 0b10001, 0b01110], // O
    [0b11110, 0b10001, 0b11110, 0b10000, 0b10000], // P
    [0b01110, 0b10001, 0b10101, 0b10010, 0b01101], // Q
    [0b11110, 0b10001, 0b11110, 0b10010, 0b10001], // R
    [0b01111, 0b10000, 0b01110, 0b00001, 0b11110], // S
    [0b11111, 0b00100, 0b00100, 0b00100, 0b00100], // T
    [0b10001, 0b10001, 0b10001, 0b10001, 0b01110], // U
    [0b10001, 0b10001, 0b10001, 0b01010, 0b00100], // V
    [0b10001, 0b10001, 0b10101, 0b11011, 0b10001], // W
    [0b10001, 0b01010, 0b00100, 0b01010, 0b10001], // X
    [0b10001, 0b01010, 0b00100, 0b00100, 0b00100], // Y
    [0b11111, 0b00010, 0b00100, 0b01000, 0b11111], // Z
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotate_leaves_source_untouched_and_marks_copy() {
        let frame = RgbImage::new(1920, 1080);
        let annotated = annotate(&frame, (500, 500));
        assert!(frame.pixels().all(|p| *p == Rgb([0, 0, 0])));
        // Circle pixels at the cardinal points of radius 40.
        assert_eq!(*annotated.get_pixel(540, 500), MARKER);
        assert_eq!(*annotated.get_pixel(500, 460), MARKER);
        // Something from the text labels landed too.
        assert!(annotated.pixels().filter(|p| **p == MARKER).count() > 200);
    }

    #[test]
    fn annotate_near_border_does_not_panic() {
        let frame = RgbImage::new(320, 240);
        let _ = annotate(&frame, (5, 5));
        let _ = annotate(&frame, (318, 238));
    }

    #[test]
    fn writer_filename_uses_post_id() {
        let dir = std::env::temp_dir().join(format!("postpad-annot-{}", std::process::id()));
        let writer = ScreenshotWriter::new(&dir, Some(7));
        let frame = RgbImage::new(64, 64);
        let path = writer.write(&frame, (32, 32)).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("detection_post_7_"));
        assert!(name.ends_with(".png"));
        assert!(path.exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
