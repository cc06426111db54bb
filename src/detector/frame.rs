use image::RgbImage;

use crate::errors::{PostpadError, PostpadResult};

use super::types::SearchRegion;

/// Source of full-screen frames. The monitor-backed implementation is the
/// production path; tests substitute synthetic frames.
pub trait FrameSource {
    fn capture(&self) -> PostpadResult<RgbImage>;
}

/// Captures the configured physical display via `xcap`.
pub struct MonitorSource {
    display_index: usize,
}

impl MonitorSource {
    pub fn new(display_index: usize) -> Self {
        Self { display_index }
    }
}

impl FrameSource for MonitorSource {
    fn capture(&self) -> PostpadResult<RgbImage> {
        let monitors = xcap::Monitor::all()
            .map_err(|e| PostpadError::Capture(format!("monitor enumeration: {e}")))?;
        let monitor = monitors.into_iter().nth(self.display_index).ok_or_else(|| {
            PostpadError::Capture(format!("no monitor at index {}", self.display_index))
        })?;
        let rgba = monitor
            .capture_image()
            .map_err(|e| PostpadError::Capture(format!("screen capture: {e}")))?;
        // Alpha carries nothing useful for color matching.
        Ok(image::DynamicImage::ImageRgba8(rgba).to_rgb8())
    }
}

/// Crop a frame to the clamped search region. A region extending past the
/// frame yields a smaller (possibly empty) sub-frame, never a panic.
pub fn clip_region(frame: &RgbImage, region: SearchRegion) -> (RgbImage, SearchRegion) {
    let clamped = region.clamp_to(frame.width(), frame.height());
    let sub = image::imageops::crop_imm(
        frame,
        clamped.x_min,
        clamped.y_min,
        clamped.width(),
        clamped.height(),
    )
    .to_image();
    (sub, clamped)
}
