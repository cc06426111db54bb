//! Detection pipeline: capture, clip, segment, refine, extract, select,
//! wrapped in a bounded retry loop.

use std::time::Duration;

use image::RgbImage;

use crate::config::DetectionConfig;
use crate::errors::PostpadResult;

use super::annotator::AnnotationSink;
use super::candidates;
use super::frame::{clip_region, FrameSource};
use super::segment;
use super::types::{Candidate, HsvRange, SearchRegion};

/// Run one detection attempt over an already-captured frame. Pure given the
/// frame and configuration, so tests drive it with synthetic images.
pub fn detect_in_frame(
    frame: &RgbImage,
    region: SearchRegion,
    cfg: &DetectionConfig,
) -> Option<Candidate> {
    let (sub_frame, clamped) = clip_region(frame, region);
    if clamped.is_empty() {
        tracing::warn!(?region, "search region is empty after clamping");
        return None;
    }

    let range = HsvRange { lower: cfg.hsv_lower, upper: cfg.hsv_upper };
    let mask = segment::segment(&sub_frame, &range);
    let refined = segment::refine(&mask);

    let boxes = candidates::extract(&refined, cfg);
    candidates::score_and_select(&boxes, &refined, clamped, cfg)
}

/// Retry controller: capture and scan up to `max_retries` times with a fixed
/// blocking delay between failed attempts. Returns the icon center in frame
/// coordinates, or `None` once every attempt has come up empty. On success
/// the annotation sink, if any, receives the raw frame and the center.
pub fn locate_icon(
    source: &dyn FrameSource,
    region: SearchRegion,
    cfg: &DetectionConfig,
    sink: Option<&dyn AnnotationSink>,
) -> PostpadResult<Option<(u32, u32)>> {
    for attempt in 1..=cfg.max_retries {
        let frame = source.capture()?;

        if let Some(found) = detect_in_frame(&frame, region, cfg) {
            tracing::info!(
                center = ?found.center,
                fill_ratio = found.fill_ratio,
                attempt,
                "icon found"
            );
            if let Some(sink) = sink {
                sink.on_detected(&frame, found.center);
            }
            return Ok(Some(found.center));
        }

        tracing::info!(attempt, max = cfg.max_retries, "icon not found");
        if attempt < cfg.max_retries {
            std::thread::sleep(Duration::from_millis(cfg.retry_delay_ms));
        }
    }

    tracing::warn!(retries = cfg.max_retries, "failed to locate icon after retries");
    Ok(None)
}
