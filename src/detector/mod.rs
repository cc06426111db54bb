//! Color-based icon detection: capture a frame, clip to the desktop search
//! region, segment by HSV range, refine the mask, extract and score
//! candidate regions, and pick the best match.

pub mod annotator;
pub mod candidates;
pub mod frame;
pub mod pipeline;
pub mod segment;
pub mod types;

pub use annotator::{AnnotationSink, ScreenshotWriter};
pub use frame::{FrameSource, MonitorSource};
pub use pipeline::{detect_in_frame, locate_icon};
pub use types::{Candidate, HsvRange, SearchRegion};
