//! Throttled capture loop feeding recognized frames into the event store.

mod actor;
pub mod file_source;
mod handle;
pub mod recognizer;
pub mod source;
pub mod throttle;

pub use actor::{ScanState, ScannerStatus};
pub use file_source::SnapshotSource;
pub use handle::ScannerHandle;
pub use recognizer::{parse_detections, OpenAiRecognizer, Recognizer};
pub use source::{CaptureConstraints, Facing, FrameStream, StreamGuard, VisualSource};
pub use throttle::{Throttle, DETECTION_COOLDOWN, TICK_INTERVAL};
