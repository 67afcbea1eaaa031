mod actor;
pub mod dedup;
mod handle;
pub mod models;

pub use dedup::is_duplicate;
pub use handle::EventStoreHandle;
pub use models::{CandidateFailure, EventUpdate, IngestReport, RawDetection, TrackedEvent};
