//! Portable calendar records for resolved events.

pub mod encoder;
pub mod export;

pub use encoder::{calendar_components, CalendarEncoder, EventRecord};
pub use export::{export_events, file_name, write_event};
