use super::models::TrackedEvent;
use crate::components::date_parser::ParsedEvent;

/// Whether `candidate` repeats an event already tracked.
///
/// Titles must match exactly and starts must fall on the same millisecond.
/// Near-identical titles count as different events.
pub fn is_duplicate<'a, I>(candidate: &ParsedEvent, existing: I) -> bool
where
    I: IntoIterator<Item = &'a TrackedEvent>,
{
    let start = candidate.start.timestamp_millis();
    existing
        .into_iter()
        .any(|event| event.title == candidate.title && event.start.timestamp_millis() == start)
}
