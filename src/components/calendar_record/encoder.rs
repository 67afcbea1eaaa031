use crate::error::{encoding_error, AppResult};
use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;
use icalendar::{Calendar, Component, Event, EventStatus};
use uuid::Uuid;

/// Floating local date-time as written to DTSTART/DTEND
const LOCAL_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Input of a single encoder call
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// Stable identifier, derived from the event itself when absent
    pub uid: Option<String>,
    pub title: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub description: Option<String>,
    pub location: Option<String>,
}

impl EventRecord {
    pub fn new(title: impl Into<String>, start: DateTime<Tz>, end: DateTime<Tz>) -> Self {
        Self {
            uid: None,
            title: title.into(),
            start,
            end,
            description: None,
            location: None,
        }
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// UID written to the record
    pub fn effective_uid(&self) -> String {
        match &self.uid {
            Some(uid) => uid.clone(),
            None => {
                let seed = format!(
                    "{}|{}|{}",
                    self.title,
                    self.start.to_rfc3339(),
                    self.end.to_rfc3339()
                );
                Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes()).to_string()
            }
        }
    }
}

/// Local calendar components `(year, month, day, hour, minute)` of an instant.
///
/// Months are 1-indexed. Years outside 0..=9999 cannot be written to a
/// calendar file.
pub fn calendar_components(dt: &DateTime<Tz>) -> AppResult<(i32, u32, u32, u32, u32)> {
    let year = dt.year();
    if !(0..=9999).contains(&year) {
        return Err(encoding_error(&format!(
            "year {} cannot be written to a calendar record",
            year
        )));
    }
    Ok((year, dt.month(), dt.day(), dt.hour(), dt.minute()))
}

/// Serializes events into calendar file bodies
#[derive(Debug, Clone, Copy)]
pub struct CalendarEncoder {
    stamp: DateTime<Utc>,
}

impl CalendarEncoder {
    /// Encoder writing `stamp` as DTSTAMP
    pub fn new(stamp: DateTime<Utc>) -> Self {
        Self { stamp }
    }

    pub fn stamp(&self) -> DateTime<Utc> {
        self.stamp
    }

    /// Encode one event as a VCALENDAR holding a single VEVENT
    pub fn encode(&self, record: &EventRecord) -> AppResult<String> {
        if record.end <= record.start {
            return Err(encoding_error(&format!(
                "'{}' ends at {} which is not after its start {}",
                record.title, record.end, record.start
            )));
        }

        let start = local_value(&record.start)?;
        let end = local_value(&record.end)?;

        let mut event = Event::new();
        event.uid(&record.effective_uid());
        event.summary(&record.title);
        if let Some(description) = record.description.as_deref().filter(|d| !d.is_empty()) {
            event.description(description);
        }
        if let Some(location) = record.location.as_deref().filter(|l| !l.is_empty()) {
            event.add_property("LOCATION", location);
        }
        event.add_property("DTSTART", &start);
        event.add_property("DTEND", &end);
        event.timestamp(self.stamp);
        event.status(EventStatus::Confirmed);
        event.add_property("TRANSP", "OPAQUE");
        event.add_property("X-MICROSOFT-CDO-BUSYSTATUS", "BUSY");

        let mut calendar = Calendar::new();
        calendar.push(event);
        Ok(calendar.to_string())
    }
}

fn local_value(dt: &DateTime<Tz>) -> AppResult<String> {
    calendar_components(dt)?;
    Ok(dt.naive_local().format(LOCAL_FORMAT).to_string())
}
