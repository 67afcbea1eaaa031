use chrono::DateTime;
use chrono_tz::Tz;

/// One candidate reported by the recognizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDetection {
    pub title_guess: String,
    pub date_time_text: String,
}

impl RawDetection {
    pub fn new(title_guess: impl Into<String>, date_time_text: impl Into<String>) -> Self {
        Self {
            title_guess: title_guess.into(),
            date_time_text: date_time_text.into(),
        }
    }

    /// Text handed to the date parser
    pub fn combined_text(&self) -> String {
        let title = self.title_guess.trim();
        let when = self.date_time_text.trim();
        if title.is_empty() {
            when.to_string()
        } else {
            format!("{} on {}", title, when)
        }
    }
}

/// Event held by the store
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedEvent {
    pub id: String,
    pub title: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub description: String,
    /// Calendar file body matching the fields above
    pub encoded_body: String,
}

/// Replacement fields for an edit
#[derive(Debug, Clone, PartialEq)]
pub struct EventUpdate {
    pub title: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

/// Candidate that could not be turned into an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFailure {
    pub text: String,
    pub reason: String,
}

/// Outcome of ingesting one detection batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub created: Vec<TrackedEvent>,
    pub duplicates: usize,
    pub failures: Vec<CandidateFailure>,
}

impl IngestReport {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.duplicates == 0 && self.failures.is_empty()
    }
}
