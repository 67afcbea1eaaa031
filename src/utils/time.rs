use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

/// Source of the current wall-clock instant
pub trait Clock: Send + Sync {
    /// Current instant in the configured timezone
    fn now(&self) -> DateTime<Tz>;
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }
}

/// Clock frozen at a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<Tz>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Tz>) -> Self {
        Self { instant }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Tz> {
        self.instant
    }
}

/// Attach a timezone to a local date-time.
///
/// Folded times (DST fall-back) resolve to the earlier instant. Returns `None`
/// for times skipped by a DST gap.
pub fn resolve_local(tz: &Tz, naive: &NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => None,
    }
}

/// Days until the next occurrence of `target`, zero when `from` already is that weekday
pub fn days_until_weekday(from: Weekday, target: Weekday) -> i64 {
    let from = from.num_days_from_monday() as i64;
    let target = target.num_days_from_monday() as i64;
    (target - from).rem_euclid(7)
}

/// Next date falling on `target`, counting `from` itself
pub fn upcoming_weekday(from: NaiveDate, target: Weekday) -> NaiveDate {
    from + Duration::days(days_until_weekday(from.weekday(), target))
}

/// Date falling on `target` in the Monday-started week after the one holding `from`
pub fn weekday_next_week(from: NaiveDate, target: Weekday) -> NaiveDate {
    let monday = from - Duration::days(from.weekday().num_days_from_monday() as i64);
    monday + Duration::days(7 + target.num_days_from_monday() as i64)
}
