use super::expression::{DateSpec, Expression};
use crate::error::{AppResult, Error};
use crate::utils::time::{resolve_local, upcoming_weekday, weekday_next_week};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;

/// Length of an event when the text names no end or duration
pub const DEFAULT_EVENT_MINUTES: i64 = 60;

/// Hour used when a date carries no time of day
const DEFAULT_HOUR: u32 = 12;
/// Hour used for "tonight" without a time
const TONIGHT_HOUR: u32 = 20;

/// Resolve an expression against the reference instant into `(start, end)`.
///
/// Ambiguous references resolve toward the future. `end` is always after
/// `start`.
pub fn resolve(
    expression: &Expression,
    reference: &DateTime<Tz>,
) -> AppResult<(DateTime<Tz>, DateTime<Tz>)> {
    let tz = reference.timezone();
    let now = reference.naive_local();

    let start_naive = resolve_start(expression, now)?;
    let start = resolve_local(&tz, &start_naive).ok_or_else(|| {
        Error::AmbiguousStart(format!(
            "{} does not exist in timezone {}",
            start_naive,
            tz.name()
        ))
    })?;

    let end = match resolve_end(expression, start_naive)?
        .and_then(|end| resolve_local(&tz, &end))
        .filter(|end| *end > start)
    {
        Some(end) => end,
        None => start
            .checked_add_signed(Duration::minutes(DEFAULT_EVENT_MINUTES))
            .ok_or_else(|| out_of_range(start_naive))?,
    };

    Ok((start, end))
}

fn resolve_start(expression: &Expression, now: NaiveDateTime) -> AppResult<NaiveDateTime> {
    let today = now.date();
    let time = expression.time.map(|t| t.start);

    match expression.date {
        Some(DateSpec::Offset(offset)) => {
            let shifted = now
                .checked_add_signed(offset)
                .ok_or_else(|| out_of_range(now))?;
            Ok(match time {
                Some(t) => shifted.date().and_time(t),
                None => shifted,
            })
        }
        Some(date) => {
            let day = resolve_date(date, today)?;
            let time_of_day = time
                .or_else(|| default_time(date))
                .ok_or_else(|| Error::AmbiguousStart("no time of day".to_string()))?;
            let mut start = day.and_time(time_of_day);

            // A bare weekday naming today whose time already passed means next week
            let bare_weekday = matches!(date, DateSpec::Weekday { next: false, .. });
            if bare_weekday && time.is_some() && start <= now {
                start += Duration::weeks(1);
            }
            Ok(start)
        }
        None => {
            let t = time.ok_or_else(|| {
                Error::AmbiguousStart("expression carries neither a date nor a time".to_string())
            })?;
            let mut start = today.and_time(t);
            if start <= now {
                start += Duration::days(1);
            }
            Ok(start)
        }
    }
}

fn resolve_end(expression: &Expression, start: NaiveDateTime) -> AppResult<Option<NaiveDateTime>> {
    if let Some(end_time) = expression.time.and_then(|t| t.end) {
        let end = start.date().and_time(end_time);
        if end > start {
            return Ok(Some(end));
        }
        return end
            .checked_add_signed(Duration::days(1))
            .map(Some)
            .ok_or_else(|| out_of_range(start));
    }
    expression
        .duration
        .map(|d| start.checked_add_signed(d).ok_or_else(|| out_of_range(start)))
        .transpose()
}

fn resolve_date(date: DateSpec, today: NaiveDate) -> AppResult<NaiveDate> {
    match date {
        DateSpec::Today | DateSpec::Tonight => Ok(today),
        DateSpec::Tomorrow => Ok(today + Duration::days(1)),
        DateSpec::DayAfterTomorrow => Ok(today + Duration::days(2)),
        DateSpec::Weekday { day, next: false } => Ok(upcoming_weekday(today, day)),
        DateSpec::Weekday { day, next: true } => Ok(weekday_next_week(today, day)),
        DateSpec::Calendar {
            year: Some(year),
            month,
            day,
        } => NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| invalid_date(year, month, day)),
        DateSpec::Calendar {
            year: None,
            month,
            day,
        } => {
            let year = today.year();
            match NaiveDate::from_ymd_opt(year, month, day) {
                Some(date) if date >= today => Ok(date),
                _ => NaiveDate::from_ymd_opt(year + 1, month, day)
                    .ok_or_else(|| invalid_date(year + 1, month, day)),
            }
        }
        DateSpec::Offset(offset) => today
            .checked_add_signed(offset)
            .ok_or_else(|| out_of_range(today)),
    }
}

fn default_time(date: DateSpec) -> Option<NaiveTime> {
    let hour = match date {
        DateSpec::Tonight => TONIGHT_HOUR,
        _ => DEFAULT_HOUR,
    };
    NaiveTime::from_hms_opt(hour, 0, 0)
}

fn out_of_range(from: impl std::fmt::Display) -> Error {
    Error::AmbiguousStart(format!("event is too far from {} to place on a calendar", from))
}

fn invalid_date(year: i32, month: u32, day: u32) -> Error {
    Error::AmbiguousStart(format!("{:04}-{:02}-{:02} is not a calendar date", year, month, day))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::date_parser::expression::find_expression;
    use chrono::TimeZone;

    fn reference() -> DateTime<Tz> {
        // Wednesday
        chrono_tz::UTC.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
        chrono_tz::UTC.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn resolve_text(text: &str) -> AppResult<(DateTime<Tz>, DateTime<Tz>)> {
        let expression = find_expression(text).expect("expression");
        resolve(&expression, &reference())
    }

    #[test]
    fn test_relative_days() {
        assert_eq!(resolve_text("today").unwrap().0, at(2024, 5, 1, 12, 0));
        assert_eq!(resolve_text("tonight").unwrap().0, at(2024, 5, 1, 20, 0));
        assert_eq!(resolve_text("tomorrow at 7pm").unwrap().0, at(2024, 5, 2, 19, 0));
        assert_eq!(
            resolve_text("the day after tomorrow").unwrap().0,
            at(2024, 5, 3, 12, 0)
        );
    }

    #[test]
    fn test_weekdays_resolve_forward() {
        assert_eq!(resolve_text("Friday").unwrap().0, at(2024, 5, 3, 12, 0));
        assert_eq!(resolve_text("Monday").unwrap().0, at(2024, 5, 6, 12, 0));
        // Today with a time still ahead stays today
        assert_eq!(resolve_text("Wednesday at 5pm").unwrap().0, at(2024, 5, 1, 17, 0));
        // Today with a time already gone moves a week
        assert_eq!(resolve_text("Wednesday at 8am").unwrap().0, at(2024, 5, 8, 8, 0));
        assert_eq!(resolve_text("next Wednesday").unwrap().0, at(2024, 5, 8, 12, 0));
    }

    #[test]
    fn test_next_weekday_is_in_the_following_week() {
        // This week's Friday is the 3rd, next week's the 10th
        assert_eq!(resolve_text("next Friday").unwrap().0, at(2024, 5, 10, 12, 0));
        assert_eq!(resolve_text("this Friday").unwrap().0, at(2024, 5, 3, 12, 0));
        assert_eq!(resolve_text("next Monday").unwrap().0, at(2024, 5, 6, 12, 0));
        // A time already gone today does not push next week any further
        assert_eq!(resolve_text("next Wednesday at 8am").unwrap().0, at(2024, 5, 8, 8, 0));
    }

    #[test]
    fn test_time_only_rolls_to_tomorrow_when_passed() {
        assert_eq!(resolve_text("at 10:30").unwrap().0, at(2024, 5, 1, 10, 30));
        assert_eq!(resolve_text("at 8am").unwrap().0, at(2024, 5, 2, 8, 0));
    }

    #[test]
    fn test_calendar_dates() {
        assert_eq!(resolve_text("May 3").unwrap().0, at(2024, 5, 3, 12, 0));
        // Already passed this year
        assert_eq!(resolve_text("March 3").unwrap().0, at(2025, 3, 3, 12, 0));
        assert_eq!(resolve_text("2023-01-05 10:00").unwrap().0, at(2023, 1, 5, 10, 0));
    }

    #[test]
    fn test_impossible_date_is_ambiguous_start() {
        let err = resolve_text("Feb 30 2024").unwrap_err();
        assert!(matches!(err, Error::AmbiguousStart(_)));
    }

    #[test]
    fn test_end_from_range_and_duration() {
        let (start, end) = resolve_text("tomorrow 10pm-1am").unwrap();
        assert_eq!(start, at(2024, 5, 2, 22, 0));
        assert_eq!(end, at(2024, 5, 3, 1, 0));

        let (start, end) = resolve_text("tomorrow at 6pm for 90 minutes").unwrap();
        assert_eq!(end - start, Duration::minutes(90));

        let (start, end) = resolve_text("tomorrow at 6pm").unwrap();
        assert_eq!(end - start, Duration::hours(1));
    }

    #[test]
    fn test_zero_duration_falls_back_to_default() {
        let (start, end) = resolve_text("tomorrow at 6pm for 0 minutes").unwrap();
        assert_eq!(end - start, Duration::hours(1));
    }

    #[test]
    fn test_offsets() {
        assert_eq!(resolve_text("in 2 hours").unwrap().0, at(2024, 5, 1, 11, 0));
        assert_eq!(resolve_text("in 3 days at 4pm").unwrap().0, at(2024, 5, 4, 16, 0));
    }

    #[test]
    fn test_huge_offsets_and_durations_do_not_panic() {
        let err = resolve_text("Launch in 9999999999 days").unwrap_err();
        assert!(matches!(err, Error::AmbiguousStart(_)));

        let err = resolve_text("tomorrow at 6pm for 9999999999 hours").unwrap_err();
        assert!(matches!(err, Error::AmbiguousStart(_)));

        // Too many minutes for a duration at all, so the offset never matches
        assert!(find_expression("in 999999999999999999 minutes").is_none());
    }

    #[test]
    fn test_dst_gap_is_ambiguous_start() {
        let helsinki: Tz = "Europe/Helsinki".parse().unwrap();
        let reference = helsinki.with_ymd_and_hms(2024, 3, 30, 9, 0, 0).unwrap();
        let expression = find_expression("tomorrow at 3:30am").unwrap();
        let err = resolve(&expression, &reference).unwrap_err();
        assert!(matches!(err, Error::AmbiguousStart(_)));
    }
}
