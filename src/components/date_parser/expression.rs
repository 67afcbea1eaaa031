use chrono::{Duration, NaiveTime, Weekday};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::ops::Range;

const MONTHS: &str = "january|february|march|april|may|june|july|august|september|october|november|december|sept|jan|feb|mar|apr|jun|jul|aug|sep|oct|nov|dec";
const WEEKDAYS: &str = "monday|tuesday|wednesday|thursday|friday|saturday|sunday|tues|thurs|thur|mon|tue|wed|thu|fri|sat|sun";
const COUNT: &str = "\\d+|an?|one|two|three|four|five|six|seven|eight|nine|ten";
const MERIDIEM: &str = "([ap])\\.?m\\b\\.?";

lazy_static! {
    static ref RELATIVE_DAY: Regex = Regex::new(
        r"(?i)\b(?:on\s+)?((?:the\s+)?day\s+after\s+tomorrow|today|tonight|tomorrow|tmrw)\b"
    )
    .expect("relative day pattern");
    static ref WEEKDAY: Regex = Regex::new(&format!(
        r"(?i)\b(?:on\s+)?(?:(this|next)\s+)?({WEEKDAYS})\b"
    ))
    .expect("weekday pattern");
    static ref MONTH_FIRST: Regex = Regex::new(&format!(
        r"(?i)\b(?:on\s+)?(?:(?:{WEEKDAYS}),?\s+)?({MONTHS})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}})\b)?"
    ))
    .expect("month-first pattern");
    static ref DAY_FIRST: Regex = Regex::new(&format!(
        r"(?i)\b(?:on\s+)?(?:(?:{WEEKDAYS}),?\s+)?(?:the\s+)?(\d{{1,2}})(?:st|nd|rd|th)?(?:\s+of)?\s+({MONTHS})\b\.?(?:,?\s+(\d{{4}})\b)?"
    ))
    .expect("day-first pattern");
    static ref ISO_DATE: Regex =
        Regex::new(r"(?i)\b(?:on\s+)?(\d{4})-(\d{1,2})-(\d{1,2})\b").expect("iso date pattern");
    static ref SLASH_DATE: Regex =
        Regex::new(r"(?i)\b(?:on\s+)?(\d{1,2})/(\d{1,2})(?:/(\d{4}|\d{2}))?\b")
            .expect("slash date pattern");
    static ref OFFSET: Regex = Regex::new(&format!(
        r"(?i)\bin\s+({COUNT})\s+(minutes?|mins?|hours?|hrs?|days?|weeks?)\b"
    ))
    .expect("offset pattern");
    static ref NEXT_WEEK: Regex = Regex::new(r"(?i)\bnext\s+week\b").expect("next week pattern");
    static ref TIME_RANGE: Regex = Regex::new(&format!(
        r"(?i)(?:\b(from|at)\s+|@\s*)?\b(\d{{1,2}})(?::(\d{{2}}))?\s*(?:{MERIDIEM})?\s*(?:-|–|\bto\b|\buntil\b|\btill\b)\s*(\d{{1,2}})(?::(\d{{2}}))?\s*(?:{MERIDIEM})?"
    ))
    .expect("time range pattern");
    static ref TIME_MERIDIEM: Regex = Regex::new(&format!(
        r"(?i)(?:\bat\s+|@\s*)?\b(\d{{1,2}})(?::(\d{{2}}))?\s*{MERIDIEM}"
    ))
    .expect("meridiem time pattern");
    static ref TIME_24H: Regex =
        Regex::new(r"(?i)(?:\bat\s+|@\s*)?\b(\d{1,2}):(\d{2})\b").expect("24h time pattern");
    static ref TIME_NAMED: Regex =
        Regex::new(r"(?i)(?:\bat\s+)?\b(noon|midday|midnight)\b").expect("named time pattern");
    static ref TIME_AT_HOUR: Regex =
        Regex::new(r"(?i)\bat\s+(\d{1,2})\b").expect("bare hour pattern");
    static ref JOINER: Regex =
        Regex::new(r"(?i)^[\s,]*(?:(?:at|on|@)[\s,]*)?$").expect("joiner pattern");
    static ref DURATION: Regex = Regex::new(&format!(
        r"(?i)^[\s,]*for\s+({COUNT})\s*(minutes?|mins?|hours?|hrs?|h)\b"
    ))
    .expect("duration pattern");
}

/// Date half of an expression, still relative to the reference instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSpec {
    Today,
    Tonight,
    Tomorrow,
    DayAfterTomorrow,
    Weekday { day: Weekday, next: bool },
    Calendar { year: Option<i32>, month: u32, day: u32 },
    Offset(Duration),
}

/// Time-of-day half of an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpec {
    pub start: NaiveTime,
    pub end: Option<NaiveTime>,
}

/// First date/time expression found in a text, with its byte span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub span: Range<usize>,
    pub date: Option<DateSpec>,
    pub time: Option<TimeSpec>,
    pub duration: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Date(DateSpec),
    Time(TimeSpec),
}

impl Part {
    fn is_date(&self) -> bool {
        matches!(self, Part::Date(_))
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    span: Range<usize>,
    part: Part,
}

type Extractor = fn(&Captures) -> Option<Part>;

/// Locate the first date/time expression in `text`.
///
/// The earliest match wins, the longest one on ties. A date directly followed
/// or preceded by a time merges with it, and a trailing `for <duration>`
/// extends the expression.
pub fn find_expression(text: &str) -> Option<Expression> {
    let candidates = collect_candidates(text);
    let first = candidates.first()?;

    let mut expression = Expression {
        span: first.span.clone(),
        date: None,
        time: None,
        duration: None,
    };
    apply_part(&mut expression, first.part);

    let companion = candidates.iter().find(|c| {
        c.part.is_date() != first.part.is_date()
            && c.span.start >= first.span.end
            && JOINER.is_match(&text[first.span.end..c.span.start])
    });
    if let Some(companion) = companion {
        expression.span.end = companion.span.end;
        apply_part(&mut expression, companion.part);
    }

    if let Some(caps) = DURATION.captures(&text[expression.span.end..]) {
        if let Some(duration) = duration_from(&caps[1], &caps[2]) {
            let matched = caps.get(0).map(|m| m.end()).unwrap_or(0);
            expression.span.end += matched;
            expression.duration = Some(duration);
        }
    }

    Some(expression)
}

fn apply_part(expression: &mut Expression, part: Part) {
    match part {
        Part::Date(date) => expression.date = Some(date),
        Part::Time(time) => expression.time = Some(time),
    }
}

fn collect_candidates(text: &str) -> Vec<Candidate> {
    let patterns: [(&Regex, Extractor); 12] = [
        (&*RELATIVE_DAY, relative_day),
        (&*WEEKDAY, weekday),
        (&*MONTH_FIRST, month_first),
        (&*DAY_FIRST, day_first),
        (&*ISO_DATE, iso_date),
        (&*SLASH_DATE, slash_date),
        (&*OFFSET, offset),
        (&*NEXT_WEEK, next_week),
        (&*TIME_RANGE, time_range),
        (&*TIME_MERIDIEM, time_meridiem),
        (&*TIME_24H, time_24h),
        (&*TIME_NAMED, time_named),
    ];

    let mut candidates: Vec<Candidate> = patterns
        .iter()
        .flat_map(|(regex, extract)| {
            regex.captures_iter(text).filter_map(move |caps| {
                let whole = caps.get(0)?;
                let part = extract(&caps)?;
                Some(Candidate {
                    span: whole.range(),
                    part,
                })
            })
        })
        .collect();

    candidates.extend(TIME_AT_HOUR.captures_iter(text).filter_map(|caps| {
        let whole = caps.get(0)?;
        let hour = caps[1].parse::<u32>().ok()?;
        let start = NaiveTime::from_hms_opt(hour, 0, 0)?;
        Some(Candidate {
            span: whole.range(),
            part: Part::Time(TimeSpec { start, end: None }),
        })
    }));

    candidates.sort_by(|a, b| {
        a.span
            .start
            .cmp(&b.span.start)
            .then(b.span.len().cmp(&a.span.len()))
    });
    candidates
}

fn relative_day(caps: &Captures) -> Option<Part> {
    let word = caps[1].to_lowercase();
    let spec = match word.as_str() {
        "today" => DateSpec::Today,
        "tonight" => DateSpec::Tonight,
        "tomorrow" | "tmrw" => DateSpec::Tomorrow,
        _ => DateSpec::DayAfterTomorrow,
    };
    Some(Part::Date(spec))
}

fn weekday(caps: &Captures) -> Option<Part> {
    let next = caps
        .get(1)
        .map(|m| m.as_str().eq_ignore_ascii_case("next"))
        .unwrap_or(false);
    let day = weekday_from_name(&caps[2])?;
    Some(Part::Date(DateSpec::Weekday { day, next }))
}

fn month_first(caps: &Captures) -> Option<Part> {
    let month = month_from_name(&caps[1])?;
    let day = caps[2].parse::<u32>().ok()?;
    calendar(year_from(caps.get(3).map(|m| m.as_str())), month, day)
}

fn day_first(caps: &Captures) -> Option<Part> {
    let day = caps[1].parse::<u32>().ok()?;
    let month = month_from_name(&caps[2])?;
    calendar(year_from(caps.get(3).map(|m| m.as_str())), month, day)
}

fn iso_date(caps: &Captures) -> Option<Part> {
    let year = caps[1].parse::<i32>().ok()?;
    let month = caps[2].parse::<u32>().ok()?;
    let day = caps[3].parse::<u32>().ok()?;
    calendar(Some(year), month, day)
}

fn slash_date(caps: &Captures) -> Option<Part> {
    let month = caps[1].parse::<u32>().ok()?;
    let day = caps[2].parse::<u32>().ok()?;
    calendar(year_from(caps.get(3).map(|m| m.as_str())), month, day)
}

fn offset(caps: &Captures) -> Option<Part> {
    let amount = parse_count(&caps[1])?;
    let unit = caps[2].to_lowercase();
    // Counts too large for a duration leave the offset unmatched
    let duration = if unit.starts_with("min") {
        Duration::try_minutes(amount)?
    } else if unit.starts_with('h') {
        Duration::try_hours(amount)?
    } else if unit.starts_with('d') {
        Duration::try_days(amount)?
    } else {
        Duration::try_weeks(amount)?
    };
    Some(Part::Date(DateSpec::Offset(duration)))
}

fn next_week(_caps: &Captures) -> Option<Part> {
    Some(Part::Date(DateSpec::Offset(Duration::weeks(1))))
}

fn time_range(caps: &Captures) -> Option<Part> {
    let prefixed = caps.get(1).is_some() || caps.get(0)?.as_str().starts_with('@');
    let h1 = caps[2].parse::<u32>().ok()?;
    let m1 = minutes_from(caps.get(3).map(|m| m.as_str()))?;
    let mer1 = caps.get(4).map(|m| m.as_str().to_ascii_lowercase());
    let h2 = caps[5].parse::<u32>().ok()?;
    let m2 = minutes_from(caps.get(6).map(|m| m.as_str()))?;
    let mer2 = caps.get(7).map(|m| m.as_str().to_ascii_lowercase());

    // "3-4" on its own is too weak to be a time range
    let explicit = prefixed
        || caps.get(3).is_some()
        || caps.get(6).is_some()
        || mer1.is_some()
        || mer2.is_some();
    if !explicit {
        return None;
    }

    let (start, end) = match (mer1.as_deref(), mer2.as_deref()) {
        (Some(a), Some(b)) => (clock_time(h1, m1, Some(a))?, clock_time(h2, m2, Some(b))?),
        (None, Some(b)) => {
            let end = clock_time(h2, m2, Some(b))?;
            let inherited = clock_time(h1, m1, Some(b))?;
            // "11-1pm" means 11am to 1pm
            let start = if inherited > end {
                clock_time(h1, m1, Some(flip(b)))?
            } else {
                inherited
            };
            (start, end)
        }
        (Some(a), None) => {
            let start = clock_time(h1, m1, Some(a))?;
            let inherited = clock_time(h2, m2, Some(a))?;
            let end = if inherited <= start {
                clock_time(h2, m2, Some(flip(a))).unwrap_or(inherited)
            } else {
                inherited
            };
            (start, end)
        }
        (None, None) => (clock_time(h1, m1, None)?, clock_time(h2, m2, None)?),
    };

    Some(Part::Time(TimeSpec {
        start,
        end: Some(end),
    }))
}

fn time_meridiem(caps: &Captures) -> Option<Part> {
    let hour = caps[1].parse::<u32>().ok()?;
    let minute = minutes_from(caps.get(2).map(|m| m.as_str()))?;
    let meridiem = caps[3].to_ascii_lowercase();
    let start = clock_time(hour, minute, Some(&meridiem))?;
    Some(Part::Time(TimeSpec { start, end: None }))
}

fn time_24h(caps: &Captures) -> Option<Part> {
    let hour = caps[1].parse::<u32>().ok()?;
    let minute = caps[2].parse::<u32>().ok()?;
    let start = clock_time(hour, minute, None)?;
    Some(Part::Time(TimeSpec { start, end: None }))
}

fn time_named(caps: &Captures) -> Option<Part> {
    let hour = if caps[1].eq_ignore_ascii_case("midnight") {
        0
    } else {
        12
    };
    let start = NaiveTime::from_hms_opt(hour, 0, 0)?;
    Some(Part::Time(TimeSpec { start, end: None }))
}

fn calendar(year: Option<i32>, month: u32, day: u32) -> Option<Part> {
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    Some(Part::Date(DateSpec::Calendar { year, month, day }))
}

fn year_from(raw: Option<&str>) -> Option<i32> {
    let year = raw?.parse::<i32>().ok()?;
    Some(if year < 100 { 2000 + year } else { year })
}

fn minutes_from(raw: Option<&str>) -> Option<u32> {
    match raw {
        Some(m) => m.parse::<u32>().ok().filter(|m| *m < 60),
        None => Some(0),
    }
}

/// Convert an hour/minute pair to a time of day, honoring an `a`/`p` meridiem
fn clock_time(hour: u32, minute: u32, meridiem: Option<&str>) -> Option<NaiveTime> {
    let hour = match meridiem {
        Some(m) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            let is_pm = m.starts_with('p');
            match (hour, is_pm) {
                (12, true) => 12,
                (12, false) => 0,
                (h, true) => h + 12,
                (h, false) => h,
            }
        }
        None => hour,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn flip(meridiem: &str) -> &'static str {
    if meridiem.starts_with('p') {
        "a"
    } else {
        "p"
    }
}

fn weekday_from_name(name: &str) -> Option<Weekday> {
    let lower = name.to_lowercase();
    let day = match lower.get(..3)? {
        "mon" => Weekday::Mon,
        "tue" => Weekday::Tue,
        "wed" => Weekday::Wed,
        "thu" => Weekday::Thu,
        "fri" => Weekday::Fri,
        "sat" => Weekday::Sat,
        "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(day)
}

fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    let month = match lower.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn parse_count(raw: &str) -> Option<i64> {
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n);
    }
    let n = match raw.to_lowercase().as_str() {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        _ => return None,
    };
    Some(n)
}

fn duration_from(amount: &str, unit: &str) -> Option<Duration> {
    let amount = parse_count(amount)?;
    if unit.to_lowercase().starts_with('m') {
        Duration::try_minutes(amount)
    } else {
        Duration::try_hours(amount)
    }
}
