//! Publication date inference from free text.
//!
//! Article blocks rarely mark their date up consistently, so the flattened
//! text of the block is scanned for anything that reads like a full calendar
//! date. Recognition is strict: a day, a month and a four-digit year must all
//! be present. Bare times, weekday names and lone numbers never match.
//!
//! Recognized shapes (case-insensitive), each optionally followed by a time
//! (`10:30`, `at 3:15 pm`, `at noon`) and, after a time, a zone (`UTC`,
//! `GMT`, `Z`, `+02:00`, `-0500`):
//!
//! | Shape | Example |
//! |-------|---------|
//! | ISO 8601 | `2023-01-05`, `2023-01-05T09:30:00Z` |
//! | month first | `January 5, 2023`, `Jan. 5th 2023` |
//! | day first | `5 January 2023`, `Thu, 05 Jan 2023 12:00:00 +0000` |
//! | US numeric | `1/5/2023` (month/day/year) |
//!
//! When several dates appear, the one that starts earliest in the text wins,
//! regardless of which is chronologically earlier.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::cmp::Reverse;

const MONTH: &str = r"(?P<mname>jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?";

const TIME: &str = r"(?:,?\s+(?:at\s+)?(?:(?P<hour>\d{1,2}):(?P<minute>\d{2})(?::(?P<second>\d{2}))?(?:\s*(?P<ampm>[ap])\.?m\b\.?)?|(?P<word>noon|midnight)\b)(?:\s*(?:(?P<zname>utc|gmt)\b|(?P<zoff>[+-]\d{2}:?\d{2})\b))?)?";

static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    let iso = r"(?i)\b(?P<year>\d{4})-(?P<mnum>\d{2})-(?P<day>\d{2})(?:[T ](?P<hour>\d{2}):(?P<minute>\d{2})(?::(?P<second>\d{2})(?:\.\d+)?)?(?:(?P<zname>z)\b|(?P<zoff>[+-]\d{2}:?\d{2})\b)?)?".to_string();
    let month_first = format!(
        r"(?i)\b{MONTH}\s+(?P<day>\d{{1,2}})(?:st|nd|rd|th)?,?\s+(?P<year>\d{{4}})\b{TIME}"
    );
    let day_first = format!(
        r"(?i)\b(?P<day>\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?{MONTH},?\s+(?P<year>\d{{4}})\b{TIME}"
    );
    let us_numeric =
        format!(r"(?i)\b(?P<mnum>\d{{1,2}})/(?P<day>\d{{1,2}})/(?P<year>\d{{4}})\b{TIME}");

    [iso, month_first, day_first, us_numeric]
        .iter()
        .map(|p| Regex::new(p).unwrap_or_else(|e| panic!("built-in date pattern is invalid: {e}")))
        .collect()
});

/// Find the first date/time expression in `text`, normalized to UTC.
///
/// Naive times are taken to be UTC; times with an explicit zone are converted.
/// Returns `None` when nothing date-like is present.
pub fn infer(text: &str) -> Option<DateTime<Utc>> {
    PATTERNS
        .iter()
        .flat_map(|re| re.captures_iter(text))
        .filter_map(|caps| {
            let m = caps.get(0)?;
            let at = to_utc(&caps)?;
            Some((m.start(), m.len(), at))
        })
        .min_by_key(|&(start, len, _)| (start, Reverse(len)))
        .map(|(_, _, at)| at)
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name.get(..3)?.to_ascii_lowercase().as_str() {
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

fn number(caps: &Captures, name: &str) -> Option<u32> {
    caps.name(name)?.as_str().parse().ok()
}

fn to_utc(caps: &Captures) -> Option<DateTime<Utc>> {
    let year: i32 = caps.name("year")?.as_str().parse().ok()?;
    let month = match caps.name("mname") {
        Some(m) => month_number(m.as_str())?,
        None => number(caps, "mnum")?,
    };
    let day = number(caps, "day")?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let naive = date.and_time(time_of(caps));
    match offset_of(caps) {
        Some(offset) => offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc)),
        None => Some(Utc.from_utc_datetime(&naive)),
    }
}

/// The matched time of day; midnight when absent or out of range.
fn time_of(caps: &Captures) -> NaiveTime {
    if let Some(word) = caps.name("word") {
        let hour = if word.as_str().eq_ignore_ascii_case("noon") { 12 } else { 0 };
        return NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    }
    let Some(mut hour) = number(caps, "hour") else {
        return NaiveTime::MIN;
    };
    let minute = number(caps, "minute").unwrap_or(0);
    let second = number(caps, "second").unwrap_or(0);
    if let Some(ampm) = caps.name("ampm") {
        let pm = ampm.as_str().eq_ignore_ascii_case("p");
        hour = match (hour, pm) {
            (12, false) => 0,
            (h, true) if h < 12 => h + 12,
            (h, _) => h,
        };
    }
    NaiveTime::from_hms_opt(hour, minute, second).unwrap_or(NaiveTime::MIN)
}

fn offset_of(caps: &Captures) -> Option<FixedOffset> {
    if caps.name("zname").is_some() {
        return FixedOffset::east_opt(0);
    }
    let raw = caps.name("zoff")?.as_str();
    let sign = if raw.starts_with('-') { -1 } else { 1 };
    let digits: String = raw[1..].chars().filter(char::is_ascii_digit).collect();
    let hours: i32 = digits.get(..2)?.parse().ok()?;
    let minutes: i32 = digits.get(2..4)?.parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
