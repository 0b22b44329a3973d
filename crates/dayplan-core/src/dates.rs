//! Deadline phrase parsing.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

/// Parse a deadline relative to `now`.
///
/// Accepts `today`, `tomorrow`, `in N days`, `in N hours`, RFC 3339
/// timestamps, naive date-times and a few date-only formats. Date-only
/// forms resolve to the last second of that day in `now`'s offset.
pub fn parse_deadline(input: &str, now: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
    let raw = input.trim();
    let text = raw.to_ascii_lowercase();
    if text.is_empty() {
        return None;
    }

    match text.as_str() {
        "today" => return end_of_day(now.date_naive(), now.offset()),
        "tomorrow" => return end_of_day(now.date_naive().succ_opt()?, now.offset()),
        _ => {}
    }

    if let Some(rest) = text.strip_prefix("in ") {
        return parse_relative(rest, now);
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts);
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return now.offset().from_local_datetime(&naive).single();
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&text, format).ok())
        .and_then(|date| end_of_day(date, now.offset()))
}

fn parse_relative(rest: &str, now: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
    let mut parts = rest.split_whitespace();
    let amount: i64 = parts.next()?.parse().ok()?;
    let unit = parts.next()?;
    if parts.next().is_some() || amount < 0 {
        return None;
    }

    // Amounts beyond chrono's range read as no deadline.
    match unit.trim_end_matches('s') {
        "day" => end_of_day(
            now.date_naive().checked_add_signed(Duration::try_days(amount)?)?,
            now.offset(),
        ),
        "week" => end_of_day(
            now.date_naive().checked_add_signed(Duration::try_weeks(amount)?)?,
            now.offset(),
        ),
        "hour" => now.checked_add_signed(Duration::try_hours(amount)?),
        _ => None,
    }
}

fn end_of_day(date: NaiveDate, offset: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    let last_second = NaiveTime::from_hms_opt(23, 59, 59)?;
    offset.from_local_datetime(&date.and_time(last_second)).single()
}
