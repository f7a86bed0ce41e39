use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Duration, PrimitiveDateTime, UtcDateTime};

use crate::consts::{ARCHIVED_REGEX, DASHED_TIME_REGEX, MERIDIEM_REGEX, NOON_REGEX, PM_REGEX, RELATIVE_REGEX};

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;
const WEEK_MS: i64 = 7 * DAY_MS;

const DATE_TIME_FORMATS: &[&[BorrowedFormatItem<'static>]] = &[
    format_description!(
        "[day padding:none] [month repr:long case_sensitive:false] [year] [hour padding:none]:[minute]"
    ),
    format_description!(
        "[day padding:none] [month repr:short case_sensitive:false] [year] [hour padding:none]:[minute]"
    ),
    format_description!(
        "[month repr:long case_sensitive:false] [day padding:none], [year] [hour padding:none]:[minute]"
    ),
    format_description!(
        "[month repr:short case_sensitive:false] [day padding:none], [year] [hour padding:none]:[minute]"
    ),
    format_description!("[year]-[month]-[day] [hour padding:none]:[minute]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
];

const DATE_FORMATS: &[&[BorrowedFormatItem<'static>]] = &[
    format_description!("[day padding:none] [month repr:long case_sensitive:false] [year]"),
    format_description!("[day padding:none] [month repr:short case_sensitive:false] [year]"),
    format_description!("[month repr:long case_sensitive:false] [day padding:none], [year]"),
    format_description!("[month repr:short case_sensitive:false] [day padding:none], [year]"),
    format_description!("[year]-[month]-[day]"),
];

/// Parse a scraped upload date into Unix epoch milliseconds.
///
/// Relative phrases (`"a day ago"`, `"3 hours ago"`) are resolved against
/// `now`. Absolute dates are read as UTC; a trailing `PM` adds twelve hours
/// unless the time falls in the noon hour. Unrecognized text yields `None`,
/// which filters must treat as "unknown" rather than as a violation.
pub fn parse_upload_date(raw: &str, now: UtcDateTime) -> Option<i64> {
    let text = raw.trim();
    let text = ARCHIVED_REGEX.replace(text, "$1");
    if let Some(captures) = RELATIVE_REGEX.captures(&text) {
        let count: i64 = match &captures[1] {
            a if a.eq_ignore_ascii_case("a") || a.eq_ignore_ascii_case("an") => 1,
            n => n.parse().ok()?,
        };
        let unit = match captures[2].to_ascii_lowercase().as_str() {
            "minute" => MINUTE_MS,
            "hour" => HOUR_MS,
            "day" => DAY_MS,
            _ => WEEK_MS,
        };
        let now_ms = i64::try_from(now.unix_timestamp_nanos() / 1_000_000).ok()?;
        return now_ms.checked_sub(count.checked_mul(unit)?);
    }

    let afternoon = PM_REGEX.is_match(&text) && !NOON_REGEX.is_match(&text);
    let text = MERIDIEM_REGEX.replace(&text, "");
    let text = DASHED_TIME_REGEX.replace(&text, "$1 $2");
    let parsed = parse_absolute(&text)?;
    let parsed = match afternoon {
        true => parsed.checked_add(Duration::hours(12))?,
        false => parsed,
    };
    Some(parsed.assume_utc().unix_timestamp() * 1000)
}

fn parse_absolute(text: &str) -> Option<PrimitiveDateTime> {
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| PrimitiveDateTime::parse(text, format).ok())
        .or_else(|| DATE_FORMATS.iter().find_map(|format| Date::parse(text, format).ok()).map(Date::midnight))
}
