use chrono::{Datelike, NaiveDate};
use thiserror::Error;

pub const MINUTES_PER_HOUR: i64 = 60;
pub const MINUTES_PER_DAY: i64 = 24 * MINUTES_PER_HOUR;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidInput {
    #[error("{0} is not a time of day (expected minutes in 0..1440)")]
    MinutesOutOfRange(i64),
    #[error("`{0}` is not an hour label")]
    BadLabel(String),
}

/// Formats minutes since midnight as a 12-hour label, e.g. `420` -> `"7am"`.
///
/// Minutes within the hour are dropped: `450` is still `"7am"`.
pub fn format_hour(minutes: i64) -> Result<String, InvalidInput> {
    if !(0..MINUTES_PER_DAY).contains(&minutes) {
        return Err(InvalidInput::MinutesOutOfRange(minutes));
    }

    let label = match minutes / MINUTES_PER_HOUR {
        0 => "12am".to_string(),
        hour @ 1..=11 => format!("{hour}am"),
        12 => "12pm".to_string(),
        hour => format!("{}pm", hour - 12),
    };
    Ok(label)
}

/// Inverse of [`format_hour`]: returns the hour of day (0..24) a label names.
pub fn parse_hour_label(label: &str) -> Result<u32, InvalidInput> {
    let bad = || InvalidInput::BadLabel(label.to_string());

    let (digits, pm) = if let Some(d) = label.strip_suffix("am") {
        (d, false)
    } else if let Some(d) = label.strip_suffix("pm") {
        (d, true)
    } else {
        return Err(bad());
    };

    let hour: u32 = digits.parse().map_err(|_| bad())?;
    match (hour, pm) {
        (12, false) => Ok(0),
        (12, true) => Ok(12),
        (1..=11, false) => Ok(hour),
        (1..=11, true) => Ok(hour + 12),
        _ => Err(bad()),
    }
}

/// Human form of a date for reports and notifications: `Monday Oct. 20`.
pub fn format_date(date: NaiveDate) -> String {
    format!("{} {}", date.format("%A %b."), date.day())
}
