use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use log::debug;

use crate::error::ParseError;
use crate::scraper::{Court, Schedule, Session};
use crate::time::{InvalidInput, MINUTES_PER_HOUR, format_hour, parse_hour_label};

const NO_AVAILABILITY: &str = "No availability";

/// Bookable hours of one court on one date. An empty `slots` is the
/// "no availability" marker; the court is still listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourtAvailability {
    pub court: String,
    pub slots: Vec<String>,
}

impl CourtAvailability {
    pub fn new(court: impl Into<String>, slots: Vec<String>) -> Self {
        Self {
            court: court.into(),
            slots,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Reads back a line written by the `Display` impl, e.g. `Court 1: 7am, 8am`.
    pub fn from_line(line: &str) -> Option<Self> {
        let (court, slots) = line.rsplit_once(": ")?;
        let slots = if slots == NO_AVAILABILITY {
            Vec::new()
        } else {
            slots.split(", ").map(String::from).collect()
        };
        if slots.iter().any(|s| parse_hour_label(s).is_err()) {
            return None;
        }
        Some(Self::new(court, slots))
    }
}

impl fmt::Display for CourtAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.slots.is_empty() {
            write!(f, "{}: {NO_AVAILABILITY}", self.court)
        } else {
            write!(f, "{}: {}", self.court, self.slots.join(", "))
        }
    }
}

/// Per-court bookable hours for `date`, in payload court order.
pub fn extract(schedule: &Schedule, date: NaiveDate) -> Result<Vec<CourtAvailability>, ParseError> {
    schedule
        .resources
        .iter()
        .map(|court| -> Result<_, ParseError> {
            let sessions = sessions_on(court, date)?;
            let slots = bookable_hours(&court.name, sessions).map_err(|source| ParseError::SessionTime {
                court: court.name.clone(),
                source,
            })?;
            Ok(CourtAvailability::new(&court.name, slots))
        })
        .collect()
}

fn sessions_on(court: &Court, date: NaiveDate) -> Result<&[Session], ParseError> {
    for day in &court.days {
        if day_date(&day.date).ok_or_else(|| ParseError::BadDayDate {
            court: court.name.clone(),
            date: day.date.clone(),
        })? == date
        {
            return Ok(&day.sessions);
        }
    }
    Ok(&[])
}

/// Calendar part of `2025-10-20` or `2025-10-20T00:00:00`.
fn day_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

fn bookable_hours(court: &str, sessions: &[Session]) -> Result<Vec<String>, InvalidInput> {
    let mut hours = BTreeMap::new();

    for session in sessions {
        if !session.is_bookable() {
            debug!(
                "{court}: skipping {} session at {} (capacity {})",
                session.status(),
                session.start_time,
                session.capacity
            );
            continue;
        }

        format_hour(session.start_time)?;
        // partial trailing hours are dropped, inverted intervals yield nothing
        let whole_hours = session
            .end_time
            .saturating_sub(session.start_time)
            .max(0)
            / MINUTES_PER_HOUR;
        for n in 0..whole_hours {
            let minutes = session.start_time + n * MINUTES_PER_HOUR;
            let label = format_hour(minutes)?;
            hours.entry(minutes / MINUTES_PER_HOUR).or_insert(label);
        }
    }

    Ok(hours.into_values().collect())
}
