use std::time::Duration;

use chrono::NaiveDate;
use log::debug;
use reqwest::blocking::Client;
use serde::Deserialize;
use strum_macros::Display;

use crate::config::{Settings, Venue};
use crate::error::{ParseError, VenueError};

/// One venue's schedule as returned by the booking API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Schedule {
    pub resources: Vec<Court>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Court {
    pub name: String,
    #[serde(default)]
    pub days: Vec<Day>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Day {
    /// Calendar date, sometimes with a time of day attached (`2025-10-20T00:00:00`).
    pub date: String,
    #[serde(default)]
    pub sessions: Vec<Session>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Session {
    pub start_time: i64,
    pub end_time: i64,
    pub category: i64,
    #[serde(default)]
    pub capacity: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SessionStatus {
    #[strum(to_string = "open")]
    Open,
    #[strum(to_string = "booked")]
    Booked,
    /// Class, programmed session, closure or a code we have not seen yet.
    #[strum(to_string = "unavailable")]
    Unavailable,
}

impl From<i64> for SessionStatus {
    fn from(code: i64) -> Self {
        match code {
            0 => Self::Open,
            1000 => Self::Booked,
            _ => Self::Unavailable,
        }
    }
}

impl Session {
    pub fn status(&self) -> SessionStatus {
        self.category.into()
    }

    pub fn is_bookable(&self) -> bool {
        self.status() == SessionStatus::Open && self.capacity >= 1
    }
}

pub fn parse_schedule(body: &str) -> Result<Schedule, ParseError> {
    Ok(serde_json::from_str(body)?)
}

/// Where schedules come from. The HTTP implementation is the only one outside tests.
pub trait ScheduleSource {
    fn fetch(&self, venue: &Venue, date: NaiveDate) -> Result<Schedule, VenueError>;
}

pub struct HttpScheduleSource {
    client: Client,
}

impl HttpScheduleSource {
    pub fn new(settings: &Settings) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(&settings.user_agent)
            .timeout(Duration::from_secs(settings.http_timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

impl ScheduleSource for HttpScheduleSource {
    fn fetch(&self, venue: &Venue, date: NaiveDate) -> Result<Schedule, VenueError> {
        let url = venue.url_for(date);
        debug!("Fetching {} schedule from {url}", venue.id);

        let body = self
            .client
            .get(&url)
            .send()?
            .error_for_status()?
            .text()?;
        Ok(parse_schedule(&body)?)
    }
}
