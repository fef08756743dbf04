use std::path::PathBuf;

use thiserror::Error;

use crate::time::InvalidInput;

/// Problems with `venues.json` or the requested run. Fatal before any fetch.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("venue file {path} could not be read")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("venue file {path} is not valid")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("venue entry #{index} is invalid: {reason}")]
    BadVenue { index: usize, reason: String },
    #[error("unknown venue id `{0}`")]
    UnknownVenue(String),
    #[error("no enabled venues to check")]
    NoVenues,
}

/// The payload did not have the shape the extractor relies on.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("schedule payload is not valid JSON of the expected shape")]
    Json(#[from] serde_json::Error),
    #[error("court `{court}` has a day with unreadable date `{date}`")]
    BadDayDate { court: String, date: String },
    #[error("court `{court}` has a session outside the day")]
    SessionTime {
        court: String,
        #[source]
        source: InvalidInput,
    },
}

/// Why a single venue produced no availability this run.
#[derive(Debug, Error)]
pub enum VenueError {
    #[error("fetch failed")]
    Fetch(#[from] reqwest::Error),
    #[error("could not parse schedule")]
    Parse(#[from] ParseError),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("pushover request failed")]
    Transport(#[from] reqwest::Error),
    #[error("pushover rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Failure to write a snapshot. Loading never fails: unreadable state is
/// reported and treated as absent.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("could not write state file {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not encode state")]
    Encode(#[from] serde_json::Error),
}
