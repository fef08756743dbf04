use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::ValueEnum;
use color_eyre::{Result, eyre::Context};
use serde::Deserialize;

use crate::error::ConfigError;

pub const ENV_PREFIX: &str = "COURTWATCH_";
pub const DATE_PLACEHOLDER: &str = "{date}";
pub const VENUES_FILE: &str = "venues.json";

/// Settings read from the environment (and `.env`), all prefixed with
/// `COURTWATCH_`. Command line flags take precedence.
#[derive(Debug, Deserialize)]
pub struct Settings {
    pub pushover_user: Option<String>,
    pub pushover_token: Option<String>,
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_config_dir() -> PathBuf {
    "config".into()
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).into()
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars()).wrap_err("failed to load settings from environment")
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(ENV_PREFIX).from_iter(vars)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Venue {
    pub id: String,
    pub name: String,
    pub url_template: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl Venue {
    pub fn url_for(&self, date: NaiveDate) -> String {
        self.url_template
            .replace(DATE_PLACEHOLDER, &date.format("%Y-%m-%d").to_string())
    }

    fn validate(&self, index: usize) -> Result<(), ConfigError> {
        let bad = |reason: &str| ConfigError::BadVenue {
            index,
            reason: reason.to_string(),
        };

        if self.id.trim().is_empty() {
            return Err(bad("empty id"));
        }
        if self.id.contains(char::is_whitespace) {
            return Err(bad("id contains whitespace"));
        }
        if self.name.trim().is_empty() {
            return Err(bad("empty name"));
        }
        if !self.url_template.contains(DATE_PLACEHOLDER) {
            return Err(bad("url_template has no {date} placeholder"));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct VenueFile {
    venues: Vec<Venue>,
}

pub fn load_venues(path: &Path) -> Result<Vec<Venue>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_venues(&raw).map_err(|err| match err {
        ParseVenues::Json(source) => ConfigError::Malformed {
            path: path.to_path_buf(),
            source,
        },
        ParseVenues::Invalid(err) => err,
    })
}

enum ParseVenues {
    Json(serde_json::Error),
    Invalid(ConfigError),
}

fn parse_venues(raw: &str) -> Result<Vec<Venue>, ParseVenues> {
    let file: VenueFile = serde_json::from_str(raw).map_err(ParseVenues::Json)?;

    let mut seen = HashSet::new();
    for (index, venue) in file.venues.iter().enumerate() {
        venue.validate(index).map_err(ParseVenues::Invalid)?;
        if !seen.insert(venue.id.as_str()) {
            return Err(ParseVenues::Invalid(ConfigError::BadVenue {
                index,
                reason: format!("duplicate id `{}`", venue.id),
            }));
        }
    }
    Ok(file.venues)
}

/// Picks the venues for this run. An explicit list selects those venues
/// whether or not they are enabled; an empty list means every enabled venue.
pub fn select_venues(all: Vec<Venue>, requested: &[String]) -> Result<Vec<Venue>, ConfigError> {
    if let Some(unknown) = requested
        .iter()
        .find(|id| !all.iter().any(|v| &v.id == *id))
    {
        return Err(ConfigError::UnknownVenue(unknown.clone()));
    }

    let selected: Vec<_> = if requested.is_empty() {
        all.into_iter().filter(|v| v.enabled).collect()
    } else {
        all.into_iter().filter(|v| requested.contains(&v.id)).collect()
    };

    if selected.is_empty() {
        return Err(ConfigError::NoVenues);
    }
    Ok(selected)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum NotifyMode {
    /// Only slots that were not there on the previous run.
    #[default]
    OnNew,
    /// Everything currently bookable.
    Always,
}

/// What counts as new when a venue has no previous snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FirstRunPolicy {
    #[default]
    Announce,
    Suppress,
}

/// Everything a run needs to know, fixed before the first fetch.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub dates: Vec<NaiveDate>,
    pub venues: Vec<Venue>,
    pub notify_mode: NotifyMode,
    pub notifications: bool,
    pub first_run: FirstRunPolicy,
    /// Keep one state file per date. When off, the legacy single file is used.
    pub per_date_state: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn venue(id: &str, enabled: bool) -> Venue {
        Venue {
            id: id.into(),
            name: format!("{id} park"),
            url_template: "https://example.test/{date}".into(),
            enabled,
        }
    }

    #[test]
    fn substitutes_date_into_template() {
        let v = venue("a", true);
        let date = NaiveDate::from_ymd_opt(2025, 10, 20).unwrap();
        assert_eq!(v.url_for(date), "https://example.test/2025-10-20");
    }

    #[test]
    fn parses_venue_file_with_default_enabled() {
        let raw = r#"{"venues": [
            {"id": "rp", "name": "Riverside", "url_template": "https://x/{date}"},
            {"id": "hp", "name": "Hillside", "url_template": "https://y/{date}", "enabled": false}
        ]}"#;
        let venues = parse_venues(raw).ok().unwrap();
        assert_eq!(venues.len(), 2);
        assert!(venues[0].enabled);
        assert!(!venues[1].enabled);
    }

    #[test]
    fn rejects_template_without_placeholder() {
        let raw = r#"{"venues": [{"id": "rp", "name": "Riverside", "url_template": "https://x/"}]}"#;
        assert!(matches!(
            parse_venues(raw),
            Err(ParseVenues::Invalid(ConfigError::BadVenue { index: 0, .. }))
        ));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let raw = r#"{"venues": [
            {"id": "rp", "name": "A", "url_template": "https://x/{date}"},
            {"id": "rp", "name": "B", "url_template": "https://y/{date}"}
        ]}"#;
        assert!(matches!(
            parse_venues(raw),
            Err(ParseVenues::Invalid(ConfigError::BadVenue { index: 1, .. }))
        ));
    }

    #[test]
    fn rejects_missing_fields() {
        let raw = r#"{"venues": [{"id": "rp"}]}"#;
        assert!(matches!(parse_venues(raw), Err(ParseVenues::Json(_))));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_venues(&dir.path().join(VENUES_FILE)).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn selects_enabled_venues_by_default() {
        let all = vec![venue("a", true), venue("b", false), venue("c", true)];
        let ids: Vec<_> = select_venues(all, &[])
            .unwrap()
            .into_iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn explicit_selection_includes_disabled_venues() {
        let all = vec![venue("a", true), venue("b", false)];
        let selected = select_venues(all, &["b".to_string()]).unwrap();
        assert_eq!(selected, vec![venue("b", false)]);
    }

    #[test]
    fn unknown_or_empty_selection_is_fatal() {
        let all = vec![venue("a", true)];
        assert!(matches!(
            select_venues(all, &["zz".to_string()]),
            Err(ConfigError::UnknownVenue(id)) if id == "zz"
        ));
        assert!(matches!(
            select_venues(vec![venue("a", false)], &[]),
            Err(ConfigError::NoVenues)
        ));
    }

    #[test]
    fn settings_fall_back_to_defaults() {
        let settings = Settings::from_vars(Vec::new()).unwrap();
        assert_eq!(settings.config_dir, PathBuf::from("config"));
        assert_eq!(settings.http_timeout_secs, 30);
        assert!(settings.pushover_user.is_none());
    }

    #[test]
    fn settings_read_prefixed_vars() {
        let settings = Settings::from_vars(vec![
            ("COURTWATCH_PUSHOVER_USER".to_string(), "u".to_string()),
            ("COURTWATCH_HTTP_TIMEOUT_SECS".to_string(), "5".to_string()),
            ("PUSHOVER_TOKEN".to_string(), "ignored".to_string()),
        ])
        .unwrap();
        assert_eq!(settings.pushover_user.as_deref(), Some("u"));
        assert_eq!(settings.http_timeout_secs, 5);
        assert!(settings.pushover_token.is_none());
    }
}
