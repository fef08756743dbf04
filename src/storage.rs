use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::extract::CourtAvailability;

const STATE_DIR: &str = "state";
const LEGACY_STATE_FILE: &str = "availability_state.json";

/// Which snapshot to read or write: a venue, optionally narrowed to one date.
/// Without a date the legacy single state file is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeKey {
    pub venue_id: String,
    pub date: Option<NaiveDate>,
}

impl ScopeKey {
    pub fn new(venue_id: impl Into<String>, date: Option<NaiveDate>) -> Self {
        Self {
            venue_id: venue_id.into(),
            date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub venue_name: String,
    pub courts: Vec<CourtAvailability>,
    pub last_checked: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_checked: Option<String>,
    #[serde(flatten)]
    venues: BTreeMap<String, VenueEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct VenueEntry {
    name: String,
    availability: Vec<String>,
}

pub struct StateStore {
    root: PathBuf,
}

impl StateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, date: Option<NaiveDate>) -> PathBuf {
        match date {
            Some(date) => self
                .root
                .join(STATE_DIR)
                .join(format!("availability_state_{}.json", date.format("%Y-%m-%d"))),
            None => self.root.join(LEGACY_STATE_FILE),
        }
    }

    /// The last saved snapshot for `scope`, or `None` if there is none or it
    /// cannot be read. Unreadable state is logged and otherwise ignored.
    pub fn load(&self, scope: &ScopeKey) -> Option<Snapshot> {
        let path = self.path_for(scope.date);
        let file = read_state_file(&path)?;
        let entry = file.venues.get(&scope.venue_id)?;

        let courts: Option<Vec<_>> = entry
            .availability
            .iter()
            .map(|line| CourtAvailability::from_line(line))
            .collect();
        let Some(courts) = courts else {
            warn!(
                "Ignoring corrupt state for {} in {}",
                scope.venue_id,
                path.display()
            );
            return None;
        };

        Some(Snapshot {
            venue_name: entry.name.clone(),
            courts,
            last_checked: file.last_checked,
        })
    }

    /// Replaces the snapshot for `scope`. Other venues sharing the state file
    /// are kept; nothing from this venue's previous snapshot is.
    pub fn save(&self, scope: &ScopeKey, snapshot: &Snapshot) -> Result<(), StateError> {
        let path = self.path_for(scope.date);
        let mut file = read_state_file(&path).unwrap_or_default();

        file.venues.insert(
            scope.venue_id.clone(),
            VenueEntry {
                name: snapshot.venue_name.clone(),
                availability: snapshot
                    .courts
                    .iter()
                    .filter(|c| !c.is_empty())
                    .map(ToString::to_string)
                    .collect(),
            },
        );
        if snapshot.last_checked.is_some() {
            file.last_checked.clone_from(&snapshot.last_checked);
        }

        let write_err = |source| StateError::Write {
            path: path.clone(),
            source,
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(write_err)?;
        }
        fs::write(&path, serde_json::to_string_pretty(&file)?).map_err(write_err)?;
        debug!("Saved {} state to {}", scope.venue_id, path.display());
        Ok(())
    }
}

fn read_state_file(path: &Path) -> Option<StateFile> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("Could not read state file {}: {e}", path.display());
            return None;
        }
    };

    serde_json::from_str(&raw)
        .inspect_err(|e| warn!("Ignoring corrupt state file {}: {e}", path.display()))
        .ok()
}
