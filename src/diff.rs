use std::collections::{HashMap, HashSet};

use crate::config::FirstRunPolicy;
use crate::extract::CourtAvailability;

/// Slots to report for one venue, grouped by court.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueSlots {
    pub venue: String,
    pub courts: Vec<CourtAvailability>,
}

impl VenueSlots {
    pub fn slot_count(&self) -> usize {
        self.courts.iter().map(|c| c.slots.len()).sum()
    }
}

/// Labels present in `current` but not in `previous`, court by court.
///
/// Only courts that gained something are returned, carrying only the gained
/// labels. A court going from available to empty is not news. `previous` is
/// `None` when the venue has never been checked for this scope, in which case
/// `policy` decides.
pub fn compute_new_slots(
    current: &[CourtAvailability],
    previous: Option<&[CourtAvailability]>,
    policy: FirstRunPolicy,
) -> Vec<CourtAvailability> {
    let Some(previous) = previous else {
        return match policy {
            FirstRunPolicy::Announce => current.iter().filter(|c| !c.is_empty()).cloned().collect(),
            FirstRunPolicy::Suppress => Vec::new(),
        };
    };

    let seen: HashMap<&str, HashSet<&str>> = previous
        .iter()
        .map(|c| (c.court.as_str(), c.slots.iter().map(String::as_str).collect()))
        .collect();

    current
        .iter()
        .filter_map(|court| {
            let known = seen.get(court.court.as_str());
            let gained: Vec<String> = court
                .slots
                .iter()
                .filter(|slot| !known.is_some_and(|k| k.contains(slot.as_str())))
                .cloned()
                .collect();
            (!gained.is_empty()).then(|| CourtAvailability::new(&court.court, gained))
        })
        .collect()
}

/// Everything currently bookable, for the notify-always mode.
pub fn all_slots(current: &[CourtAvailability]) -> Vec<CourtAvailability> {
    current.iter().filter(|c| !c.is_empty()).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn court(name: &str, slots: &[&str]) -> CourtAvailability {
        CourtAvailability::new(name, slots.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn surfaces_only_the_added_labels() {
        let previous = [court("Court 1", &["7am"])];
        let current = [court("Court 1", &["7am", "9pm"])];
        assert_eq!(
            compute_new_slots(&current, Some(&previous), FirstRunPolicy::Announce),
            [court("Court 1", &["9pm"])]
        );
    }

    #[test]
    fn identical_state_is_quiet_every_time() {
        let state = [court("Court 1", &["7am", "8am"]), court("Court 2", &[])];
        for _ in 0..2 {
            assert!(compute_new_slots(&state, Some(&state), FirstRunPolicy::Announce).is_empty());
        }
    }

    #[test]
    fn label_order_does_not_matter() {
        let previous = [court("Court 1", &["8am", "7am"])];
        let current = [court("Court 1", &["7am", "8am"])];
        assert!(compute_new_slots(&current, Some(&previous), FirstRunPolicy::Announce).is_empty());
    }

    #[test]
    fn lost_slots_are_not_news() {
        let previous = [court("Court 1", &["7am", "8am"]), court("Court 2", &["9am"])];
        let current = [court("Court 1", &["7am"]), court("Court 2", &[])];
        assert!(compute_new_slots(&current, Some(&previous), FirstRunPolicy::Announce).is_empty());
    }

    #[test]
    fn previously_unseen_court_is_entirely_new() {
        let previous = [court("Court 1", &["7am"])];
        let current = [court("Court 1", &["7am"]), court("Court 2", &["7am", "8am"])];
        assert_eq!(
            compute_new_slots(&current, Some(&previous), FirstRunPolicy::Suppress),
            [court("Court 2", &["7am", "8am"])]
        );
    }

    #[test]
    fn labels_are_compared_per_court() {
        let previous = [court("Court 1", &["7am"])];
        let current = [court("Court 1", &[]), court("Court 2", &["7am"])];
        assert_eq!(
            compute_new_slots(&current, Some(&previous), FirstRunPolicy::Announce),
            [court("Court 2", &["7am"])]
        );
    }

    #[test]
    fn first_run_announce_reports_everything_available() {
        let current = [court("Court 1", &["7am"]), court("Court 2", &[])];
        assert_eq!(
            compute_new_slots(&current, None, FirstRunPolicy::Announce),
            [court("Court 1", &["7am"])]
        );
    }

    #[test]
    fn first_run_suppress_reports_nothing() {
        let current = [court("Court 1", &["7am"])];
        assert!(compute_new_slots(&current, None, FirstRunPolicy::Suppress).is_empty());
    }

    #[test]
    fn fully_booked_court_is_never_new() {
        let current = [court("Court 1", &[])];
        assert!(compute_new_slots(&current, None, FirstRunPolicy::Announce).is_empty());
        assert!(compute_new_slots(&current, Some(&[]), FirstRunPolicy::Announce).is_empty());
    }

    #[test]
    fn counts_slots_across_courts() {
        let venue = VenueSlots {
            venue: "Riverside".into(),
            courts: vec![court("Court 1", &["7am", "8am"]), court("Court 2", &["9pm"])],
        };
        assert_eq!(venue.slot_count(), 3);
        assert_eq!(all_slots(&[court("A", &[]), court("B", &["1pm"])]), [court("B", &["1pm"])]);
    }
}
