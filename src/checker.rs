use std::fmt;

use chrono::{Local, NaiveDate};
use color_eyre::Report;
use log::{info, warn};

use crate::config::{NotifyMode, RunConfig, Venue};
use crate::diff::{VenueSlots, all_slots, compute_new_slots};
use crate::extract::{CourtAvailability, extract};
use crate::notifier::{Notifier, TITLE, render_message};
use crate::scraper::ScheduleSource;
use crate::storage::{ScopeKey, Snapshot, StateStore};
use crate::time::format_date;

#[derive(Debug)]
pub struct VenueReport {
    pub venue_name: String,
    pub outcome: Result<Checked, Report>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checked {
    pub courts: Vec<CourtAvailability>,
    pub new_slots: Vec<CourtAvailability>,
    pub first_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    NothingToSend,
    Disabled,
    Failed,
}

#[derive(Debug)]
pub struct DateReport {
    pub date: NaiveDate,
    pub venues: Vec<VenueReport>,
    pub delivery: Delivery,
    /// Venue ids whose snapshot could not be written.
    pub unsaved: Vec<String>,
}

impl DateReport {
    pub fn failed(&self) -> bool {
        !self.unsaved.is_empty() || self.venues.iter().any(|v| v.outcome.is_err())
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub dates: Vec<DateReport>,
}

impl RunReport {
    pub fn failed(&self) -> bool {
        self.dates.iter().any(DateReport::failed)
    }
}

/// One polling run: every configured date, every selected venue.
pub struct Checker<'a> {
    config: &'a RunConfig,
    source: &'a dyn ScheduleSource,
    notifier: Option<&'a dyn Notifier>,
    store: &'a StateStore,
}

impl<'a> Checker<'a> {
    pub fn new(
        config: &'a RunConfig,
        source: &'a dyn ScheduleSource,
        notifier: Option<&'a dyn Notifier>,
        store: &'a StateStore,
    ) -> Self {
        Self {
            config,
            source,
            notifier,
            store,
        }
    }

    pub fn run(&self) -> RunReport {
        RunReport {
            dates: self
                .config
                .dates
                .iter()
                .map(|&date| self.check_date(date))
                .collect(),
        }
    }

    fn scope(&self, venue: &Venue, date: NaiveDate) -> ScopeKey {
        ScopeKey::new(&venue.id, self.config.per_date_state.then_some(date))
    }

    fn check_date(&self, date: NaiveDate) -> DateReport {
        info!("Checking availability for {}", format_date(date));

        let venues: Vec<_> = self
            .config
            .venues
            .iter()
            .map(|venue| self.check_venue(venue, date))
            .collect();

        let to_announce: Vec<_> = venues
            .iter()
            .filter_map(|report| {
                let checked = report.outcome.as_ref().ok()?;
                let courts = match self.config.notify_mode {
                    NotifyMode::OnNew => checked.new_slots.clone(),
                    NotifyMode::Always => all_slots(&checked.courts),
                };
                Some(VenueSlots {
                    venue: report.venue_name.clone(),
                    courts,
                })
            })
            .collect();

        let delivery = self.notify(date, &to_announce);

        // saved whatever happened to the notification
        let last_checked = Local::now().to_rfc3339();
        let unsaved = self
            .config
            .venues
            .iter()
            .zip(&venues)
            .filter_map(|(venue, report)| {
                let checked = report.outcome.as_ref().ok()?;
                let snapshot = Snapshot {
                    venue_name: venue.name.clone(),
                    courts: checked.courts.clone(),
                    last_checked: Some(last_checked.clone()),
                };
                match self.store.save(&self.scope(venue, date), &snapshot) {
                    Ok(()) => None,
                    Err(e) => {
                        warn!("Could not save state for {}: {:#}", venue.id, Report::new(e));
                        Some(venue.id.clone())
                    }
                }
            })
            .collect();

        DateReport {
            date,
            venues,
            delivery,
            unsaved,
        }
    }

    fn check_venue(&self, venue: &Venue, date: NaiveDate) -> VenueReport {
        info!("Checking {}...", venue.name);

        let outcome = self
            .source
            .fetch(venue, date)
            .and_then(|schedule| Ok(extract(&schedule, date)?))
            .map(|courts| {
                let previous = self.store.load(&self.scope(venue, date));
                let new_slots = compute_new_slots(
                    &courts,
                    previous.as_ref().map(|s| s.courts.as_slice()),
                    self.config.first_run,
                );
                Checked {
                    courts,
                    new_slots,
                    first_run: previous.is_none(),
                }
            })
            .map_err(Report::new);

        match &outcome {
            Ok(checked) if checked.new_slots.is_empty() => {
                info!("No new slots at {}", venue.name)
            }
            Ok(checked) => info!(
                "{} new slot(s) detected at {}",
                checked.new_slots.iter().map(|c| c.slots.len()).sum::<usize>(),
                venue.name
            ),
            Err(e) => warn!("Skipping {}: {e:#}", venue.name),
        }

        VenueReport {
            venue_name: venue.name.clone(),
            outcome,
        }
    }

    fn notify(&self, date: NaiveDate, venues: &[VenueSlots]) -> Delivery {
        let Some(message) = render_message(self.config.notify_mode, date, venues) else {
            return Delivery::NothingToSend;
        };
        let Some(notifier) = self.notifier.filter(|_| self.config.notifications) else {
            info!("Notifications disabled, not sending");
            return Delivery::Disabled;
        };

        let count: usize = venues.iter().map(VenueSlots::slot_count).sum();
        info!("Sending notification for {count} slot(s)");
        match notifier.send(TITLE, &message) {
            Ok(()) => Delivery::Sent,
            Err(e) => {
                warn!("Notification failed: {:#}", Report::new(e));
                Delivery::Failed
            }
        }
    }
}

impl fmt::Display for DateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Availability for {}", format_date(self.date))?;

        for venue in &self.venues {
            writeln!(f)?;
            writeln!(f, "== {} ==", venue.venue_name)?;
            match &venue.outcome {
                Ok(checked) => {
                    for court in &checked.courts {
                        writeln!(f, "{court}")?;
                    }
                    let new: usize = checked.new_slots.iter().map(|c| c.slots.len()).sum();
                    if checked.courts.iter().all(CourtAvailability::is_empty) {
                        writeln!(f, "✗ No availability")?;
                    } else if new > 0 {
                        writeln!(f, "🎾 {new} new slot(s)")?;
                    } else if checked.first_run {
                        writeln!(f, "✓ Baseline recorded")?;
                    } else {
                        writeln!(f, "✓ All slots were already known")?;
                    }
                }
                Err(e) => writeln!(f, "✗ Error: {e:#}")?,
            }
        }

        writeln!(f)?;
        let summary = match self.delivery {
            Delivery::Sent => "Notification sent",
            Delivery::NothingToSend => "Nothing to notify",
            Delivery::Disabled => "Notifications disabled",
            Delivery::Failed => "Notification FAILED",
        };
        writeln!(f, "{summary}")?;
        if !self.unsaved.is_empty() {
            writeln!(f, "State NOT saved for: {}", self.unsaved.join(", "))?;
        }
        Ok(())
    }
}
