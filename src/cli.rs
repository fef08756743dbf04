use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

use crate::config::{FirstRunPolicy, NotifyMode, RunConfig, Venue};

/// Check tennis court availability across venues and push new slots to Pushover.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Date to check (YYYY-MM-DD). Repeat for several dates. Defaults to today.
    #[arg(long = "date", value_name = "DATE")]
    pub dates: Vec<NaiveDate>,

    /// Venue ids to check. Defaults to every enabled venue.
    #[arg(long, value_name = "ID", num_args = 1..)]
    pub venues: Vec<String>,

    /// Notify about everything bookable, not just slots that are new since the last run.
    #[arg(long)]
    pub notify_always: bool,

    /// Print results only.
    #[arg(long)]
    pub no_notify: bool,

    /// What to do for a venue and date that has never been checked before.
    #[arg(long, value_enum, default_value_t)]
    pub first_run: FirstRunPolicy,

    /// Use the single legacy state file instead of one file per date.
    #[arg(long)]
    pub legacy_state: bool,

    /// Directory holding venues.json and the state files.
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    #[arg(long, value_name = "KEY")]
    pub pushover_user: Option<String>,

    #[arg(long, value_name = "TOKEN")]
    pub pushover_token: Option<String>,
}

impl Args {
    pub fn run_config(&self, venues: Vec<Venue>, today: NaiveDate) -> RunConfig {
        let mut dates = if self.dates.is_empty() {
            vec![today]
        } else {
            self.dates.clone()
        };
        dates.dedup();

        RunConfig {
            dates,
            venues,
            notify_mode: if self.notify_always {
                NotifyMode::Always
            } else {
                NotifyMode::OnNew
            },
            notifications: !self.no_notify,
            first_run: self.first_run,
            per_date_state: !self.legacy_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 20).unwrap()
    }

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_check_today_and_notify_on_new() {
        let args = Args::try_parse_from(["courtwatch"]).unwrap();
        let config = args.run_config(Vec::new(), today());
        assert_eq!(config.dates, [today()]);
        assert_eq!(config.notify_mode, NotifyMode::OnNew);
        assert_eq!(config.first_run, FirstRunPolicy::Announce);
        assert!(config.notifications);
        assert!(config.per_date_state);
    }

    #[test]
    fn parses_every_option() {
        let args = Args::try_parse_from([
            "courtwatch",
            "--date",
            "2025-10-21",
            "--date",
            "2025-10-22",
            "--venues",
            "rp",
            "hp",
            "--notify-always",
            "--no-notify",
            "--first-run",
            "suppress",
            "--legacy-state",
            "--config-dir",
            "/etc/courtwatch",
            "--pushover-user",
            "u",
            "--pushover-token",
            "t",
        ])
        .unwrap();
        assert_eq!(args.venues, ["rp", "hp"]);
        assert_eq!(args.config_dir, Some(PathBuf::from("/etc/courtwatch")));
        assert_eq!(args.pushover_user.as_deref(), Some("u"));

        let config = args.run_config(Vec::new(), today());
        assert_eq!(config.dates.len(), 2);
        assert_eq!(config.dates[0], NaiveDate::from_ymd_opt(2025, 10, 21).unwrap());
        assert_eq!(config.notify_mode, NotifyMode::Always);
        assert_eq!(config.first_run, FirstRunPolicy::Suppress);
        assert!(!config.notifications);
        assert!(!config.per_date_state);
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(Args::try_parse_from(["courtwatch", "--date", "20/10/2025"]).is_err());
        assert!(Args::try_parse_from(["courtwatch", "--first-run", "maybe"]).is_err());
    }
}
