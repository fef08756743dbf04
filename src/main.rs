use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use color_eyre::{Result, eyre::Context};
use log::warn;

mod checker;
mod cli;
mod config;
mod diff;
mod error;
mod extract;
mod notifier;
mod scraper;
mod storage;
mod time;

use crate::checker::Checker;
use crate::cli::Args;
use crate::config::{Settings, VENUES_FILE, load_venues, select_venues};
use crate::notifier::{Notifier, PushoverNotifier};
use crate::scraper::HttpScheduleSource;
use crate::storage::StateStore;

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let settings = Settings::from_env()?;
    let config_dir = args.config_dir.clone().unwrap_or_else(|| settings.config_dir.clone());

    let venues = load_venues(&config_dir.join(VENUES_FILE))
        .and_then(|all| select_venues(all, &args.venues))
        .wrap_err("invalid configuration")?;
    let config = args.run_config(venues, Local::now().date_naive());

    let source = HttpScheduleSource::new(&settings).wrap_err("failed to build http client")?;
    let pushover = match (
        args.pushover_user.clone().or_else(|| settings.pushover_user.clone()),
        args.pushover_token.clone().or_else(|| settings.pushover_token.clone()),
    ) {
        _ if !config.notifications => None,
        (Some(user), Some(token)) => Some(
            PushoverNotifier::new(&settings, user, token)
                .wrap_err("failed to build pushover client")?,
        ),
        _ => {
            warn!("Pushover credentials not set. Skipping notifications.");
            None
        }
    };
    let store = StateStore::new(&config_dir);

    let report = Checker::new(
        &config,
        &source,
        pushover.as_ref().map(|p| p as &dyn Notifier),
        &store,
    )
    .run();

    for date in &report.dates {
        println!("{date}");
    }

    Ok(if report.failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
