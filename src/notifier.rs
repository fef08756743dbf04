use std::time::Duration;

use chrono::NaiveDate;
use log::info;
use reqwest::blocking::Client;

use crate::config::{NotifyMode, Settings};
use crate::diff::VenueSlots;
use crate::error::NotifyError;
use crate::time::format_date;

pub const PUSHOVER_API_URL: &str = "https://api.pushover.net/1/messages.json";
pub const TITLE: &str = "Tennis Courts Available";

const EMOJI_PIN: &str = "📍";
const BULLET: &str = "•";

pub trait Notifier {
    fn send(&self, title: &str, message: &str) -> Result<(), NotifyError>;
}

pub struct PushoverNotifier {
    client: Client,
    api_url: String,
    user: String,
    token: String,
}

impl PushoverNotifier {
    pub fn new(settings: &Settings, user: String, token: String) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(&settings.user_agent)
            .timeout(Duration::from_secs(settings.http_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_url: PUSHOVER_API_URL.to_string(),
            user,
            token,
        })
    }
}

impl Notifier for PushoverNotifier {
    fn send(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        let res = self
            .client
            .post(&self.api_url)
            .form(&[
                ("token", self.token.as_str()),
                ("user", self.user.as_str()),
                ("title", title),
                ("message", message),
            ])
            .send()?;

        let status = res.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body: res.text().unwrap_or_default(),
            });
        }

        info!("Pushover notification sent");
        Ok(())
    }
}

fn headline(mode: NotifyMode) -> &'static str {
    match mode {
        NotifyMode::OnNew => "New courts available",
        NotifyMode::Always => "Courts available",
    }
}

/// Message body grouping slots by venue. `None` if there is nothing to say.
pub fn render_message(mode: NotifyMode, date: NaiveDate, venues: &[VenueSlots]) -> Option<String> {
    let venues: Vec<_> = venues.iter().filter(|v| !v.courts.is_empty()).collect();
    if venues.is_empty() {
        return None;
    }

    let mut lines = vec![format!("{} on {}:", headline(mode), format_date(date))];
    for venue in venues {
        lines.push(String::new());
        lines.push(format!("{EMOJI_PIN} {}:", venue.venue));
        lines.extend(venue.courts.iter().map(|court| format!("  {BULLET} {court}")));
    }
    Some(lines.join("\n"))
}
