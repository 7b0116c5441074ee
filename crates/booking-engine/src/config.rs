//! Typed booking configuration, loaded from TOML.
//!
//! Every setting is a named field with a documented default; nothing is
//! looked up by string key at call sites. A missing file section or field
//! falls back to [`BookingConfig::default`].
//!
//! ```toml
//! timezone = "Europe/Paris"
//! duration_minutes = 60
//! display_unavailable = "hide"
//! times = ["09:00", "10:00", "14:00"]
//!
//! [[dates]]
//! date = "2025-11-18"
//! label = "Tue 18 Nov"
//!
//! [mail]
//! from_name = "Front desk"
//! admin_email = "desk@example.com"
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};
use crate::form::DisplayMode;
use crate::ics::slot_start_utc;
use crate::mail::Mailbox;
use crate::model::{is_valid_email, single_line};
use crate::slot::{hhmm_seq, Slot};

const DEFAULT_CLIENT_MESSAGE: &str = "Hello {first_name} {last_name},\n\n\
Your appointment is confirmed for {date} at {time}.\n\n\
Subject(s): {subjects}\n\n\
Best regards,\nThe team";

const DEFAULT_ADMIN_MESSAGE: &str = "New booking:\n\
Name: {first_name} {last_name}\n\
Organization: {organization}\n\
Email: {email}\n\
Date: {date}\n\
Time: {time}\n\
Subject(s): {subjects}";

/// Main configuration structure.
///
/// Scalar fields come first so the struct serializes back to valid TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    /// IANA zone the offered wall-clock times live in.
    pub timezone: String,
    /// Length of one appointment, used for the invite's `DTEND`.
    pub duration_minutes: u32,
    pub location: String,
    /// `PRODID` of generated calendar invites.
    pub product_id: String,
    /// strftime pattern for `{date}` in notification templates.
    pub date_format: String,
    pub display_unavailable: DisplayMode,
    /// Fallback for the sender and admin recipient addresses.
    pub site_admin_email: String,
    /// Offered times, in display order.
    #[serde(with = "hhmm_seq")]
    pub times: Vec<NaiveTime>,
    /// Offered dates, in display order.
    pub dates: Vec<DateOption>,
    pub mail: MailSettings,
}

/// One offered date and the label shown for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateOption {
    pub date: NaiveDate,
    #[serde(default)]
    pub label: String,
}

/// Notification settings editable from the admin panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailSettings {
    pub from_name: String,
    /// Unset means `site_admin_email`.
    pub from_email: Option<String>,
    /// Unset means `site_admin_email`.
    pub admin_email: Option<String>,
    pub client_subject: String,
    pub client_message: String,
    pub admin_subject: String,
    pub admin_message: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            from_name: "The team".to_string(),
            from_email: None,
            admin_email: None,
            client_subject: "Your appointment is confirmed".to_string(),
            client_message: DEFAULT_CLIENT_MESSAGE.to_string(),
            admin_subject: "New booking: {date} at {time}".to_string(),
            admin_message: DEFAULT_ADMIN_MESSAGE.to_string(),
        }
    }
}

/// A partial edit of [`MailSettings`]. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailSettingsUpdate {
    pub from_name: Option<String>,
    /// An empty string clears the override.
    pub from_email: Option<String>,
    /// An empty string clears the override.
    pub admin_email: Option<String>,
    pub client_subject: Option<String>,
    pub client_message: Option<String>,
    pub admin_subject: Option<String>,
    pub admin_message: Option<String>,
}

impl MailSettings {
    /// Apply an edit. Values are trimmed and addresses validated before
    /// anything is written, so a rejected edit leaves the settings untouched.
    /// The sender name and both subjects end up in mail headers and are
    /// flattened to a single line.
    pub fn apply(&mut self, update: MailSettingsUpdate) -> Result<()> {
        let from_email = update.from_email.as_deref().map(optional_email).transpose()?;
        let admin_email = update.admin_email.as_deref().map(optional_email).transpose()?;

        if let Some(v) = update.from_name {
            self.from_name = single_line(&v);
        }
        if let Some(v) = from_email {
            self.from_email = v;
        }
        if let Some(v) = admin_email {
            self.admin_email = v;
        }
        if let Some(v) = update.client_subject {
            self.client_subject = single_line(&v);
        }
        if let Some(v) = update.client_message {
            self.client_message = v.trim().to_string();
        }
        if let Some(v) = update.admin_subject {
            self.admin_subject = single_line(&v);
        }
        if let Some(v) = update.admin_message {
            self.admin_message = v.trim().to_string();
        }
        Ok(())
    }
}

fn optional_email(raw: &str) -> Result<Option<String>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else if is_valid_email(trimmed) {
        Ok(Some(trimmed.to_string()))
    } else {
        Err(BookingError::InvalidEmail(trimmed.to_string()))
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        let dates = [
            (18, "Tue 18 Nov"),
            (19, "Wed 19 Nov"),
            (20, "Thu 20 Nov"),
            (21, "Fri 21 Nov"),
        ]
        .into_iter()
        .filter_map(|(d, label)| {
            NaiveDate::from_ymd_opt(2025, 11, d).map(|date| DateOption {
                date,
                label: label.to_string(),
            })
        })
        .collect();
        let times = [(9, 0), (10, 0), (11, 0), (14, 0), (15, 0), (16, 0)]
            .into_iter()
            .filter_map(|(h, m)| NaiveTime::from_hms_opt(h, m, 0))
            .collect();

        Self {
            timezone: "Europe/Paris".to_string(),
            duration_minutes: 60,
            location: "Our meeting point".to_string(),
            product_id: "-//booking-engine//Reservation//EN".to_string(),
            date_format: "%A %-d %B %Y".to_string(),
            display_unavailable: DisplayMode::default(),
            site_admin_email: "admin@example.com".to_string(),
            times,
            dates,
            mail: MailSettings::default(),
        }
    }
}

impl FromStr for BookingConfig {
    type Err = BookingError;

    /// Parse and validate configuration from a TOML string.
    fn from_str(content: &str) -> Result<Self> {
        let config: BookingConfig =
            toml::from_str(content).map_err(|e| BookingError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

impl BookingConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| BookingError::Config(format!("{}: {e}", path.display())))?;
        let config: Self = content.parse()?;
        tracing::info!(path = %path.display(), "loaded booking config");
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| BookingError::Config(e.to_string()))
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.dates.is_empty() {
            return Err(BookingError::Config("at least one date must be offered".into()));
        }
        if self.times.is_empty() {
            return Err(BookingError::Config("at least one time must be offered".into()));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = self.dates.iter().find(|d| !seen.insert(d.date)) {
            return Err(BookingError::Config(format!("duplicate date {}", dup.date)));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.times.iter().find(|t| !seen.insert(**t)) {
            return Err(BookingError::Config(format!(
                "duplicate time {}",
                dup.format("%H:%M")
            )));
        }

        let tz = self.tz()?;
        for option in &self.dates {
            for time in &self.times {
                let slot = Slot::new(option.date, *time);
                slot_start_utc(&slot, tz).map_err(|_| {
                    BookingError::Config(format!(
                        "offered slot {slot} does not exist in {}",
                        self.timezone
                    ))
                })?;
            }
        }

        if self.duration_minutes == 0 {
            return Err(BookingError::Config("duration_minutes must be positive".into()));
        }
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(BookingError::Config(format!(
                "invalid date_format {:?}",
                self.date_format
            )));
        }

        let header_fields = [
            ("mail.from_name", &self.mail.from_name),
            ("mail.client_subject", &self.mail.client_subject),
            ("mail.admin_subject", &self.mail.admin_subject),
        ];
        for (field, value) in header_fields {
            if value.chars().any(char::is_control) {
                return Err(BookingError::Config(format!(
                    "{field} must be a single line"
                )));
            }
        }

        let addresses = std::iter::once(self.site_admin_email.as_str())
            .chain(self.mail.from_email.as_deref())
            .chain(self.mail.admin_email.as_deref());
        for address in addresses {
            if !is_valid_email(address) {
                return Err(BookingError::InvalidEmail(address.to_string()));
            }
        }
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|_| BookingError::InvalidTimezone(self.timezone.clone()))
    }

    pub fn date_values(&self) -> Vec<NaiveDate> {
        self.dates.iter().map(|d| d.date).collect()
    }

    pub fn date_label(&self, date: NaiveDate) -> Option<&str> {
        self.dates
            .iter()
            .find(|d| d.date == date)
            .map(|d| d.label.as_str())
    }

    /// Whether `slot` is one of the offered date/time combinations.
    pub fn offers(&self, slot: &Slot) -> bool {
        self.dates.iter().any(|d| d.date == slot.date) && self.times.contains(&slot.time)
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        self.display_unavailable = mode;
    }

    pub fn sender(&self) -> Mailbox {
        Mailbox {
            name: self.mail.from_name.clone(),
            address: self
                .mail
                .from_email
                .clone()
                .unwrap_or_else(|| self.site_admin_email.clone()),
        }
    }

    pub fn admin_recipient(&self) -> &str {
        self.mail
            .admin_email
            .as_deref()
            .unwrap_or(&self.site_admin_email)
    }
}
