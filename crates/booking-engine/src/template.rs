//! Placeholder substitution for notification subjects and bodies.
//!
//! Not a templating engine: a fixed set of `{name}` tokens is replaced in one
//! left-to-right pass. Unknown tokens stay as written, and substituted values
//! are never scanned again, so a visitor typing `{email}` into a form field
//! cannot pull other values into the message.

use std::collections::HashMap;
use std::fmt::Write;

use chrono::NaiveDate;

use crate::error::{BookingError, Result};
use crate::model::Reservation;
use crate::slot::format_time;

/// The recognized placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    FirstName,
    LastName,
    Date,
    Time,
    Subjects,
    Organization,
    Email,
}

impl Placeholder {
    pub const ALL: [Placeholder; 7] = [
        Placeholder::FirstName,
        Placeholder::LastName,
        Placeholder::Date,
        Placeholder::Time,
        Placeholder::Subjects,
        Placeholder::Organization,
        Placeholder::Email,
    ];

    /// The name between the braces.
    pub fn name(self) -> &'static str {
        match self {
            Placeholder::FirstName => "first_name",
            Placeholder::LastName => "last_name",
            Placeholder::Date => "date",
            Placeholder::Time => "time",
            Placeholder::Subjects => "subjects",
            Placeholder::Organization => "organization",
            Placeholder::Email => "email",
        }
    }

    pub fn token(self) -> String {
        format!("{{{}}}", self.name())
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// Values for one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateValues {
    values: HashMap<Placeholder, String>,
}

impl TemplateValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, placeholder: Placeholder, value: impl Into<String>) -> Self {
        self.values.insert(placeholder, value.into());
        self
    }

    pub fn get(&self, placeholder: Placeholder) -> Option<&str> {
        self.values.get(&placeholder).map(String::as_str)
    }

    /// Every placeholder filled from a reservation; `{date}` uses `date_format`.
    pub fn for_reservation(reservation: &Reservation, date_format: &str) -> Result<Self> {
        let requester = &reservation.requester;
        Ok(Self::new()
            .with(Placeholder::FirstName, &requester.first_name)
            .with(Placeholder::LastName, &requester.last_name)
            .with(Placeholder::Date, format_date(reservation.slot.date, date_format)?)
            .with(Placeholder::Time, format_time(reservation.slot.time))
            .with(Placeholder::Subjects, reservation.subjects_joined())
            .with(Placeholder::Organization, &requester.organization)
            .with(Placeholder::Email, &requester.email))
    }
}

/// Format a date with a strftime pattern, reporting a bad pattern as an error.
pub fn format_date(date: NaiveDate, pattern: &str) -> Result<String> {
    let mut out = String::new();
    write!(out, "{}", date.format(pattern))
        .map_err(|_| BookingError::Config(format!("invalid date_format {pattern:?}")))?;
    Ok(out)
}

/// Replace every known `{name}` in `template` with its value.
pub fn render(template: &str, values: &TemplateValues) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            rest = &rest[open..];
            break;
        };
        let value = Placeholder::from_name(&after[..close]).and_then(|p| values.get(p));
        match value {
            Some(value) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
