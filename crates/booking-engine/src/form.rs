//! What the booking form shows: date buttons, time options, subject input.
//!
//! Rendering to HTML is left to the host; this is the data it renders from.

use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::availability::AvailabilityMap;
use crate::config::BookingConfig;
use crate::error::{BookingError, Result};
use crate::model::Subject;
use crate::slot::{hhmm, hhmm_seq};

/// How dates without a free time are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Shown, but disabled.
    #[default]
    Grey,
    /// Left out of the form.
    Hide,
}

impl FromStr for DisplayMode {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grey" | "gray" => Ok(DisplayMode::Grey),
            "hide" => Ok(DisplayMode::Hide),
            other => Err(BookingError::Config(format!(
                "unknown display mode '{other}' (expected grey or hide)"
            ))),
        }
    }
}

/// One date button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateChoice {
    pub date: NaiveDate,
    pub label: String,
    pub day_name: String,
    pub day_number: u32,
    pub month_name: String,
    /// At least one time is free.
    pub available: bool,
    /// Pre-selected: the first available date.
    pub checked: bool,
}

/// One entry of the time drop-down for a given date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeChoice {
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    /// `false` renders as "full".
    pub available: bool,
}

/// Subjects come from a configured list, or from free text when the list is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "subjects", rename_all = "snake_case")]
pub enum SubjectInput {
    Choices(Vec<String>),
    FreeText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormView {
    /// When false the host shows a "nothing available" notice instead of the form.
    pub has_slots: bool,
    pub display_mode: DisplayMode,
    pub dates: Vec<DateChoice>,
    #[serde(with = "hhmm_seq")]
    pub times: Vec<NaiveTime>,
    pub availability: AvailabilityMap,
    pub subject_input: SubjectInput,
}

impl FormView {
    pub fn build(config: &BookingConfig, availability: AvailabilityMap, subjects: &[Subject]) -> Self {
        let mode = config.display_unavailable;
        let mut first_available_seen = false;

        let dates = config
            .dates
            .iter()
            .filter_map(|option| {
                let available = availability.is_date_available(option.date);
                if mode == DisplayMode::Hide && !available {
                    return None;
                }
                let checked = available && !first_available_seen;
                first_available_seen |= available;

                let label = if option.label.is_empty() {
                    option.date.format("%a %-d %b").to_string()
                } else {
                    option.label.clone()
                };
                Some(DateChoice {
                    date: option.date,
                    label,
                    day_name: option.date.format("%a").to_string(),
                    day_number: option.date.day(),
                    month_name: option.date.format("%b").to_string(),
                    available,
                    checked,
                })
            })
            .collect();

        let subject_input = if subjects.is_empty() {
            SubjectInput::FreeText
        } else {
            SubjectInput::Choices(subjects.iter().map(|s| s.name.clone()).collect())
        };

        Self {
            has_slots: availability.has_any_slot(),
            display_mode: mode,
            dates,
            times: config.times.clone(),
            availability,
            subject_input,
        }
    }

    /// The pre-selected date, if any date has a free time.
    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.dates.iter().find(|d| d.checked).map(|d| d.date)
    }

    /// Every offered time for `date`, taken ones flagged unavailable.
    pub fn time_choices(&self, date: NaiveDate) -> Vec<TimeChoice> {
        let free = self.availability.get(date).unwrap_or(&[]);
        self.times
            .iter()
            .map(|time| TimeChoice {
                time: *time,
                available: free.contains(time),
            })
            .collect()
    }
}
