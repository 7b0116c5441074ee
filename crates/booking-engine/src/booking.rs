//! Visitor submissions: raw form fields in, a validated booking out.

use serde::{Deserialize, Serialize};

use crate::config::BookingConfig;
use crate::error::{BookingError, Result};
use crate::mail::MailKind;
use crate::model::{is_valid_email, single_line, Requester, Reservation, Subject};
use crate::slot::Slot;

/// The booking form as submitted. Nothing here has been checked yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BookingRequest {
    pub date: String,
    pub time: String,
    pub first_name: String,
    pub last_name: String,
    pub organization: String,
    pub email: String,
    /// Ticked subjects.
    #[serde(default)]
    pub subjects: Vec<String>,
    /// Used only when no subject is ticked.
    #[serde(default)]
    pub free_subject: Option<String>,
}

/// A request that passed validation against the current offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBooking {
    pub slot: Slot,
    pub requester: Requester,
    pub subjects: Vec<String>,
}

impl BookingRequest {
    /// Check required fields, the address, the slot and the subjects.
    ///
    /// Fields are flattened to a single line first (tags and line breaks
    /// removed, whitespace collapsed). Required-field and address errors are
    /// reported before the slot is looked at. When `offered_subjects` is not
    /// empty, every chosen subject must be one of them.
    pub fn validate(
        &self,
        config: &BookingConfig,
        offered_subjects: &[Subject],
    ) -> Result<ValidatedBooking> {
        let date = required("date", &self.date)?;
        let time = required("time", &self.time)?;
        let first_name = required("first_name", &self.first_name)?;
        let last_name = required("last_name", &self.last_name)?;
        let organization = required("organization", &self.organization)?;
        let email = required("email", &self.email)?;
        let subjects = self.chosen_subjects();
        if subjects.is_empty() {
            return Err(BookingError::MissingField("subjects"));
        }
        if !is_valid_email(&email) {
            return Err(BookingError::InvalidEmail(email));
        }

        let slot = Slot::parse(&date, &time)?;
        if !config.offers(&slot) {
            return Err(BookingError::SlotNotOffered(slot));
        }

        if !offered_subjects.is_empty() {
            if let Some(unknown) = subjects
                .iter()
                .find(|s| !offered_subjects.iter().any(|o| &o.name == *s))
            {
                return Err(BookingError::UnknownSubject(unknown.clone()));
            }
        }

        Ok(ValidatedBooking {
            slot,
            requester: Requester {
                first_name,
                last_name,
                organization,
                email,
            },
            subjects,
        })
    }

    /// Ticked subjects, flattened, blanks and repeats dropped; else the free text.
    fn chosen_subjects(&self) -> Vec<String> {
        let mut chosen: Vec<String> = Vec::new();
        for s in self.subjects.iter().map(|s| single_line(s)) {
            if !s.is_empty() && !chosen.contains(&s) {
                chosen.push(s);
            }
        }
        if chosen.is_empty() {
            if let Some(free) = self.free_subject.as_deref().map(single_line) {
                if !free.is_empty() {
                    chosen.push(free);
                }
            }
        }
        chosen
    }
}

fn required(field: &'static str, value: &str) -> Result<String> {
    let cleaned = single_line(value);
    if cleaned.is_empty() {
        Err(BookingError::MissingField(field))
    } else {
        Ok(cleaned)
    }
}

/// Outcome of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Confirmation {
    pub reservation: Reservation,
    /// Notifications that could not be composed or sent. The reservation stands regardless.
    pub undelivered: Vec<MailKind>,
}

impl Confirmation {
    /// The notice shown to the visitor.
    pub fn message(&self) -> String {
        format!(
            "Thank you {}! Your appointment is confirmed.",
            self.reservation.requester.full_name()
        )
    }
}
