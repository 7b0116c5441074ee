//! iCalendar (RFC 5545) output for confirmation emails.
//!
//! [`escape_ics_text`] makes free text safe for `TEXT` property values
//! (Section 3.3.11). [`CalendarInvite`] renders the single-event `VCALENDAR`
//! attached to the visitor's confirmation mail.

use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;

use crate::config::BookingConfig;
use crate::error::{BookingError, Result};
use crate::model::Reservation;
use crate::slot::Slot;

/// Content lines are folded past this many octets, CRLF excluded.
const MAX_LINE_OCTETS: usize = 75;

/// Escape text for an iCalendar `TEXT` value.
///
/// Backslash, comma, semicolon and newline become `\\`, `\,`, `\;` and the two
/// characters `\n`. The walk is a single pass, so backslashes introduced for
/// the other three are never escaped again. Every other character, including
/// a bare `\r`, is left untouched; line folding and charset are the caller's
/// concern.
pub fn escape_ics_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ',' => out.push_str("\\,"),
            ';' => out.push_str("\\;"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

/// Resolve a slot's wall-clock time in `tz` to an instant.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant; times that
/// do not exist (DST spring-forward gap) are an error.
pub fn slot_start_utc(slot: &Slot, tz: Tz) -> Result<DateTime<Utc>> {
    tz.from_local_datetime(&slot.date.and_time(slot.time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or(BookingError::NonexistentLocalTime(*slot))
}

/// A single-event calendar invite.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarInvite {
    pub product_id: String,
    pub uid: String,
    pub dtstamp: DateTime<Utc>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Unescaped text; escaped when rendered.
    pub summary: String,
    pub description: String,
    pub location: String,
}

impl CalendarInvite {
    /// Build the invite sent to the visitor who booked `reservation`.
    pub fn for_reservation(
        reservation: &Reservation,
        config: &BookingConfig,
        uid: impl Into<String>,
        dtstamp: DateTime<Utc>,
    ) -> Result<Self> {
        let start = slot_start_utc(&reservation.slot, config.tz()?)?;
        let end = start + Duration::minutes(i64::from(config.duration_minutes));
        let who = reservation.requester.full_name();

        let description = format!(
            "Appointment with {who}\nOrganization: {}\nEmail: {}\nSubjects: {}",
            reservation.requester.organization,
            reservation.requester.email,
            reservation.subjects_joined(),
        );

        Ok(Self {
            product_id: config.product_id.clone(),
            uid: uid.into(),
            dtstamp,
            start,
            end,
            summary: format!("Appointment with {who}"),
            description,
            location: config.location.clone(),
        })
    }

    /// Render the `VCALENDAR` document with CRLF line endings and folded lines.
    pub fn to_ics(&self) -> String {
        let lines = [
            "BEGIN:VCALENDAR".to_string(),
            "VERSION:2.0".to_string(),
            format!("PRODID:{}", self.product_id),
            "METHOD:REQUEST".to_string(),
            "BEGIN:VEVENT".to_string(),
            format!("UID:{}", self.uid),
            format!("DTSTAMP:{}", format_utc(self.dtstamp)),
            format!("DTSTART:{}", format_utc(self.start)),
            format!("DTEND:{}", format_utc(self.end)),
            format!("SUMMARY:{}", escape_ics_text(&self.summary)),
            format!("DESCRIPTION:{}", escape_ics_text(&self.description)),
            format!("LOCATION:{}", escape_ics_text(&self.location)),
            "END:VEVENT".to_string(),
            "END:VCALENDAR".to_string(),
        ];

        let mut out = String::new();
        for line in &lines {
            fold_line(line, &mut out);
        }
        out
    }
}

fn format_utc(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Append `line` to `out`, folding on character boundaries so no physical
/// line exceeds [`MAX_LINE_OCTETS`]. Continuation lines start with one space,
/// which counts toward the limit.
fn fold_line(line: &str, out: &mut String) {
    let mut width = 0;
    for c in line.chars() {
        let len = c.len_utf8();
        if width + len > MAX_LINE_OCTETS {
            out.push_str("\r\n ");
            width = 1;
        }
        out.push(c);
        width += len;
    }
    out.push_str("\r\n");
}
