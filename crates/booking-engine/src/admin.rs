//! Administrator operations: reservations, blocked slots, subjects, CSV export.

use std::borrow::Cow;

use crate::config::BookingConfig;
use crate::error::{BookingError, Result};
use crate::model::{single_line, BlockedSlot, Reservation, Subject};
use crate::slot::{format_time, Slot};
use crate::store::BookingStore;

const CSV_HEADER: [&str; 8] = [
    "reservation_date",
    "reservation_time",
    "last_name",
    "first_name",
    "organization",
    "email",
    "subjects",
    "created_at",
];

/// Byte-order mark so spreadsheet tools detect UTF-8.
const UTF8_BOM: char = '\u{feff}';

/// Admin view over a store, bound to the current configuration.
pub struct AdminPanel<'a, S> {
    config: &'a BookingConfig,
    store: &'a S,
}

impl<'a, S: BookingStore> AdminPanel<'a, S> {
    pub fn new(config: &'a BookingConfig, store: &'a S) -> Self {
        Self { config, store }
    }

    /// All reservations, latest slot first.
    pub fn reservations(&self) -> Result<Vec<Reservation>> {
        let mut reservations = self.store.reservations()?;
        reservations.sort_by(|a, b| b.slot.cmp(&a.slot));
        Ok(reservations)
    }

    pub fn total(&self) -> Result<usize> {
        Ok(self.store.reservations()?.len())
    }

    pub fn delete_reservation(&self, id: u64) -> Result<()> {
        if !self.store.delete_reservation(id)? {
            return Err(BookingError::NotFound {
                kind: "reservation",
                id,
            });
        }
        tracing::info!(id, "reservation deleted");
        Ok(())
    }

    /// Blocked slots in calendar order.
    pub fn blocked_slots(&self) -> Result<Vec<BlockedSlot>> {
        let mut blocked = self.store.blocked_slots()?;
        blocked.sort_by_key(|b| b.slot);
        Ok(blocked)
    }

    /// Block a slot. The time must be an offered time; any date is accepted.
    pub fn block_slot(&self, slot: Slot) -> Result<BlockedSlot> {
        if !self.config.times.contains(&slot.time) {
            return Err(BookingError::SlotNotOffered(slot));
        }
        let blocked = self.store.insert_blocked_slot(slot)?;
        tracing::info!(id = blocked.id, %slot, "slot blocked");
        Ok(blocked)
    }

    pub fn unblock_slot(&self, id: u64) -> Result<()> {
        if !self.store.delete_blocked_slot(id)? {
            return Err(BookingError::NotFound {
                kind: "blocked slot",
                id,
            });
        }
        tracing::info!(id, "slot unblocked");
        Ok(())
    }

    /// Subjects sorted by name.
    pub fn subjects(&self) -> Result<Vec<Subject>> {
        let mut subjects = self.store.subjects()?;
        subjects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(subjects)
    }

    pub fn add_subject(&self, name: &str) -> Result<Subject> {
        let name = single_line(name);
        if name.is_empty() {
            return Err(BookingError::MissingField("subject"));
        }
        let subject = self.store.insert_subject(&name)?;
        tracing::info!(id = subject.id, name = %subject.name, "subject added");
        Ok(subject)
    }

    pub fn delete_subject(&self, id: u64) -> Result<()> {
        if !self.store.delete_subject(id)? {
            return Err(BookingError::NotFound { kind: "subject", id });
        }
        tracing::info!(id, "subject deleted");
        Ok(())
    }

    /// Every reservation as CSV, earliest slot first.
    pub fn export_csv(&self) -> Result<String> {
        let mut reservations = self.store.reservations()?;
        if reservations.is_empty() {
            return Err(BookingError::NothingToExport);
        }
        reservations.sort_by_key(|r| r.slot);

        let mut out = String::new();
        out.push(UTF8_BOM);
        push_csv_row(&mut out, CSV_HEADER.iter().map(|h| Cow::Borrowed(*h)));
        for r in &reservations {
            let row = [
                r.slot.date.format("%Y-%m-%d").to_string(),
                format_time(r.slot.time),
                r.requester.last_name.clone(),
                r.requester.first_name.clone(),
                r.requester.organization.clone(),
                r.requester.email.clone(),
                r.subjects_joined(),
                r.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ];
            push_csv_row(&mut out, row.into_iter().map(Cow::Owned));
        }
        Ok(out)
    }
}

fn push_csv_row<'f>(out: &mut String, fields: impl Iterator<Item = Cow<'f, str>>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&csv_field(&field));
    }
    out.push_str("\r\n");
}

/// Quote a field when it holds a delimiter, quote or line break.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::csv_field;

    #[test]
    fn plain_fields_are_not_quoted() {
        assert_eq!(csv_field("Jane"), "Jane");
    }

    #[test]
    fn delimiters_and_quotes_are_quoted() {
        assert_eq!(csv_field("a, b"), "\"a, b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }
}
