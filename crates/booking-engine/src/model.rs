//! Persisted records: reservations, blocked slots and visit subjects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::slot::Slot;

/// Who asked for the appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub first_name: String,
    pub last_name: String,
    pub organization: String,
    pub email: String,
}

impl Requester {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A reservation that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    pub slot: Slot,
    pub requester: Requester,
    pub subjects: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A confirmed booking. At most one exists per [`Slot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: u64,
    pub slot: Slot,
    pub requester: Requester,
    pub subjects: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn from_new(id: u64, new: NewReservation) -> Self {
        Self {
            id,
            slot: new.slot,
            requester: new.requester,
            subjects: new.subjects,
            created_at: new.created_at,
        }
    }

    pub fn subjects_joined(&self) -> String {
        self.subjects.join(", ")
    }
}

/// An administrator-imposed exclusion of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedSlot {
    pub id: u64,
    pub slot: Slot,
}

/// A visit reason offered to visitors as a multi-select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: u64,
    pub name: String,
}

/// Syntactic address check: `local@domain.tld`, no whitespace, one `@`.
pub fn is_valid_email(address: &str) -> bool {
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || address.chars().any(char::is_whitespace) {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels
            .iter()
            .all(|l| !l.is_empty() && !l.starts_with('-') && !l.ends_with('-'))
}

/// Flatten free text to a single line: markup tags are dropped, control
/// characters and whitespace runs become one space, the ends are trimmed.
pub fn single_line(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        let opens_tag = chars
            .peek()
            .is_some_and(|n| n.is_ascii_alphabetic() || matches!(*n, '/' | '!'));
        if c == '<' && opens_tag {
            for t in chars.by_ref() {
                if t == '>' {
                    break;
                }
            }
            out.push(' ');
        } else if c.is_whitespace() || c.is_control() {
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::{is_valid_email, single_line};

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("jane.doe@example.com"));
        assert!(is_valid_email("ops+booking@mail.example.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in ["", "jane", "@example.com", "jane@", "jane@localhost", "ja ne@example.com", "a@b@c.com", "jane@example..com"] {
            assert!(!is_valid_email(bad), "{bad} should be rejected");
        }
    }

    #[test]
    fn single_line_flattens_breaks_and_tags() {
        assert_eq!(single_line("  Jane\r\nBcc: x@y.org "), "Jane Bcc: x@y.org");
        assert_eq!(single_line("a\rb\tc\u{0}d"), "a b c d");
        assert_eq!(single_line("<b>Acme</b>  Corp"), "Acme Corp");
        assert_eq!(single_line("1 < 2"), "1 < 2");
        assert_eq!(single_line("\r\n"), "");
    }
}
