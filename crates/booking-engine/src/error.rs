//! Error types for booking-engine operations.

use thiserror::Error;

use crate::slot::Slot;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// The persistence collaborator could not answer. Never read as "available".
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Slot {0} is not offered")]
    SlotNotOffered(Slot),

    #[error("Slot {0} is no longer available")]
    SlotUnavailable(Slot),

    #[error("Slot {0} is already blocked")]
    AlreadyBlocked(Slot),

    #[error("Unknown subject: {0}")]
    UnknownSubject(String),

    #[error("Subject already exists: {0}")]
    DuplicateSubject(String),

    #[error("No {kind} with id {id}")]
    NotFound { kind: &'static str, id: u64 },

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// The slot's wall-clock time falls in a DST gap of the configured zone.
    #[error("Slot {0} does not exist in the configured timezone")]
    NonexistentLocalTime(Slot),

    #[error("No reservations to export")]
    NothingToExport,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Mail error: {0}")]
    Mail(String),
}

pub type Result<T> = std::result::Result<T, BookingError>;
