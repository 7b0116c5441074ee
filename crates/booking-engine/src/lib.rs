//! # booking-engine
//!
//! Appointment booking over a fixed offer of dates and times.
//!
//! Visitors pick a free `(date, time)` slot, leave their contact details and
//! receive a confirmation mail carrying an iCalendar invite. Administrators
//! block slots, curate visit subjects, manage reservations and edit the
//! notification templates. Persistence and mail delivery are collaborators
//! behind the [`store::BookingStore`] and [`mail::Mailer`] traits.
//!
//! ## Modules
//!
//! - [`availability`] — free times per date from reserved and blocked slots
//! - [`ics`] — RFC 5545 text escaping and the calendar invite
//! - [`template`] — `{placeholder}` substitution for notifications
//! - [`mail`] — client and admin notification messages
//! - [`booking`] — visitor submission validation
//! - [`form`] — data shown by the booking form
//! - [`admin`] — administrator operations and CSV export
//! - [`store`] — persistence interface and in-memory store
//! - [`config`] — typed TOML configuration
//! - [`service`] — the service struct tying it together
//! - [`error`] — Error types
//!
//! ## Example
//!
//! ```
//! use booking_engine::{compute_availability_map, Occupancy, Slot};
//! use booking_engine::slot::{parse_date, parse_time};
//!
//! let dates = [parse_date("2025-11-18").unwrap(), parse_date("2025-11-19").unwrap()];
//! let times = [parse_time("09:00").unwrap(), parse_time("10:00").unwrap()];
//! let taken = Occupancy::new([Slot::parse("2025-11-18", "09:00").unwrap()], []);
//!
//! let map = compute_availability_map(&dates, &times, &taken);
//! assert_eq!(
//!     serde_json::to_string(&map).unwrap(),
//!     r#"{"2025-11-18":["10:00"],"2025-11-19":["09:00","10:00"]}"#
//! );
//! ```

pub mod admin;
pub mod availability;
pub mod booking;
pub mod config;
pub mod error;
pub mod form;
pub mod ics;
pub mod mail;
pub mod model;
pub mod service;
pub mod slot;
pub mod store;
pub mod template;

pub use admin::AdminPanel;
pub use availability::{compute_availability_map, is_available, AvailabilityMap, Occupancy, SlotStatus};
pub use booking::{BookingRequest, Confirmation};
pub use config::{BookingConfig, MailSettings, MailSettingsUpdate};
pub use error::BookingError;
pub use form::{DisplayMode, FormView};
pub use ics::{escape_ics_text, CalendarInvite};
pub use mail::{Mailer, MemoryOutbox, OutgoingMail};
pub use model::{BlockedSlot, Requester, Reservation, Subject};
pub use service::BookingService;
pub use slot::Slot;
pub use store::{BookingStore, MemoryStore, StoreState};
