//! The booking service: configuration plus the store and mail collaborators.
//!
//! Built once at start-up and handed to request handlers by reference.

use chrono::Utc;
use uuid::Uuid;

use crate::admin::AdminPanel;
use crate::availability::{compute_availability_map, AvailabilityMap, Occupancy};
use crate::booking::{BookingRequest, Confirmation};
use crate::config::BookingConfig;
use crate::error::{BookingError, Result};
use crate::form::FormView;
use crate::ics::CalendarInvite;
use crate::mail::{compose_admin_mail, compose_client_mail, MailKind, Mailer, OutgoingMail};
use crate::model::{NewReservation, Reservation, Subject};
use crate::slot::Slot;
use crate::store::BookingStore;

pub struct BookingService<S, M> {
    config: BookingConfig,
    store: S,
    mailer: M,
}

impl<S: BookingStore, M: Mailer> BookingService<S, M> {
    pub fn new(config: BookingConfig, store: S, mailer: M) -> Self {
        Self {
            config,
            store,
            mailer,
        }
    }

    pub fn config(&self) -> &BookingConfig {
        &self.config
    }

    /// Settings edits from the admin panel go through here.
    pub fn config_mut(&mut self) -> &mut BookingConfig {
        &mut self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn mailer(&self) -> &M {
        &self.mailer
    }

    pub fn into_parts(self) -> (BookingConfig, S, M) {
        (self.config, self.store, self.mailer)
    }

    /// Read the reserved and blocked slots as they are right now.
    pub fn occupancy(&self) -> Result<Occupancy> {
        let reserved = self.store.reserved_slots()?;
        let blocked = self.store.blocked_slots()?;
        Ok(Occupancy::new(reserved, blocked.into_iter().map(|b| b.slot)))
    }

    /// A store failure is returned as an error, never as "available".
    pub fn is_available(&self, slot: &Slot) -> Result<bool> {
        Ok(self.occupancy()?.is_available(slot))
    }

    /// Free times for every offered date, from a fresh read.
    pub fn availability_map(&self) -> Result<AvailabilityMap> {
        let occupancy = self.occupancy()?;
        Ok(compute_availability_map(
            &self.config.date_values(),
            &self.config.times,
            &occupancy,
        ))
    }

    pub fn form_view(&self) -> Result<FormView> {
        let availability = self.availability_map()?;
        let subjects = self.admin().subjects()?;
        Ok(FormView::build(&self.config, availability, &subjects))
    }

    pub fn admin(&self) -> AdminPanel<'_, S> {
        AdminPanel::new(&self.config, &self.store)
    }

    /// Validate, check the slot, store the reservation, then notify.
    ///
    /// The availability check only rejects early; a concurrent submission for
    /// the same slot is rejected by the store's insert. Notification failures
    /// are logged and listed in the confirmation without undoing the booking.
    pub fn submit(&self, request: &BookingRequest) -> Result<Confirmation> {
        let subjects: Vec<Subject> = self.store.subjects()?;
        let booking = request
            .validate(&self.config, &subjects)
            .inspect_err(|e| tracing::warn!(error = %e, "booking request rejected"))?;

        let slot = booking.slot;
        if !self.is_available(&slot)? {
            tracing::warn!(%slot, "slot no longer available");
            return Err(BookingError::SlotUnavailable(slot));
        }

        let reservation = self
            .store
            .insert_reservation(NewReservation {
                slot,
                requester: booking.requester,
                subjects: booking.subjects,
                created_at: Utc::now(),
            })
            .inspect_err(|e| tracing::warn!(%slot, error = %e, "reservation insert rejected"))?;

        tracing::info!(id = reservation.id, slot = %reservation.slot, "reservation saved");

        let undelivered = self.notify(&reservation);
        Ok(Confirmation {
            reservation,
            undelivered,
        })
    }

    /// Send both notifications; return the kinds that did not go out.
    fn notify(&self, reservation: &Reservation) -> Vec<MailKind> {
        let client = self.client_mail(reservation);
        let admin = compose_admin_mail(reservation, &self.config);

        let mut undelivered = Vec::new();
        for (kind, mail) in [(MailKind::Client, client), (MailKind::Admin, admin)] {
            let sent = mail.and_then(|mail| self.mailer.send(&mail));
            if let Err(e) = sent {
                tracing::warn!(id = reservation.id, ?kind, error = %e, "notification not sent");
                undelivered.push(kind);
            }
        }
        undelivered
    }

    fn client_mail(&self, reservation: &Reservation) -> Result<OutgoingMail> {
        let uid = format!("{}@booking-engine", Uuid::new_v4());
        let invite = CalendarInvite::for_reservation(reservation, &self.config, uid, Utc::now())?;
        let boundary = Uuid::new_v4().simple().to_string();
        compose_client_mail(reservation, &self.config, &invite, &boundary)
    }
}
