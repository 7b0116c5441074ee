//! Persistence interface and an in-memory implementation.
//!
//! Uniqueness (one reservation per slot, one block per slot, unique subject
//! names) is the store's job, checked and written atomically. Callers may
//! check availability first, but a check followed by an insert can race with
//! another submission; only the insert's rejection is authoritative.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};
use crate::model::{BlockedSlot, NewReservation, Reservation, Subject};
use crate::slot::Slot;

/// Read and write access to bookings, blocks and subjects.
pub trait BookingStore {
    fn reserved_slots(&self) -> Result<Vec<Slot>>;

    fn blocked_slots(&self) -> Result<Vec<BlockedSlot>>;

    fn reservations(&self) -> Result<Vec<Reservation>>;

    /// Fails with [`BookingError::SlotUnavailable`] when the slot is already reserved.
    fn insert_reservation(&self, new: NewReservation) -> Result<Reservation>;

    /// Returns `false` when no reservation has this id.
    fn delete_reservation(&self, id: u64) -> Result<bool>;

    /// Fails with [`BookingError::AlreadyBlocked`] when the slot is already blocked.
    fn insert_blocked_slot(&self, slot: Slot) -> Result<BlockedSlot>;

    fn delete_blocked_slot(&self, id: u64) -> Result<bool>;

    fn subjects(&self) -> Result<Vec<Subject>>;

    /// Fails with [`BookingError::DuplicateSubject`] when the name exists.
    fn insert_subject(&self, name: &str) -> Result<Subject>;

    fn delete_subject(&self, id: u64) -> Result<bool>;
}

impl<S: BookingStore + ?Sized> BookingStore for &S {
    fn reserved_slots(&self) -> Result<Vec<Slot>> {
        (**self).reserved_slots()
    }
    fn blocked_slots(&self) -> Result<Vec<BlockedSlot>> {
        (**self).blocked_slots()
    }
    fn reservations(&self) -> Result<Vec<Reservation>> {
        (**self).reservations()
    }
    fn insert_reservation(&self, new: NewReservation) -> Result<Reservation> {
        (**self).insert_reservation(new)
    }
    fn delete_reservation(&self, id: u64) -> Result<bool> {
        (**self).delete_reservation(id)
    }
    fn insert_blocked_slot(&self, slot: Slot) -> Result<BlockedSlot> {
        (**self).insert_blocked_slot(slot)
    }
    fn delete_blocked_slot(&self, id: u64) -> Result<bool> {
        (**self).delete_blocked_slot(id)
    }
    fn subjects(&self) -> Result<Vec<Subject>> {
        (**self).subjects()
    }
    fn insert_subject(&self, name: &str) -> Result<Subject> {
        (**self).insert_subject(name)
    }
    fn delete_subject(&self, id: u64) -> Result<bool> {
        (**self).delete_subject(id)
    }
}

/// Serializable contents of a [`MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreState {
    pub last_reservation_id: u64,
    pub last_blocked_id: u64,
    pub last_subject_id: u64,
    pub reservations: Vec<Reservation>,
    pub blocked_slots: Vec<BlockedSlot>,
    pub subjects: Vec<Subject>,
}

impl StoreState {
    /// Reject snapshots that break a uniqueness rule.
    fn check(&self) -> Result<()> {
        let mut slots = HashSet::new();
        for r in &self.reservations {
            if !slots.insert(r.slot) {
                return Err(BookingError::Storage(format!(
                    "duplicate reservation for slot {}",
                    r.slot
                )));
            }
        }
        let mut slots = HashSet::new();
        for b in &self.blocked_slots {
            if !slots.insert(b.slot) {
                return Err(BookingError::Storage(format!(
                    "duplicate block for slot {}",
                    b.slot
                )));
            }
        }
        let mut names = HashSet::new();
        for s in &self.subjects {
            if !names.insert(s.name.as_str()) {
                return Err(BookingError::Storage(format!(
                    "duplicate subject {:?}",
                    s.name
                )));
            }
        }
        Ok(())
    }

    /// Keep id counters ahead of every stored id.
    fn repair_counters(&mut self) {
        let reservation_max = self.reservations.iter().map(|r| r.id).max().unwrap_or(0);
        let blocked_max = self.blocked_slots.iter().map(|b| b.id).max().unwrap_or(0);
        let subject_max = self.subjects.iter().map(|s| s.id).max().unwrap_or(0);
        self.last_reservation_id = self.last_reservation_id.max(reservation_max);
        self.last_blocked_id = self.last_blocked_id.max(blocked_max);
        self.last_subject_id = self.last_subject_id.max(subject_max);
    }
}

/// A [`BookingStore`] kept behind one mutex.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store over a previously exported snapshot.
    pub fn from_state(mut state: StoreState) -> Result<Self> {
        state.check()?;
        state.repair_counters();
        Ok(Self {
            state: Mutex::new(state),
        })
    }

    /// Copy of the current contents, for persisting.
    pub fn snapshot(&self) -> Result<StoreState> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|_| BookingError::Storage("store lock poisoned".into()))
    }
}

impl BookingStore for MemoryStore {
    fn reserved_slots(&self) -> Result<Vec<Slot>> {
        Ok(self.lock()?.reservations.iter().map(|r| r.slot).collect())
    }

    fn blocked_slots(&self) -> Result<Vec<BlockedSlot>> {
        Ok(self.lock()?.blocked_slots.clone())
    }

    fn reservations(&self) -> Result<Vec<Reservation>> {
        Ok(self.lock()?.reservations.clone())
    }

    fn insert_reservation(&self, new: NewReservation) -> Result<Reservation> {
        let mut state = self.lock()?;
        if state.reservations.iter().any(|r| r.slot == new.slot) {
            return Err(BookingError::SlotUnavailable(new.slot));
        }
        state.last_reservation_id += 1;
        let reservation = Reservation::from_new(state.last_reservation_id, new);
        state.reservations.push(reservation.clone());
        Ok(reservation)
    }

    fn delete_reservation(&self, id: u64) -> Result<bool> {
        let mut state = self.lock()?;
        let before = state.reservations.len();
        state.reservations.retain(|r| r.id != id);
        Ok(state.reservations.len() != before)
    }

    fn insert_blocked_slot(&self, slot: Slot) -> Result<BlockedSlot> {
        let mut state = self.lock()?;
        if state.blocked_slots.iter().any(|b| b.slot == slot) {
            return Err(BookingError::AlreadyBlocked(slot));
        }
        state.last_blocked_id += 1;
        let blocked = BlockedSlot {
            id: state.last_blocked_id,
            slot,
        };
        state.blocked_slots.push(blocked);
        Ok(blocked)
    }

    fn delete_blocked_slot(&self, id: u64) -> Result<bool> {
        let mut state = self.lock()?;
        let before = state.blocked_slots.len();
        state.blocked_slots.retain(|b| b.id != id);
        Ok(state.blocked_slots.len() != before)
    }

    fn subjects(&self) -> Result<Vec<Subject>> {
        Ok(self.lock()?.subjects.clone())
    }

    fn insert_subject(&self, name: &str) -> Result<Subject> {
        let mut state = self.lock()?;
        if state.subjects.iter().any(|s| s.name == name) {
            return Err(BookingError::DuplicateSubject(name.to_string()));
        }
        state.last_subject_id += 1;
        let subject = Subject {
            id: state.last_subject_id,
            name: name.to_string(),
        };
        state.subjects.push(subject.clone());
        Ok(subject)
    }

    fn delete_subject(&self, id: u64) -> Result<bool> {
        let mut state = self.lock()?;
        let before = state.subjects.len();
        state.subjects.retain(|s| s.id != id);
        Ok(state.subjects.len() != before)
    }
}
