//! Slot availability: which `(date, time)` pairs are still free.
//!
//! Offered slots come from small enumerated sets (a handful of dates times a
//! handful of times), so availability is plain set exclusion against two
//! tables read at decision time: confirmed reservations and slots blocked by
//! an administrator. Either table alone is enough to take a slot off the map.
//!
//! The [`AvailabilityMap`] is derived data. It is recomputed on every read and
//! never persisted.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::slot::{format_time, Slot};

/// Why a slot is or is not bookable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    Free,
    /// A confirmed reservation occupies the slot.
    Reserved,
    /// An administrator blocked the slot.
    Blocked,
}

/// Occupancy snapshot: the reserved and blocked slots at decision time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Occupancy {
    reserved: HashSet<Slot>,
    blocked: HashSet<Slot>,
}

impl Occupancy {
    pub fn new(
        reserved: impl IntoIterator<Item = Slot>,
        blocked: impl IntoIterator<Item = Slot>,
    ) -> Self {
        Self {
            reserved: reserved.into_iter().collect(),
            blocked: blocked.into_iter().collect(),
        }
    }

    /// Classify a slot. A slot that is both reserved and blocked reports `Reserved`.
    pub fn status(&self, slot: &Slot) -> SlotStatus {
        if self.reserved.contains(slot) {
            SlotStatus::Reserved
        } else if self.blocked.contains(slot) {
            SlotStatus::Blocked
        } else {
            SlotStatus::Free
        }
    }

    pub fn is_available(&self, slot: &Slot) -> bool {
        self.status(slot) == SlotStatus::Free
    }

    pub fn reserved_count(&self) -> usize {
        self.reserved.len()
    }

    pub fn blocked_count(&self) -> usize {
        self.blocked.len()
    }
}

/// `false` when a reservation or a blocked slot sits at exactly `(date, time)`.
pub fn is_available(occupancy: &Occupancy, date: NaiveDate, time: NaiveTime) -> bool {
    occupancy.is_available(&Slot::new(date, time))
}

/// Free times per date, in input order.
///
/// Every requested date is a key, including dates whose sequence is empty:
/// the presentation layer distinguishes "no free time on this date" from
/// "date not offered".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityMap {
    entries: Vec<(NaiveDate, Vec<NaiveTime>)>,
}

impl AvailabilityMap {
    /// Free times at `date`, or `None` when the date was not part of the input.
    pub fn get(&self, date: NaiveDate) -> Option<&[NaiveTime]> {
        self.entries
            .iter()
            .find(|(d, _)| *d == date)
            .map(|(_, times)| times.as_slice())
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.entries.iter().map(|(d, _)| *d)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &[NaiveTime])> {
        self.entries.iter().map(|(d, times)| (*d, times.as_slice()))
    }

    /// True when at least one date has at least one free time.
    pub fn has_any_slot(&self) -> bool {
        self.entries.iter().any(|(_, times)| !times.is_empty())
    }

    pub fn is_date_available(&self, date: NaiveDate) -> bool {
        self.get(date).is_some_and(|times| !times.is_empty())
    }

    pub fn contains(&self, slot: &Slot) -> bool {
        self.get(slot.date).is_some_and(|times| times.contains(&slot.time))
    }

    /// Number of dates (keys), not free slots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of free slots across all dates.
    pub fn free_slot_count(&self) -> usize {
        self.entries.iter().map(|(_, times)| times.len()).sum()
    }
}

/// Serialized as `{"YYYY-MM-DD": ["HH:MM", ...], ...}` in input order.
impl Serialize for AvailabilityMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (date, times) in &self.entries {
            let times: Vec<String> = times.iter().map(|t| format_time(*t)).collect();
            map.serialize_entry(&date.format("%Y-%m-%d").to_string(), &times)?;
        }
        map.end()
    }
}

/// Evaluate every pair of `dates x times` against the occupancy snapshot.
///
/// Duplicate dates or times are collapsed to their first occurrence.
pub fn compute_availability_map(
    dates: &[NaiveDate],
    times: &[NaiveTime],
    occupancy: &Occupancy,
) -> AvailabilityMap {
    let mut seen_times = HashSet::with_capacity(times.len());
    let times: Vec<NaiveTime> = times
        .iter()
        .copied()
        .filter(|t| seen_times.insert(*t))
        .collect();

    let mut seen_dates = HashSet::with_capacity(dates.len());
    let entries: Vec<(NaiveDate, Vec<NaiveTime>)> = dates
        .iter()
        .copied()
        .filter(|d| seen_dates.insert(*d))
        .map(|date| {
            let free = times
                .iter()
                .copied()
                .filter(|time| is_available(occupancy, date, *time))
                .collect();
            (date, free)
        })
        .collect();

    tracing::debug!(
        dates = entries.len(),
        times = times.len(),
        reserved = occupancy.reserved_count(),
        blocked = occupancy.blocked_count(),
        "computed availability map"
    );

    AvailabilityMap { entries }
}
