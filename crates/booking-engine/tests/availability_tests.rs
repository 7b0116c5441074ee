//! Tests for slot availability: set exclusion against reservations and blocks.

use booking_engine::availability::{compute_availability_map, is_available, Occupancy, SlotStatus};
use booking_engine::slot::{parse_date, parse_time};
use booking_engine::Slot;
use chrono::{NaiveDate, NaiveTime};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn slot(date: &str, time: &str) -> Slot {
    Slot::parse(date, time).unwrap()
}

fn dates(values: &[&str]) -> Vec<NaiveDate> {
    values.iter().map(|d| parse_date(d).unwrap()).collect()
}

fn times(values: &[&str]) -> Vec<NaiveTime> {
    values.iter().map(|t| parse_time(t).unwrap()).collect()
}

fn occupancy(reserved: &[Slot], blocked: &[Slot]) -> Occupancy {
    Occupancy::new(reserved.iter().copied(), blocked.iter().copied())
}

// ── is_available ────────────────────────────────────────────────────────────

#[test]
fn empty_occupancy_leaves_everything_free() {
    let occ = occupancy(&[], &[]);
    let s = slot("2025-11-18", "09:00");
    assert!(is_available(&occ, s.date, s.time));
    assert_eq!(occ.status(&s), SlotStatus::Free);
}

#[test]
fn reservation_alone_makes_slot_unavailable() {
    let taken = slot("2025-11-18", "09:00");
    let occ = occupancy(&[taken], &[]);
    assert!(!is_available(&occ, taken.date, taken.time));
    assert_eq!(occ.status(&taken), SlotStatus::Reserved);
}

#[test]
fn block_alone_makes_slot_unavailable() {
    let blocked = slot("2025-11-19", "14:00");
    let occ = occupancy(&[], &[blocked]);
    assert!(!is_available(&occ, blocked.date, blocked.time));
    assert_eq!(occ.status(&blocked), SlotStatus::Blocked);
}

#[test]
fn reserved_and_blocked_reports_reserved() {
    let s = slot("2025-11-19", "14:00");
    let occ = occupancy(&[s], &[s]);
    assert_eq!(occ.status(&s), SlotStatus::Reserved);
    assert!(!occ.is_available(&s));
}

#[test]
fn exclusion_is_exact_on_date_and_time() {
    let occ = occupancy(&[slot("2025-11-18", "09:00")], &[]);
    // Same time on another date, and another time on the same date, stay free.
    assert!(occ.is_available(&slot("2025-11-19", "09:00")));
    assert!(occ.is_available(&slot("2025-11-18", "10:00")));
}

#[test]
fn seconds_form_matches_minutes_form() {
    let occ = occupancy(&[slot("2025-11-18", "09:00:00")], &[]);
    assert!(!occ.is_available(&slot("2025-11-18", "09:00")));
}

// ── compute_availability_map ────────────────────────────────────────────────

#[test]
fn worked_example_from_two_dates_two_times() {
    let map = compute_availability_map(
        &dates(&["2025-11-18", "2025-11-19"]),
        &times(&["09:00", "10:00"]),
        &occupancy(&[slot("2025-11-18", "09:00")], &[]),
    );

    assert_eq!(
        serde_json::to_string(&map).unwrap(),
        r#"{"2025-11-18":["10:00"],"2025-11-19":["09:00","10:00"]}"#
    );
}

#[test]
fn fully_taken_date_is_kept_with_empty_sequence() {
    let d = dates(&["2025-11-18", "2025-11-19"]);
    let t = times(&["09:00", "10:00"]);
    let occ = occupancy(
        &[slot("2025-11-18", "09:00")],
        &[slot("2025-11-18", "10:00")],
    );

    let map = compute_availability_map(&d, &t, &occ);

    assert_eq!(map.len(), 2);
    assert_eq!(map.get(d[0]), Some(&[][..]));
    assert!(!map.is_date_available(d[0]));
    assert!(map.is_date_available(d[1]));
    assert!(map.has_any_slot());
}

#[test]
fn date_outside_input_is_absent() {
    let map = compute_availability_map(
        &dates(&["2025-11-18"]),
        &times(&["09:00"]),
        &occupancy(&[], &[]),
    );
    assert_eq!(map.get(parse_date("2025-11-20").unwrap()), None);
}

#[test]
fn nothing_free_anywhere() {
    let d = dates(&["2025-11-18"]);
    let t = times(&["09:00", "10:00"]);
    let occ = occupancy(
        &[slot("2025-11-18", "09:00")],
        &[slot("2025-11-18", "10:00")],
    );

    let map = compute_availability_map(&d, &t, &occ);
    assert!(!map.has_any_slot());
    assert_eq!(map.free_slot_count(), 0);
    assert_eq!(map.len(), 1);
}

#[test]
fn input_time_order_is_preserved() {
    let t = times(&["16:00", "09:00", "11:00"]);
    let map = compute_availability_map(
        &dates(&["2025-11-18"]),
        &t,
        &occupancy(&[], &[slot("2025-11-18", "09:00")]),
    );
    assert_eq!(
        map.get(parse_date("2025-11-18").unwrap()).unwrap(),
        &times(&["16:00", "11:00"])[..]
    );
}

#[test]
fn input_date_order_is_preserved() {
    let d = dates(&["2025-11-21", "2025-11-18", "2025-11-19"]);
    let map = compute_availability_map(&d, &times(&["09:00"]), &occupancy(&[], &[]));
    assert_eq!(map.dates().collect::<Vec<_>>(), d);
}

#[test]
fn duplicates_collapse_to_first_occurrence() {
    let map = compute_availability_map(
        &dates(&["2025-11-18", "2025-11-18"]),
        &times(&["09:00", "10:00", "09:00"]),
        &occupancy(&[], &[]),
    );
    assert_eq!(map.len(), 1);
    assert_eq!(map.free_slot_count(), 2);
}

#[test]
fn occupancy_outside_the_offer_is_ignored() {
    let map = compute_availability_map(
        &dates(&["2025-11-18"]),
        &times(&["09:00"]),
        &occupancy(&[slot("2025-12-01", "09:00")], &[slot("2025-11-18", "17:00")]),
    );
    assert!(map.contains(&slot("2025-11-18", "09:00")));
}

#[test]
fn empty_inputs_give_empty_map() {
    let map = compute_availability_map(&[], &times(&["09:00"]), &occupancy(&[], &[]));
    assert!(map.is_empty());
    assert!(!map.has_any_slot());

    let map = compute_availability_map(&dates(&["2025-11-18"]), &[], &occupancy(&[], &[]));
    assert_eq!(map.len(), 1);
    assert!(!map.has_any_slot());
}
