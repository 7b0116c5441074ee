//! Property-based tests for availability and ICS escaping using proptest.
//!
//! These verify invariants that hold for *any* offer and occupancy, not just
//! the worked examples in `availability_tests.rs` and `ics_tests.rs`.

use std::collections::HashSet;

use booking_engine::{compute_availability_map, escape_ics_text, is_available, Occupancy, Slot};
use chrono::{NaiveDate, NaiveTime};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies: small enumerated offers, like real booking pages
// ---------------------------------------------------------------------------

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0u32..10).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2025, 11, 18 + offset).expect("valid November date")
    })
}

fn arb_time() -> impl Strategy<Value = NaiveTime> {
    (8u32..18, prop_oneof![Just(0u32), Just(30u32)])
        .prop_map(|(h, m)| NaiveTime::from_hms_opt(h, m, 0).expect("valid time"))
}

fn arb_slot() -> impl Strategy<Value = Slot> {
    (arb_date(), arb_time()).prop_map(|(date, time)| Slot::new(date, time))
}

fn arb_case() -> impl Strategy<Value = (Vec<NaiveDate>, Vec<NaiveTime>, Vec<Slot>, Vec<Slot>)> {
    (
        prop::collection::vec(arb_date(), 0..6),
        prop::collection::vec(arb_time(), 0..8),
        prop::collection::vec(arb_slot(), 0..20),
        prop::collection::vec(arb_slot(), 0..20),
    )
}

// ---------------------------------------------------------------------------
// Availability properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn occupied_slots_are_never_available((_, _, reserved, blocked) in arb_case()) {
        let occ = Occupancy::new(reserved.clone(), blocked.clone());
        for s in reserved.iter().chain(blocked.iter()) {
            prop_assert!(!is_available(&occ, s.date, s.time), "{} must be unavailable", s);
        }
    }

    #[test]
    fn unoccupied_slots_are_available(
        (_, _, reserved, blocked) in arb_case(),
        probe in arb_slot(),
    ) {
        let occ = Occupancy::new(reserved.clone(), blocked.clone());
        let occupied = reserved.contains(&probe) || blocked.contains(&probe);
        prop_assert_eq!(is_available(&occ, probe.date, probe.time), !occupied);
    }

    #[test]
    fn map_only_contains_offered_free_times((dates, times, reserved, blocked) in arb_case()) {
        let occ = Occupancy::new(reserved, blocked);
        let map = compute_availability_map(&dates, &times, &occ);

        for (date, free) in map.iter() {
            prop_assert!(dates.contains(&date));
            for time in free {
                prop_assert!(times.contains(time), "{} was not offered", time);
                prop_assert!(is_available(&occ, date, *time));
            }
        }
    }

    #[test]
    fn map_contains_every_free_offered_slot((dates, times, reserved, blocked) in arb_case()) {
        let occ = Occupancy::new(reserved, blocked);
        let map = compute_availability_map(&dates, &times, &occ);

        for date in &dates {
            let free = map.get(*date);
            prop_assert!(free.is_some(), "every offered date is a key");
            for time in &times {
                let expected = is_available(&occ, *date, *time);
                prop_assert_eq!(free.unwrap().contains(time), expected);
            }
        }
    }

    #[test]
    fn map_keys_follow_first_occurrence_order((dates, times, reserved, blocked) in arb_case()) {
        let occ = Occupancy::new(reserved, blocked);
        let map = compute_availability_map(&dates, &times, &occ);

        let mut seen = HashSet::new();
        let expected: Vec<NaiveDate> = dates.iter().copied().filter(|d| seen.insert(*d)).collect();
        prop_assert_eq!(map.dates().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn free_times_keep_input_order((dates, times, reserved, blocked) in arb_case()) {
        let occ = Occupancy::new(reserved, blocked);
        let map = compute_availability_map(&dates, &times, &occ);

        for (_, free) in map.iter() {
            let positions: Vec<usize> = free
                .iter()
                .map(|t| times.iter().position(|x| x == t).unwrap())
                .collect();
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
    }
}

// ---------------------------------------------------------------------------
// Escaping properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn escaped_text_has_no_raw_newline(text in "(?s).*") {
        prop_assert!(!escape_ics_text(&text).contains('\n'));
    }

    #[test]
    fn text_without_specials_is_unchanged(text in "[^\\\\,;\n]*") {
        prop_assert_eq!(escape_ics_text(&text), text);
    }

    #[test]
    fn escaping_grows_by_one_per_special(text in "(?s).*") {
        let specials = text.chars().filter(|c| matches!(c, '\\' | ',' | ';' | '\n')).count();
        prop_assert_eq!(escape_ics_text(&text).len(), text.len() + specials);
    }

    #[test]
    fn every_escaped_special_is_preceded_by_backslash(text in "[a-z,;\\\\\n ]{0,40}") {
        let escaped = escape_ics_text(&text);
        let mut chars = escaped.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    let next = chars.next();
                    prop_assert!(matches!(next, Some('\\' | ',' | ';' | 'n')), "dangling escape in {:?}", escaped);
                }
                ',' | ';' => prop_assert!(false, "unescaped {:?} in {:?}", c, escaped),
                _ => {}
            }
        }
    }
}
