use booking_engine::ics::CalendarInvite;
use booking_engine::{compute_availability_map, escape_ics_text, Occupancy, Requester, Reservation, Slot};
use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn offer(days: u32, per_day: u32) -> (Vec<NaiveDate>, Vec<NaiveTime>) {
    let start = NaiveDate::from_ymd_opt(2025, 11, 3).unwrap();
    let dates = (0..days).map(|d| start + Duration::days(i64::from(d))).collect();
    let times = (0..per_day)
        .map(|i| NaiveTime::from_hms_opt(8 + i / 2, (i % 2) * 30, 0).unwrap())
        .collect();
    (dates, times)
}

fn bench_availability_small(c: &mut Criterion) {
    let (dates, times) = offer(4, 6);
    let occupancy = Occupancy::new(
        [Slot::new(dates[0], times[0]), Slot::new(dates[1], times[2])],
        [Slot::new(dates[2], times[5])],
    );

    c.bench_function("availability_4x6", |b| {
        b.iter(|| compute_availability_map(black_box(&dates), black_box(&times), black_box(&occupancy)))
    });
}

fn bench_availability_month(c: &mut Criterion) {
    let (dates, times) = offer(30, 20);
    // Every third slot is taken.
    let taken: Vec<Slot> = dates
        .iter()
        .flat_map(|d| times.iter().map(move |t| Slot::new(*d, *t)))
        .step_by(3)
        .collect();
    let occupancy = Occupancy::new(taken, []);

    c.bench_function("availability_30x20", |b| {
        b.iter(|| compute_availability_map(black_box(&dates), black_box(&times), black_box(&occupancy)))
    });
}

fn bench_escape(c: &mut Criterion) {
    let text = "Room 4, building B; ask at desk\\reception\n".repeat(20);
    c.bench_function("escape_ics_text_800b", |b| b.iter(|| escape_ics_text(black_box(&text))));
}

fn bench_invite(c: &mut Criterion) {
    let reservation = Reservation {
        id: 1,
        slot: Slot::parse("2025-11-18", "09:00").unwrap(),
        requester: Requester {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            organization: "Acme, Inc.".into(),
            email: "jane@example.com".into(),
        },
        subjects: vec!["Demo".into(), "Pricing".into(), "Support".into()],
        created_at: Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap(),
    };
    let config = booking_engine::BookingConfig::default();
    let dtstamp = Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap();

    c.bench_function("invite_to_ics", |b| {
        b.iter(|| {
            CalendarInvite::for_reservation(black_box(&reservation), &config, "uid@bench", dtstamp)
                .map(|invite| invite.to_ics())
        })
    });
}

criterion_group!(
    benches,
    bench_availability_small,
    bench_availability_month,
    bench_escape,
    bench_invite
);
criterion_main!(benches);
