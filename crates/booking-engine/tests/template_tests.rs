//! Tests for `{placeholder}` substitution in notification templates.

use booking_engine::template::{format_date, render, Placeholder, TemplateValues};
use booking_engine::{Requester, Reservation, Slot};
use chrono::{TimeZone, Utc};

fn values() -> TemplateValues {
    TemplateValues::new()
        .with(Placeholder::FirstName, "Jane")
        .with(Placeholder::LastName, "Doe")
        .with(Placeholder::Time, "09:00")
}

#[test]
fn known_placeholders_are_replaced() {
    assert_eq!(
        render("Hello {first_name} {last_name}, see you at {time}.", &values()),
        "Hello Jane Doe, see you at 09:00."
    );
}

#[test]
fn repeated_placeholder_replaced_everywhere() {
    assert_eq!(render("{first_name}/{first_name}", &values()), "Jane/Jane");
}

#[test]
fn unknown_placeholders_are_kept_verbatim() {
    assert_eq!(render("Hi {nickname}!", &values()), "Hi {nickname}!");
}

#[test]
fn recognized_placeholder_without_value_is_kept() {
    assert_eq!(render("On {date}", &values()), "On {date}");
}

#[test]
fn unbalanced_braces_are_left_alone() {
    assert_eq!(render("{first_name", &values()), "{first_name");
    assert_eq!(render("} {first_name} {", &values()), "} Jane {");
    assert_eq!(render("{{first_name}}", &values()), "{Jane}");
}

#[test]
fn substituted_values_are_not_rescanned() {
    let values = TemplateValues::new()
        .with(Placeholder::FirstName, "{last_name}")
        .with(Placeholder::LastName, "Doe");
    assert_eq!(render("{first_name} {last_name}", &values), "{last_name} Doe");
}

#[test]
fn empty_template_renders_empty() {
    assert_eq!(render("", &values()), "");
}

#[test]
fn placeholder_names_round_trip() {
    for p in Placeholder::ALL {
        assert_eq!(Placeholder::from_name(p.name()), Some(p));
        assert_eq!(p.token(), format!("{{{}}}", p.name()));
    }
    assert_eq!(Placeholder::from_name("prenom"), None);
}

#[test]
fn values_from_reservation_fill_every_placeholder() {
    let reservation = Reservation {
        id: 1,
        slot: Slot::parse("2025-11-18", "09:00").unwrap(),
        requester: Requester {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            organization: "Acme".into(),
            email: "jane@example.com".into(),
        },
        subjects: vec!["Demo".into(), "Support".into()],
        created_at: Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap(),
    };

    let values = TemplateValues::for_reservation(&reservation, "%A %-d %B %Y").unwrap();
    for p in Placeholder::ALL {
        assert!(values.get(p).is_some(), "{p:?} missing");
    }
    assert_eq!(
        render("{date} {time} | {subjects} | {organization} | {email}", &values),
        "Tuesday 18 November 2025 09:00 | Demo, Support | Acme | jane@example.com"
    );
}

#[test]
fn invalid_date_format_is_an_error() {
    let date = chrono::NaiveDate::from_ymd_opt(2025, 11, 18).unwrap();
    assert_eq!(format_date(date, "%d/%m/%Y").unwrap(), "18/11/2025");
    assert!(format_date(date, "%Q").is_err());
}
