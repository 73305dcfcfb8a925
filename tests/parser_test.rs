//! Parser tests using HTML fixture files
//!
//! Fixtures are trimmed-down copies of the Berlin.de calendar, day-view,
//! and service pages.

use chrono::TimeZone;
use std::fs;
use terminwatch::models::CALENDAR_TZ;
use terminwatch::parser::CalendarParser;

const FIXTURES_DIR: &str = "tests/fixtures/html";

fn load_fixture(filename: &str) -> String {
    let path = format!("{FIXTURES_DIR}/{filename}");
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to load fixture: {path}"))
}

#[test]
fn test_calendar_page_dates() {
    let html = load_fixture("calendar_page.html");
    let dates = CalendarParser::new().appointment_dates(&html);

    let timestamps: Vec<i64> = dates.iter().map(|d| d.timestamp()).collect();
    assert_eq!(timestamps, vec![1_641_164_400, 1_641_250_800]);
}

#[test]
fn test_day_page_skips_broken_link() {
    let html = load_fixture("day_page.html");
    let dates = CalendarParser::new().appointment_dates(&html);

    // The fixture has three bookable cells, one with a non-numeric link.
    let timestamps: Vec<i64> = dates.iter().map(|d| d.timestamp()).collect();
    assert_eq!(timestamps, vec![1_641_250_800, 1_641_337_200]);
}

#[test]
fn test_dates_round_trip_through_epoch() {
    let html = load_fixture("calendar_page.html");
    let dates = CalendarParser::new().appointment_dates(&html);

    for date in &dates {
        let direct = CALENDAR_TZ.timestamp_opt(date.timestamp(), 0).unwrap();
        assert_eq!(*date, direct);
        assert_eq!(date.timezone(), CALENDAR_TZ);
    }
}

#[test]
fn test_service_page_booking_link() {
    let html = load_fixture("service_page.html");
    let link = CalendarParser::new().booking_link(&html).unwrap();

    assert!(link.starts_with("https://service.berlin.de/terminvereinbarung/termin/tag.php"));
    assert!(link.contains("120686"));
}

#[test]
fn test_empty_page_yields_no_dates() {
    let dates = CalendarParser::new().appointment_dates("<html><body></body></html>");
    assert!(dates.is_empty());
}
