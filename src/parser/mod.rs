//! Calendar markup parsing
//!
//! Two pure extraction jobs, both free of network and timing side effects:
//!
//! - pulling bookable dates out of a calendar or day-view page, and
//! - pulling the booking-calendar link out of a service description page.
//!
//! The calendar marks bookable days as `td.buchbar` cells whose anchor
//! links end in a Unix epoch-seconds path segment. Those timestamps are
//! Berlin-local instants; localizing them to the host timezone would shift
//! every date for anyone running the watcher outside CET/CEST.

use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;
use scraper::{Html, Selector};
use std::collections::BTreeSet;

use crate::error::ParseError;
use crate::models::CALENDAR_TZ;

/// Parser for Berlin.de booking pages
pub struct CalendarParser {
    bookable: Selector,
    booking_widget: Selector,
}

impl CalendarParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bookable: Selector::parse("td.buchbar a").expect("Invalid CSS selector: td.buchbar a"),
            booking_widget: Selector::parse("div.zmstermin-multi.inner a")
                .expect("Invalid CSS selector: div.zmstermin-multi.inner a"),
        }
    }

    /// Extract bookable moments from one page's content.
    ///
    /// Returns the dates ascending and deduplicated. Anchors without the
    /// expected trailing-timestamp link shape are skipped: partial or
    /// drifted markup degrades to fewer results, never to an error.
    pub fn appointment_dates(&self, page_content: &str) -> Vec<DateTime<Tz>> {
        let document = Html::parse_document(page_content);

        let dates: BTreeSet<DateTime<Tz>> = document
            .select(&self.bookable)
            .filter_map(|anchor| anchor.value().attr("href"))
            .filter_map(parse_link_timestamp)
            .filter_map(|timestamp| CALENDAR_TZ.timestamp_opt(timestamp, 0).single())
            .collect();

        dates.into_iter().collect()
    }

    /// Extract the booking-calendar URL from a service description page.
    ///
    /// The calendar lives behind the first anchor of the appointment
    /// widget. Resolution happens once at startup; a page without the
    /// widget is an error, not a skip.
    pub fn booking_link(&self, page_content: &str) -> Result<String, ParseError> {
        let document = Html::parse_document(page_content);

        document
            .select(&self.booking_widget)
            .filter_map(|anchor| anchor.value().attr("href"))
            .map(str::to_string)
            .next()
            .ok_or(ParseError::BookingLinkNotFound)
    }
}

impl Default for CalendarParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Read the trailing numeric path segment of a booking link as epoch seconds.
fn parse_link_timestamp(href: &str) -> Option<i64> {
    href.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}
