//! One full poll cycle against the appointment calendar
//!
//! The calendar widget renders only two months per page load, and new
//! appointment months open on a rolling basis. A single cycle therefore
//! fetches the entry page and the day view for the 1st of next month, parses
//! both independently, and returns the deduplicated ascending union. A
//! failed fetch aborts the whole cycle: partial results are never reported.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use chrono_tz::Tz;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::crawler::Fetch;
use crate::error::{Error, FetchError};
use crate::models::CALENDAR_TZ;
use crate::parser::CalendarParser;

/// Pause between the two page fetches of one cycle. Berlin.de rate-limits
/// rapid consecutive requests from the same client.
const PAGE_DELAY: Duration = Duration::from_secs(1);

/// Path of the day view relative to the calendar host.
const DAY_VIEW_PATH: &str = "/terminvereinbarung/termin/day";

/// Scans the booking calendar and produces one slot list per cycle
pub struct CalendarScanner {
    fetcher: Arc<dyn Fetch>,
    parser: CalendarParser,
    calendar_url: String,
    timeout: Duration,
}

impl CalendarScanner {
    /// Create a scanner for an already-known calendar URL.
    pub fn new(fetcher: Arc<dyn Fetch>, calendar_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            fetcher,
            parser: CalendarParser::new(),
            calendar_url: calendar_url.into(),
            timeout,
        }
    }

    /// Resolve the booking-calendar URL from a service description page.
    ///
    /// Runs once at startup. A service page without the booking widget is
    /// fatal: there is nothing to watch.
    pub async fn resolve(
        fetcher: Arc<dyn Fetch>,
        service_page_url: &str,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let page = fetcher.fetch(service_page_url, timeout).await?;
        let parser = CalendarParser::new();
        let calendar_url = parser.booking_link(&page)?;

        Ok(Self {
            fetcher,
            parser,
            calendar_url,
            timeout,
        })
    }

    pub fn calendar_url(&self) -> &str {
        &self.calendar_url
    }

    /// Run one scan: the entry page plus the day view for the 1st of next
    /// month, paced by [`PAGE_DELAY`].
    ///
    /// # Errors
    ///
    /// Propagates the first fetch failure; nothing is parsed after a failed
    /// fetch, so a cycle either fully succeeds or fully fails.
    pub async fn scan(&self) -> Result<Vec<DateTime<Tz>>, FetchError> {
        let entry_page = self.fetcher.fetch(&self.calendar_url, self.timeout).await?;

        tokio::time::sleep(PAGE_DELAY).await;

        let now = Utc::now().with_timezone(&CALENDAR_TZ);
        let day_url = day_view_url(&self.calendar_url, next_month_first_timestamp(now));
        let day_page = self.fetcher.fetch(&day_url, self.timeout).await?;

        let mut dates: BTreeSet<DateTime<Tz>> =
            self.parser.appointment_dates(&entry_page).into_iter().collect();
        dates.extend(self.parser.appointment_dates(&day_page));

        debug!(count = dates.len(), day_url = %day_url, "scan cycle parsed");
        Ok(dates.into_iter().collect())
    }
}

/// Epoch seconds of midnight, Berlin time, on the 1st of the month after
/// `now`. Midnight is never skipped by Berlin DST transitions, so the
/// fallback to `now` is unreachable in practice.
fn next_month_first_timestamp(now: DateTime<Tz>) -> i64 {
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };

    CALENDAR_TZ
        .with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .earliest()
        .map(|first| first.timestamp())
        .unwrap_or_else(|| now.timestamp())
}

/// Derive the day-view URL on the same host as the calendar.
fn day_view_url(calendar_url: &str, timestamp: i64) -> String {
    let path = format!("{DAY_VIEW_PATH}/{timestamp}/");

    Url::parse(calendar_url)
        .ok()
        .and_then(|base| base.join(&path).ok())
        .map(String::from)
        .unwrap_or_else(|| format!("https://service.berlin.de{path}"))
}
