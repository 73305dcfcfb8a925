//! CalendarScanner tests with a scripted fetch implementation
//!
//! The scanner only sees the `Fetch` trait, so these tests drive whole
//! cycles without any network: entry-page and day-view responses are keyed
//! off the requested URL.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use terminwatch::crawler::{CalendarScanner, Fetch};
use terminwatch::error::FetchError;

const CALENDAR_URL: &str = "https://service.berlin.de/terminvereinbarung/termin/tag.php?termin=1";
const TIMEOUT: Duration = Duration::from_secs(20);

/// Fetch stub: one canned result for the entry page, one for the day view.
struct ScriptedFetch {
    entry: Result<String, FetchError>,
    day: Result<String, FetchError>,
    calls: AtomicUsize,
}

impl ScriptedFetch {
    fn new(entry: Result<String, FetchError>, day: Result<String, FetchError>) -> Arc<Self> {
        Arc::new(Self {
            entry,
            day,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn clone_result(result: &Result<String, FetchError>) -> Result<String, FetchError> {
    match result {
        Ok(body) => Ok(body.clone()),
        Err(FetchError::Upstream { status, url }) => Err(FetchError::Upstream {
            status: *status,
            url: url.clone(),
        }),
        Err(FetchError::Connection(detail)) => Err(FetchError::Connection(detail.clone())),
        Err(FetchError::Timeout) => Err(FetchError::Timeout),
        Err(FetchError::Client(_)) => unreachable!("client errors are not scripted"),
    }
}

#[async_trait]
impl Fetch for ScriptedFetch {
    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if url.contains("/terminvereinbarung/termin/day/") {
            clone_result(&self.day)
        } else {
            clone_result(&self.entry)
        }
    }
}

fn bookable(timestamps: &[i64]) -> String {
    let cells: String = timestamps
        .iter()
        .map(|ts| format!(r#"<td class="buchbar"><a href="/termin/time/{ts}/">x</a></td>"#))
        .collect();
    format!("<table><tr>{cells}</tr></table>")
}

#[tokio::test(start_paused = true)]
async fn test_scan_unions_and_sorts_both_pages() {
    // Entry page: T1, T2. Day page: T2 (duplicate), T3.
    let fetch = ScriptedFetch::new(
        Ok(bookable(&[1_641_164_400, 1_641_250_800])),
        Ok(bookable(&[1_641_250_800, 1_641_337_200])),
    );
    let scanner = CalendarScanner::new(fetch.clone(), CALENDAR_URL, TIMEOUT);

    let slots = scanner.scan().await.unwrap();

    let timestamps: Vec<i64> = slots.iter().map(|d| d.timestamp()).collect();
    assert_eq!(timestamps, vec![1_641_164_400, 1_641_250_800, 1_641_337_200]);
    assert_eq!(fetch.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_scan_is_order_independent() {
    // Same pages swapped: the union must come out identical.
    let fetch = ScriptedFetch::new(
        Ok(bookable(&[1_641_250_800, 1_641_337_200])),
        Ok(bookable(&[1_641_164_400, 1_641_250_800])),
    );
    let scanner = CalendarScanner::new(fetch, CALENDAR_URL, TIMEOUT);

    let slots = scanner.scan().await.unwrap();

    let timestamps: Vec<i64> = slots.iter().map(|d| d.timestamp()).collect();
    assert_eq!(timestamps, vec![1_641_164_400, 1_641_250_800, 1_641_337_200]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_entry_fetch_aborts_cycle() {
    let fetch = ScriptedFetch::new(
        Err(FetchError::Upstream {
            status: 503,
            url: CALENDAR_URL.to_string(),
        }),
        Ok(bookable(&[1_641_164_400])),
    );
    let scanner = CalendarScanner::new(fetch.clone(), CALENDAR_URL, TIMEOUT);

    let err = scanner.scan().await.unwrap_err();

    assert!(matches!(err, FetchError::Upstream { status: 503, .. }));
    // The day view is never requested after a failed entry fetch.
    assert_eq!(fetch.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_day_fetch_discards_entry_results() {
    let fetch = ScriptedFetch::new(Ok(bookable(&[1_641_164_400])), Err(FetchError::Timeout));
    let scanner = CalendarScanner::new(fetch.clone(), CALENDAR_URL, TIMEOUT);

    let err = scanner.scan().await.unwrap_err();

    // No partial snapshot: the whole cycle fails.
    assert!(matches!(err, FetchError::Timeout));
    assert_eq!(fetch.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_resolve_extracts_calendar_url() {
    let service_page = r#"<div class="zmstermin-multi inner">
        <a href="https://service.berlin.de/terminvereinbarung/termin/tag.php?termin=1">Termin buchen</a>
    </div>"#;
    let fetch = ScriptedFetch::new(Ok(service_page.to_string()), Ok(String::new()));

    let scanner = CalendarScanner::resolve(
        fetch,
        "https://service.berlin.de/dienstleistung/120686/",
        TIMEOUT,
    )
    .await
    .unwrap();

    assert_eq!(scanner.calendar_url(), CALENDAR_URL);
}

#[tokio::test(start_paused = true)]
async fn test_resolve_fails_without_widget() {
    let fetch = ScriptedFetch::new(Ok("<html><body></body></html>".to_string()), Ok(String::new()));

    let result = CalendarScanner::resolve(
        fetch,
        "https://service.berlin.de/dienstleistung/120686/",
        TIMEOUT,
    )
    .await;

    assert!(result.is_err());
}
