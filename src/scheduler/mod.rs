//! Poll loop and failure classification
//!
//! One timer-driven loop alternates between exactly two states: running a
//! scan cycle and sleeping until the next one. Cycles never overlap because
//! the next sleep only starts after the previous snapshot has been
//! published. Every failure class is absorbed into a snapshot; nothing that
//! happens inside a cycle terminates the loop.
//!
//! Backoff policy: only an upstream HTTP error escalates the delay, since
//! the upstream is explicitly signaling it wants fewer requests. Connection
//! blips, timeouts, and unknown errors retry at the base interval.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::crawler::CalendarScanner;
use crate::error::FetchError;
use crate::models::{Snapshot, SnapshotStatus};
use crate::notifications::Signal;
use crate::server::Hub;

/// Build the failure snapshot for one failed cycle.
///
/// Subscribers get the taxonomy-level summary only; the full error detail
/// goes to the operator log at the call site.
pub fn snapshot_for_failure(err: &FetchError, previous_found: Option<DateTime<Utc>>) -> Snapshot {
    match err {
        FetchError::Upstream { status, .. } => Snapshot::failure(
            SnapshotStatus::UpstreamError,
            format!("Could not fetch results from Berlin.de - Got HTTP {status}."),
            previous_found,
        ),
        FetchError::Connection(_) => Snapshot::failure(
            SnapshotStatus::ConnectionError,
            "Could not fetch results from Berlin.de - Got connection error.",
            previous_found,
        ),
        FetchError::Timeout => Snapshot::failure(
            SnapshotStatus::TimeoutError,
            "Could not fetch results from Berlin.de - Request timed out.",
            previous_found,
        ),
        other => Snapshot::failure(
            SnapshotStatus::UnknownError,
            format!("An unknown error occured: {other}"),
            previous_found,
        ),
    }
}

/// Delay before the next cycle, given the outcome of this one.
pub fn next_delay(status: SnapshotStatus, base: Duration, backoff: Duration) -> Duration {
    match status {
        SnapshotStatus::UpstreamError => backoff,
        _ => base,
    }
}

/// The process-lifetime poll loop
pub struct PollLoop {
    scanner: CalendarScanner,
    hub: Arc<Hub>,
    signal: Signal,
    base_interval: Duration,
    backoff_interval: Duration,
}

impl PollLoop {
    pub fn new(
        scanner: CalendarScanner,
        hub: Arc<Hub>,
        signal: Signal,
        base_interval: Duration,
        backoff_interval: Duration,
    ) -> Self {
        Self {
            scanner,
            hub,
            signal,
            base_interval,
            backoff_interval,
        }
    }

    /// Run until the process is stopped externally.
    pub async fn run(self) {
        info!(
            interval_secs = self.base_interval.as_secs(),
            "poll loop started"
        );

        loop {
            let snapshot = self.cycle().await;
            let delay = next_delay(snapshot.status, self.base_interval, self.backoff_interval);
            self.hub.publish(snapshot).await;
            tokio::time::sleep(delay).await;
        }
    }

    /// One cycle: scan, classify, signal.
    async fn cycle(&self) -> Snapshot {
        let previous_found = self.hub.published().await.last_slots_found_at;

        match self.scanner.scan().await {
            Ok(slots) => {
                info!(count = slots.len(), "appointment scan complete");
                if !slots.is_empty() {
                    self.signal.found();
                }
                Snapshot::ok(slots, previous_found)
            }
            Err(err) => {
                match &err {
                    FetchError::Upstream { status, url } => {
                        warn!(status, %url, backoff_secs = self.backoff_interval.as_secs(),
                            "upstream rejected the request, backing off");
                    }
                    FetchError::Connection(detail) => {
                        warn!(%detail, "could not connect to Berlin.de");
                    }
                    FetchError::Timeout => warn!("calendar request timed out"),
                    other => error!(error = %other, "unexpected failure during scan"),
                }
                self.signal.failed();
                snapshot_for_failure(&err, previous_found)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_failure_snapshot() {
        let err = FetchError::Upstream {
            status: 503,
            url: "https://service.berlin.de/terminvereinbarung/termin/tag.php".to_string(),
        };
        let snapshot = snapshot_for_failure(&err, None);

        assert_eq!(snapshot.status, SnapshotStatus::UpstreamError);
        assert_eq!(snapshot.status.code(), 502);
        assert!(snapshot.slots.is_empty());
        assert!(snapshot.message.as_deref().unwrap().contains("503"));
    }

    #[test]
    fn test_only_upstream_errors_escalate() {
        let base = Duration::from_secs(180);
        let backoff = Duration::from_secs(600);

        assert_eq!(next_delay(SnapshotStatus::UpstreamError, base, backoff), backoff);
        assert_eq!(next_delay(SnapshotStatus::Ok, base, backoff), base);
        assert_eq!(next_delay(SnapshotStatus::ConnectionError, base, backoff), base);
        assert_eq!(next_delay(SnapshotStatus::TimeoutError, base, backoff), base);
        assert_eq!(next_delay(SnapshotStatus::UnknownError, base, backoff), base);
    }

    #[test]
    fn test_failure_carries_found_marker() {
        let found_at = Utc::now();
        let snapshot = snapshot_for_failure(&FetchError::Timeout, Some(found_at));

        assert_eq!(snapshot.status, SnapshotStatus::TimeoutError);
        assert_eq!(snapshot.last_slots_found_at, Some(found_at));
    }
}
