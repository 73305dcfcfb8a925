// Core data structures for the appointment watcher

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

/// Timezone of the upstream calendar. The booking links embed epoch
/// timestamps that must be read as Berlin-local instants, never as the
/// host's local time.
pub const CALENDAR_TZ: Tz = chrono_tz::Europe::Berlin;

/// Timestamp format used on the wire: `YYYY-MM-DDTHH:MM:SSZ`, UTC.
pub const WIRE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Outcome classification of one poll cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotStatus {
    /// Cycle completed; slots may still be empty
    Ok,
    /// Upstream responded with a non-success HTTP status
    UpstreamError,
    /// Could not reach the upstream at all
    ConnectionError,
    /// Upstream did not answer within the allotted time
    TimeoutError,
    /// Anything else; the catch-all that keeps the loop alive
    UnknownError,
}

impl SnapshotStatus {
    /// Stable numeric code sent to subscribers.
    ///
    /// Connection errors share 502 with upstream errors: from a subscriber's
    /// point of view both mean "could not reach the source".
    pub fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::UpstreamError | Self::ConnectionError => 502,
            Self::TimeoutError => 504,
            Self::UnknownError => 500,
        }
    }

    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// One immutable publication of availability state
///
/// Invariants, upheld by the constructors: `slots` is strictly ascending and
/// deduplicated; `Ok` implies `message` is `None`; non-`Ok` implies `slots`
/// is empty; `last_slots_found_at` never moves backwards across the sequence
/// of snapshots produced by one process.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// When this snapshot was produced
    pub observed_at: DateTime<Utc>,
    pub status: SnapshotStatus,
    /// Human-readable detail, present only for non-Ok status
    pub message: Option<String>,
    /// Bookable moments in the calendar's timezone, ascending, deduplicated
    pub slots: Vec<DateTime<Tz>>,
    /// When slots were last non-empty, carried forward over empty cycles
    pub last_slots_found_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Startup state: Ok, no slots, no history.
    pub fn initial() -> Self {
        Self {
            observed_at: Utc::now(),
            status: SnapshotStatus::Ok,
            message: None,
            slots: Vec::new(),
            last_slots_found_at: None,
        }
    }

    /// Successful cycle. Advances `last_slots_found_at` only when slots
    /// were actually found, otherwise carries the previous value forward.
    pub fn ok(mut slots: Vec<DateTime<Tz>>, previous_found: Option<DateTime<Utc>>) -> Self {
        slots.sort_unstable();
        slots.dedup();
        let observed_at = Utc::now();
        let last_slots_found_at = if slots.is_empty() {
            previous_found
        } else {
            Some(observed_at)
        };
        Self {
            observed_at,
            status: SnapshotStatus::Ok,
            message: None,
            slots,
            last_slots_found_at,
        }
    }

    /// Failed cycle. Slots are always empty; the found-at marker is carried
    /// forward so subscribers keep their sense of how stale availability is.
    pub fn failure(
        status: SnapshotStatus,
        message: impl Into<String>,
        previous_found: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            observed_at: Utc::now(),
            status,
            message: Some(message.into()),
            slots: Vec::new(),
            last_slots_found_at: previous_found,
        }
    }

    /// Build the wire representation.
    pub fn to_wire(&self) -> WireMessage {
        WireMessage {
            time: wire_time(self.observed_at),
            status: self.status.code(),
            message: self.message.clone(),
            appointment_dates: self
                .slots
                .iter()
                .map(|slot| wire_time(slot.with_timezone(&Utc)))
                .collect(),
            last_appointments_found_on: self.last_slots_found_at.map(wire_time),
        }
    }

    /// Serialize the wire message to a JSON string.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.to_wire())
    }
}

/// JSON message pushed to every subscriber
///
/// `message` and `lastAppointmentsFoundOn` are always emitted, possibly as
/// null; subscribers rely on the fixed shape.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    pub time: String,
    pub status: u16,
    pub message: Option<String>,
    pub appointment_dates: Vec<String>,
    pub last_appointments_found_on: Option<String>,
}

fn wire_time(instant: DateTime<Utc>) -> String {
    instant.format(WIRE_TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn berlin(ts: i64) -> DateTime<Tz> {
        CALENDAR_TZ.timestamp_opt(ts, 0).unwrap()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(SnapshotStatus::Ok.code(), 200);
        assert_eq!(SnapshotStatus::UpstreamError.code(), 502);
        assert_eq!(SnapshotStatus::ConnectionError.code(), 502);
        assert_eq!(SnapshotStatus::TimeoutError.code(), 504);
        assert_eq!(SnapshotStatus::UnknownError.code(), 500);
    }

    #[test]
    fn test_ok_sorts_and_dedups() {
        let snapshot = Snapshot::ok(vec![berlin(2000), berlin(1000), berlin(2000)], None);
        assert_eq!(snapshot.slots, vec![berlin(1000), berlin(2000)]);
        assert_eq!(snapshot.last_slots_found_at, Some(snapshot.observed_at));
    }

    #[test]
    fn test_empty_ok_carries_found_marker() {
        let earlier = Utc::now();
        let snapshot = Snapshot::ok(Vec::new(), Some(earlier));
        assert_eq!(snapshot.last_slots_found_at, Some(earlier));
        assert!(snapshot.message.is_none());
    }

    #[test]
    fn test_failure_has_no_slots() {
        let snapshot = Snapshot::failure(
            SnapshotStatus::UpstreamError,
            "Could not fetch results from Berlin.de - Got HTTP 503.",
            None,
        );
        assert!(snapshot.slots.is_empty());
        assert!(snapshot.message.as_deref().unwrap().contains("503"));
    }

    #[test]
    fn test_wire_message_shape() {
        // 2022-01-03 09:00 Berlin = 08:00 UTC
        let slot = CALENDAR_TZ.with_ymd_and_hms(2022, 1, 3, 9, 0, 0).unwrap();
        let snapshot = Snapshot::ok(vec![slot], None);
        let json = snapshot.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["status"], 200);
        assert_eq!(value["message"], serde_json::Value::Null);
        assert_eq!(value["appointmentDates"][0], "2022-01-03T08:00:00Z");
        assert!(value["lastAppointmentsFoundOn"].is_string());
        assert!(value["time"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_wire_message_emits_null_fields() {
        let json = Snapshot::initial().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.as_object().unwrap().contains_key("message"));
        assert!(value
            .as_object()
            .unwrap()
            .contains_key("lastAppointmentsFoundOn"));
        assert_eq!(value["lastAppointmentsFoundOn"], serde_json::Value::Null);
    }
}
