//! terminwatch - Berlin Bürgeramt appointment watcher
//!
//! Watches the Berlin.de appointment calendar for newly bookable dates and
//! republishes the current availability state to websocket subscribers.
//! The upstream offers no API or push channel; the only way to learn about
//! availability is to fetch and re-parse a page made for humans, forever.
//!
//! # Architecture
//!
//! - [`config`] - Configuration loading and validation
//! - [`crawler`] - Fetch capability and the two-page calendar scan
//! - [`parser`] - Bookable-date and booking-link extraction
//! - [`scheduler`] - The poll loop, failure classification, and backoff
//! - [`server`] - Websocket fan-out of published snapshots
//! - [`models`] - Snapshot data model and wire serialization
//! - [`notifications`] - Audible operator signal
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use terminwatch::crawler::{CalendarScanner, HttpFetcher};
//! use terminwatch::crawler::headers::booking_user_agent;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ua = booking_user_agent("me@example.com", "my-watcher");
//!     let fetcher = Arc::new(HttpFetcher::new(ua)?);
//!     let scanner = CalendarScanner::resolve(
//!         fetcher,
//!         "https://service.berlin.de/dienstleistung/120686/",
//!         Duration::from_secs(20),
//!     )
//!     .await?;
//!     let slots = scanner.scan().await?;
//!     println!("{} bookable dates", slots.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod error;
pub mod models;
pub mod notifications;
pub mod parser;
pub mod scheduler;
pub mod server;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::crawler::{CalendarScanner, Fetch, HttpFetcher};
    pub use crate::error::{Error, FetchError, ParseError, Result};
    pub use crate::models::{Snapshot, SnapshotStatus, WireMessage};
    pub use crate::scheduler::PollLoop;
    pub use crate::server::Hub;
}

// Direct re-exports for convenience
pub use models::{Snapshot, SnapshotStatus};
