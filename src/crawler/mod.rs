//! Fetching and poll-cycle orchestration
//!
//! - [`fetcher`] - the abstract fetch capability and its HTTP implementation
//! - [`headers`] - request headers, including the mandated identifying UA
//! - [`pipeline`] - the two-page calendar scan that feeds the scheduler

pub mod fetcher;
pub mod headers;
pub mod pipeline;

pub use fetcher::{Fetch, HttpFetcher};
pub use pipeline::CalendarScanner;
