//! HTTP fetch layer for the appointment calendar
//!
//! The rest of the crate depends only on the [`Fetch`] trait: one method,
//! URL and timeout in, page text or a classified [`FetchError`] out. The
//! reqwest-backed [`HttpFetcher`] is the production implementation; a
//! headless-browser one could be swapped in behind the same trait without
//! touching the scanner, scheduler, or parser.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::crawler::headers::build_booking_headers;
use crate::error::FetchError;

/// Abstract fetch capability
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Retrieve the raw content of `url`, giving up after `timeout`.
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;
}

/// Plain HTTP fetcher over a persistent reqwest client
///
/// Keeps cookies across requests within one process because Berlin.de's
/// booking flow sets a session cookie on the first page.
pub struct HttpFetcher {
    client: Client,
    user_agent: String,
}

impl HttpFetcher {
    /// Create a fetcher sending the given user agent on every request.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Client` if the HTTP client cannot be created.
    pub fn new(user_agent: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder().gzip(true).cookie_store(true).build()?;

        Ok(Self {
            client,
            user_agent: user_agent.into(),
        })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let headers = build_booking_headers(&self.user_agent);

        let response = self
            .client
            .get(url)
            .headers(headers)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Upstream {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.text().await.map_err(classify_transport_error)
    }
}

/// Map a reqwest error onto the fetch taxonomy.
fn classify_transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if err.is_connect() {
        FetchError::Connection(err.to_string())
    } else {
        FetchError::Client(err)
    }
}
