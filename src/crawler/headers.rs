//! Request headers for Berlin.de booking pages

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONNECTION,
    USER_AGENT,
};

/// Build the identifying user agent Berlin.de's IKT-ZMS team requires:
/// tool name and version, project URL, operator contact, deployment id.
///
/// # Examples
///
/// ```
/// use terminwatch::crawler::headers::booking_user_agent;
///
/// let ua = booking_user_agent("me@example.com", "my-watcher");
/// assert!(ua.contains("me@example.com"));
/// assert!(ua.contains("my-watcher"));
/// ```
pub fn booking_user_agent(email: &str, script_id: &str) -> String {
    format!(
        "Mozilla/5.0 AppointmentBookingTool/{} (https://github.com/terminwatch/terminwatch; {email}; {script_id})",
        env!("CARGO_PKG_VERSION")
    )
}

/// Build browser-like headers for booking-page requests.
///
/// # Examples
///
/// ```
/// use terminwatch::crawler::headers::build_booking_headers;
///
/// let headers = build_booking_headers("Mozilla/5.0 AppointmentBookingTool/0.2.0");
/// assert!(headers.contains_key(reqwest::header::USER_AGENT));
/// ```
pub fn build_booking_headers(user_agent: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();

    if let Ok(value) = HeaderValue::from_str(user_agent) {
        headers.insert(USER_AGENT, value);
    }
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-gb"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        HeaderName::from_static("upgrade-insecure-requests"),
        HeaderValue::from_static("1"),
    );

    headers
}
