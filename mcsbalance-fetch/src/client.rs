//! HTTP client adapter.
//!
//! A thin wrapper around [`reqwest::Client`] that adds:
//! - A fixed per-request timeout
//! - The JSON accept headers the MCS API expects
//! - Request/response tracing
//!
//! It never retries. Retrying is the polling loop's job.

use reqwest::{
    Client, Response,
    header::{self, HeaderMap, HeaderValue},
};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// User agent string for the exporter.
const USER_AGENT: &str = concat!("mcs-balance-exporter/", env!("CARGO_PKG_VERSION"));

/// Accept header sent with every request.
const ACCEPT: &str = "application/json, text/javascript, */*; q=0.01";

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client with a fixed timeout.
///
/// Clone is cheap: the inner client shares one connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Creates a client with [`DEFAULT_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a client whose requests each time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialized.
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));

        let inner = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self { inner, timeout })
    }

    /// Returns the per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Performs a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns the transport error, including timeouts.
    #[instrument(skip(self, body), fields(url = %url))]
    pub async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        url: &Url,
        body: &T,
    ) -> Result<Response, reqwest::Error> {
        debug!("POST request with JSON");

        let response = self.inner.post(url.clone()).json(body).send().await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Performs a GET request carrying a `Cookie` header.
    ///
    /// # Errors
    ///
    /// Returns the transport error, including timeouts.
    #[instrument(skip(self, cookies), fields(url = %url))]
    pub async fn get_with_cookies(
        &self,
        url: &Url,
        cookies: &str,
    ) -> Result<Response, reqwest::Error> {
        debug!("GET request with cookies");

        let mut request = self
            .inner
            .get(url.clone())
            .header(header::CONTENT_TYPE, "application/json");
        if !cookies.is_empty() {
            request = request.header(header::COOKIE, cookies);
        }

        let response = request.send().await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }
}

// ============================================================================
// Response Extensions
// ============================================================================

/// Extension trait for Response handling.
pub trait ResponseExt {
    /// Collects the `Set-Cookie` name/value pairs into one `Cookie` header
    /// value, dropping attributes such as `Path` or `HttpOnly`.
    fn session_cookies(&self) -> String;
}

impl ResponseExt for Response {
    fn session_cookies(&self) -> String {
        cookie_header(self.headers())
    }
}

fn cookie_header(headers: &HeaderMap) -> String {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('='))
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_header_strips_attributes() {
        let mut headers = HeaderMap::new();
        headers.append(
            header::SET_COOKIE,
            HeaderValue::from_static("sid=jh6GNCV5J3A5VDce9GQYZ9; Path=/; HttpOnly"),
        );
        headers.append(
            header::SET_COOKIE,
            HeaderValue::from_static("csrf=abc; Secure"),
        );

        assert_eq!(cookie_header(&headers), "sid=jh6GNCV5J3A5VDce9GQYZ9; csrf=abc");
    }

    #[test]
    fn test_cookie_header_empty() {
        assert_eq!(cookie_header(&HeaderMap::new()), "");
    }

    #[test]
    fn test_cookie_header_skips_garbage() {
        let mut headers = HeaderMap::new();
        headers.append(header::SET_COOKIE, HeaderValue::from_static("garbage"));
        headers.append(header::SET_COOKIE, HeaderValue::from_static("a=1"));

        assert_eq!(cookie_header(&headers), "a=1");
    }

    #[test]
    fn test_timeout_is_kept() {
        let client = HttpClient::with_timeout(Duration::from_millis(500)).unwrap();
        assert_eq!(client.timeout(), Duration::from_millis(500));
        assert_eq!(HttpClient::new().unwrap().timeout(), DEFAULT_TIMEOUT);
    }
}
