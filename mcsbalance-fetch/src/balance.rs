//! Balance fetcher.

use tracing::{debug, instrument};

use crate::api::{BillingResponse, Endpoints};
use crate::client::HttpClient;
use crate::error::FetchError;
use crate::session::SessionManager;

/// Reads one project's balance per call.
///
/// Does not sign in: the caller makes sure the session is authenticated
/// first. Does not retry.
#[derive(Debug, Clone)]
pub struct BalanceFetcher {
    http: HttpClient,
    endpoints: Endpoints,
}

impl BalanceFetcher {
    /// Creates a fetcher.
    pub fn new(http: HttpClient, endpoints: Endpoints) -> Self {
        Self { http, endpoints }
    }

    /// Fetches the balance of `project_id` using the session's cookies.
    ///
    /// # Errors
    ///
    /// - [`FetchError::NotAuthenticated`] if the session has not signed in
    /// - [`FetchError::Http`] on transport failure or timeout
    /// - [`FetchError::Status`] on a non-success status
    /// - [`FetchError::InvalidResponse`] / [`FetchError::InvalidBalance`]
    ///   if the body cannot be read as a balance
    #[instrument(skip(self, session))]
    pub async fn fetch_balance(
        &self,
        session: &SessionManager,
        project_id: &str,
    ) -> Result<f64, FetchError> {
        let cookies = session
            .cookie_header()
            .await
            .ok_or(FetchError::NotAuthenticated)?;

        let response = self
            .http
            .get_with_cookies(&self.endpoints.billing(project_id), &cookies)
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let bytes = response.bytes().await?;
        let billing: BillingResponse = serde_json::from_slice(&bytes)
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;

        let balance = billing.parse_balance()?;
        debug!(balance, currency = billing.currency.as_deref(), "Balance received");
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcsbalance_core::Credentials;
    use mockito::{Server, ServerGuard};
    use std::time::Duration;

    async fn signed_in(server: &mut ServerGuard, timeout: Duration) -> (SessionManager, BalanceFetcher) {
        server
            .mock("POST", "/auth/signin")
            .with_status(200)
            .with_header("set-cookie", "sid=abc123; Path=/")
            .with_body(r#"{"projects": [{"pid": "p1", "title": "Alpha"}]}"#)
            .create_async()
            .await;

        let http = HttpClient::with_timeout(timeout).unwrap();
        let endpoints = Endpoints::new(&server.url()).unwrap();
        let session = SessionManager::new(
            http.clone(),
            endpoints.clone(),
            Credentials::new("me@example.com", "hunter2"),
        );
        session.ensure_authenticated().await.unwrap();
        (session, BalanceFetcher::new(http, endpoints))
    }

    #[tokio::test]
    async fn test_fetch_echoes_cookies() {
        let mut server = Server::new_async().await;
        let (session, fetcher) = signed_in(&mut server, Duration::from_secs(2)).await;

        let mock = server
            .mock("GET", "/projects/p1/billing")
            .match_header("cookie", "sid=abc123")
            .with_status(200)
            .with_body(r#"{"balance": "12.50", "currency": "RUB", "pid": "p1"}"#)
            .expect(1)
            .create_async()
            .await;

        let balance = fetcher.fetch_balance(&session, "p1").await.unwrap();
        assert_eq!(balance, 12.5);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_requires_authenticated_session() {
        let server = Server::new_async().await;
        let http = HttpClient::new().unwrap();
        let endpoints = Endpoints::new(&server.url()).unwrap();
        let session = SessionManager::new(
            http.clone(),
            endpoints.clone(),
            Credentials::new("me@example.com", "hunter2"),
        );
        let fetcher = BalanceFetcher::new(http, endpoints);

        let err = fetcher.fetch_balance(&session, "p1").await.unwrap_err();
        assert!(matches!(err, FetchError::NotAuthenticated));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_unauthorized_status_is_plain_fetch_error() {
        let mut server = Server::new_async().await;
        let (session, fetcher) = signed_in(&mut server, Duration::from_secs(2)).await;

        server
            .mock("GET", "/projects/p1/billing")
            .with_status(401)
            .create_async()
            .await;

        let err = fetcher.fetch_balance(&session, "p1").await.unwrap_err();
        assert!(err.is_unauthorized());
        // The session is kept.
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_unparseable_balance() {
        let mut server = Server::new_async().await;
        let (session, fetcher) = signed_in(&mut server, Duration::from_secs(2)).await;

        server
            .mock("GET", "/projects/p1/billing")
            .with_status(200)
            .with_body(r#"{"balance": "n/a"}"#)
            .create_async()
            .await;

        let err = fetcher.fetch_balance(&session, "p1").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidBalance(ref raw) if raw == "n/a"));
    }

    #[tokio::test]
    async fn test_missing_balance_field() {
        let mut server = Server::new_async().await;
        let (session, fetcher) = signed_in(&mut server, Duration::from_secs(2)).await;

        server
            .mock("GET", "/projects/p1/billing")
            .with_status(200)
            .with_body(r#"{"error_code": 42, "error": "nope"}"#)
            .create_async()
            .await;

        let err = fetcher.fetch_balance(&session, "p1").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_fetch_error() {
        use std::io::Write;

        let mut server = Server::new_async().await;
        let (session, fetcher) = signed_in(&mut server, Duration::from_millis(200)).await;

        server
            .mock("GET", "/projects/p1/billing")
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_millis(1000));
                w.write_all(br#"{"balance": "1.00"}"#)
            })
            .create_async()
            .await;

        let err = fetcher.fetch_balance(&session, "p1").await.unwrap_err();
        assert!(err.is_timeout(), "expected timeout, got {err:?}");
    }
}
