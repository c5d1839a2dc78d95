//! Session manager.
//!
//! Owns the authentication state: whether sign-in succeeded, the session
//! cookies, and the project list that came with it. Sign-in is lazy and
//! single-flight: an atomic flag answers the common case without locking,
//! and the slow path re-checks the flag under an async mutex so concurrent
//! callers produce at most one sign-in exchange.
//!
//! Once authenticated the session stays authenticated for the life of the
//! process.

use std::sync::atomic::{AtomicBool, Ordering};

use mcsbalance_core::{Credentials, Project};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};

use crate::api::{Endpoints, SigninRequest, SigninResponse};
use crate::client::{HttpClient, ResponseExt};
use crate::error::AuthError;

/// State written once by a successful sign-in.
#[derive(Default)]
struct SessionState {
    cookies: String,
    projects: Vec<Project>,
}

/// Lazily authenticated MCS session.
pub struct SessionManager {
    http: HttpClient,
    endpoints: Endpoints,
    credentials: Credentials,
    authenticated: AtomicBool,
    auth_lock: Mutex<()>,
    state: RwLock<SessionState>,
}

impl SessionManager {
    /// Creates an unauthenticated session.
    pub fn new(http: HttpClient, endpoints: Endpoints, credentials: Credentials) -> Self {
        Self {
            http,
            endpoints,
            credentials,
            authenticated: AtomicBool::new(false),
            auth_lock: Mutex::new(()),
            state: RwLock::new(SessionState::default()),
        }
    }

    /// Returns true once sign-in has succeeded.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::Acquire)
    }

    /// Returns the projects resolved at sign-in, in API order.
    ///
    /// Empty until the session is authenticated.
    pub async fn projects(&self) -> Vec<Project> {
        if !self.is_authenticated() {
            return Vec::new();
        }
        self.state.read().await.projects.clone()
    }

    /// Returns the `Cookie` header value to echo on API requests.
    ///
    /// `None` until the session is authenticated.
    pub async fn cookie_header(&self) -> Option<String> {
        if !self.is_authenticated() {
            return None;
        }
        Some(self.state.read().await.cookies.clone())
    }

    /// Signs in unless the session is already authenticated.
    ///
    /// Idempotent and safe to call from several tasks at once: only the
    /// first caller to take the lock talks to the API, the rest observe its
    /// result. After a failure the next call tries again.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] on transport failure, a non-success status, or
    /// a malformed response body.
    pub async fn ensure_authenticated(&self) -> Result<(), AuthError> {
        if self.is_authenticated() {
            return Ok(());
        }

        let _guard = self.auth_lock.lock().await;
        if self.is_authenticated() {
            debug!("Session authenticated by a concurrent caller");
            return Ok(());
        }

        let state = self.authenticate().await?;
        info!(projects = state.projects.len(), "Signed in to MCS");

        *self.state.write().await = state;
        self.authenticated.store(true, Ordering::Release);
        Ok(())
    }

    /// Performs one sign-in exchange.
    #[instrument(skip(self))]
    async fn authenticate(&self) -> Result<SessionState, AuthError> {
        let body = SigninRequest {
            email: self.credentials.login(),
            password: self.credentials.password(),
        };

        let response = self.http.post_json(&self.endpoints.signin(), &body).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Status(status));
        }

        let cookies = response.session_cookies();
        let bytes = response.bytes().await?;
        let signin: SigninResponse = serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        let projects = signin.into_projects();
        debug!(?projects, "Resolved projects");

        Ok(SessionState { cookies, projects })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};
    use std::time::Duration;

    const SIGNIN_BODY: &str = r#"{
        "uid": "u1",
        "projects": [
            {"pid": "p1", "title": "Alpha"},
            {"pid": "p2", "title": "Beta"}
        ]
    }"#;

    fn session_for(server: &ServerGuard) -> SessionManager {
        SessionManager::new(
            HttpClient::with_timeout(Duration::from_secs(2)).unwrap(),
            Endpoints::new(&server.url()).unwrap(),
            Credentials::new("me@example.com", "hunter2"),
        )
    }

    #[tokio::test]
    async fn test_sign_in_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/signin")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(serde_json::json!({
                "email": "me@example.com",
                "password": "hunter2"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header("set-cookie", "sid=abc123; Path=/; HttpOnly")
            .with_body(SIGNIN_BODY)
            .expect(1)
            .create_async()
            .await;

        let session = session_for(&server);
        assert!(!session.is_authenticated());
        assert!(session.projects().await.is_empty());
        assert_eq!(session.cookie_header().await, None);

        session.ensure_authenticated().await.unwrap();

        mock.assert_async().await;
        assert!(session.is_authenticated());
        assert_eq!(
            session.projects().await,
            vec![Project::new("p1", "Alpha"), Project::new("p2", "Beta")]
        );
        assert_eq!(session.cookie_header().await.as_deref(), Some("sid=abc123"));
    }

    #[tokio::test]
    async fn test_already_authenticated_skips_network() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/signin")
            .with_status(200)
            .with_body(SIGNIN_BODY)
            .expect(1)
            .create_async()
            .await;

        let session = session_for(&server);
        session.ensure_authenticated().await.unwrap();
        session.ensure_authenticated().await.unwrap();
        session.ensure_authenticated().await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_concurrent_callers_sign_in_once() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/signin")
            .with_status(200)
            .with_body(SIGNIN_BODY)
            .expect(1)
            .create_async()
            .await;

        let session = session_for(&server);
        let results =
            futures::future::join_all((0..8).map(|_| session.ensure_authenticated())).await;

        assert!(results.iter().all(Result::is_ok));
        mock.assert_async().await;
        assert_eq!(session.projects().await.len(), 2);
    }

    #[tokio::test]
    async fn test_unauthorized_leaves_session_empty() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/signin")
            .with_status(401)
            .with_body(r#"{"error": "bad credentials"}"#)
            .expect(2)
            .create_async()
            .await;

        let session = session_for(&server);
        let err = session.ensure_authenticated().await.unwrap_err();
        assert!(matches!(err, AuthError::Status(s) if s.as_u16() == 401));
        assert!(!session.is_authenticated());
        assert!(session.projects().await.is_empty());

        // The lock was released and a later call tries again.
        assert!(session.ensure_authenticated().await.is_err());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/signin")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let session = session_for(&server);
        let err = session.ensure_authenticated().await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidResponse(_)));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_retry_after_failure_succeeds() {
        let mut server = Server::new_async().await;
        let failing = server
            .mock("POST", "/auth/signin")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let session = session_for(&server);
        assert!(session.ensure_authenticated().await.is_err());
        failing.assert_async().await;
        failing.remove_async().await;

        server
            .mock("POST", "/auth/signin")
            .with_status(200)
            .with_body(SIGNIN_BODY)
            .create_async()
            .await;

        session.ensure_authenticated().await.unwrap();
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let session = SessionManager::new(
            HttpClient::with_timeout(Duration::from_millis(500)).unwrap(),
            Endpoints::new("http://127.0.0.1:1").unwrap(),
            Credentials::new("me@example.com", "hunter2"),
        );

        let err = session.ensure_authenticated().await.unwrap_err();
        assert!(matches!(err, AuthError::Http(_)));
        assert!(!session.is_authenticated());
    }
}
