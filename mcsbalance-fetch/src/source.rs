//! The seam between the polling loop and the billing API.

use std::time::Duration;

use async_trait::async_trait;
use mcsbalance_core::{Credentials, Project};

use crate::api::Endpoints;
use crate::balance::BalanceFetcher;
use crate::client::HttpClient;
use crate::error::{AuthError, FetchError};
use crate::session::SessionManager;

// ============================================================================
// Balance Source Trait
// ============================================================================

/// Something the polling loop can read balances from.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Makes sure a session exists, signing in if needed.
    async fn ensure_authenticated(&self) -> Result<(), AuthError>;

    /// Returns the known projects in a stable order.
    async fn projects(&self) -> Vec<Project>;

    /// Fetches one project's balance. Requires an authenticated session.
    async fn fetch_balance(&self, project_id: &str) -> Result<f64, FetchError>;
}

// ============================================================================
// MCS Client
// ============================================================================

/// [`SessionManager`] and [`BalanceFetcher`] sharing one HTTP client.
pub struct McsClient {
    session: SessionManager,
    fetcher: BalanceFetcher,
}

impl McsClient {
    /// Creates a client whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new(
        credentials: Credentials,
        endpoints: Endpoints,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = HttpClient::with_timeout(timeout)?;
        Ok(Self {
            session: SessionManager::new(http.clone(), endpoints.clone(), credentials),
            fetcher: BalanceFetcher::new(http, endpoints),
        })
    }

    /// Returns the session manager.
    pub fn session(&self) -> &SessionManager {
        &self.session
    }
}

#[async_trait]
impl BalanceSource for McsClient {
    async fn ensure_authenticated(&self) -> Result<(), AuthError> {
        self.session.ensure_authenticated().await
    }

    async fn projects(&self) -> Vec<Project> {
        self.session.projects().await
    }

    async fn fetch_balance(&self, project_id: &str) -> Result<f64, FetchError> {
        self.fetcher.fetch_balance(&self.session, project_id).await
    }
}
