//! MCS API endpoints and wire records.

use mcsbalance_core::{ConfigError, Project};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::FetchError;

// ============================================================================
// Constants
// ============================================================================

/// Default MCS API base URL.
pub const DEFAULT_API_URL: &str = "https://mcs.mail.ru/api/v1";

// ============================================================================
// Endpoints
// ============================================================================

/// Resolved API endpoints under one base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    /// Creates endpoints under `base`, e.g. `https://mcs.mail.ru/api/v1`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `base` is not an absolute
    /// hierarchical URL.
    pub fn new(base: &str) -> Result<Self, ConfigError> {
        let base = Url::parse(base)
            .map_err(|e| ConfigError::Invalid(format!("API URL {base:?}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ConfigError::Invalid(format!(
                "API URL {base} cannot be used as a base"
            )));
        }
        Ok(Self { base })
    }

    /// Returns the base URL.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Sign-in endpoint: `{base}/auth/signin`.
    pub fn signin(&self) -> Url {
        self.join(&["auth", "signin"])
    }

    /// Billing endpoint of one project: `{base}/projects/{id}/billing`.
    ///
    /// The id is percent-encoded as a single path segment.
    pub fn billing(&self, project_id: &str) -> Url {
        self.join(&["projects", project_id, "billing"])
    }

    fn join(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // cannot_be_a_base was rejected in `new`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            base: Url::parse(DEFAULT_API_URL).unwrap_or_else(|e| {
                panic!("built-in API URL {DEFAULT_API_URL} is invalid: {e}")
            }),
        }
    }
}

// ============================================================================
// Sign-in
// ============================================================================

/// Body of the sign-in request.
#[derive(Serialize)]
pub struct SigninRequest<'a> {
    /// Account login.
    pub email: &'a str,
    /// Account password.
    pub password: &'a str,
}

/// Response of the sign-in request.
///
/// Only `projects` is required; the rest is informational.
#[derive(Debug, Deserialize)]
pub struct SigninResponse {
    /// Projects the account can access, in API order.
    pub projects: Vec<SigninProject>,

    /// Account id.
    #[serde(default)]
    pub uid: Option<String>,

    /// Account display name.
    #[serde(default)]
    pub name: Option<String>,

    /// Whether the account is postpaid.
    #[serde(default)]
    pub postpaid: Option<bool>,
}

/// One project entry of the sign-in response.
#[derive(Debug, Deserialize)]
pub struct SigninProject {
    /// Project id.
    pub pid: String,

    /// Project title.
    #[serde(default)]
    pub title: String,

    /// Whether the project is enabled.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Roles the account holds in the project.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl SigninResponse {
    /// Converts the entries to projects, keeping the response order.
    ///
    /// An empty title falls back to the project id so the metric label is
    /// never blank.
    pub fn into_projects(self) -> Vec<Project> {
        self.projects
            .into_iter()
            .map(|p| {
                let title = if p.title.trim().is_empty() {
                    p.pid.clone()
                } else {
                    p.title
                };
                Project::new(p.pid, title)
            })
            .collect()
    }
}

// ============================================================================
// Billing
// ============================================================================

/// Response of a project's billing request.
#[derive(Debug, Deserialize)]
pub struct BillingResponse {
    /// Balance as a decimal string, e.g. `"12.50"`.
    pub balance: String,

    /// Currency code.
    #[serde(default)]
    pub currency: Option<String>,

    /// Project id echoed by the API.
    #[serde(default)]
    pub pid: Option<String>,

    /// Whether the project is postpaid.
    #[serde(default)]
    pub postpaid: Option<bool>,
}

impl BillingResponse {
    /// Parses the balance string.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidBalance`] unless the value is a finite
    /// decimal number.
    pub fn parse_balance(&self) -> Result<f64, FetchError> {
        let value: f64 = self
            .balance
            .trim()
            .parse()
            .map_err(|_| FetchError::InvalidBalance(self.balance.clone()))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(FetchError::InvalidBalance(self.balance.clone()))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
