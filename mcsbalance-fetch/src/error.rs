//! Error types for sign-in and balance requests.

use reqwest::StatusCode;
use thiserror::Error;

// ============================================================================
// Auth Error
// ============================================================================

/// Sign-in failure.
///
/// Always recoverable: the session stays unauthenticated and the next
/// polling cycle tries again.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Transport failure, including the request timeout.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("auth response status code is not 200, but - {0}")]
    Status(StatusCode),

    /// The response body is not a valid sign-in response.
    #[error("invalid auth response: {0}")]
    InvalidResponse(String),
}

impl AuthError {
    /// Returns true if the request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AuthError::Http(e) if e.is_timeout())
    }
}

// ============================================================================
// Fetch Error
// ============================================================================

/// Balance request failure.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure, including the request timeout.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("balance response status code is not 200, but - {0}")]
    Status(StatusCode),

    /// The response body is not a valid billing response.
    #[error("invalid balance response: {0}")]
    InvalidResponse(String),

    /// The `balance` field is not a finite decimal number.
    #[error("unparseable balance: {0:?}")]
    InvalidBalance(String),

    /// No session cookies are available yet.
    #[error("session is not authenticated")]
    NotAuthenticated,
}

impl FetchError {
    /// Returns true if the request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Http(e) if e.is_timeout())
    }

    /// Returns true if the API rejected the session.
    ///
    /// Callers currently treat this like any other failure; the session is
    /// not invalidated.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            FetchError::Status(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        )
    }
}
