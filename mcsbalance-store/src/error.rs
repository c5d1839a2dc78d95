//! Store error types.

use thiserror::Error;

/// Errors that can occur in the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Registering or encoding metrics failed.
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// The encoded exposition is not valid UTF-8.
    #[error("Encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}
