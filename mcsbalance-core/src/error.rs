//! Core error types.

use thiserror::Error;

/// Configuration error raised while the exporter starts up.
///
/// These are fatal: the process exits before it starts serving.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("environment \"{0}\" is not set")]
    MissingEnv(&'static str),

    /// A setting has an unusable value.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
