//! Account credentials.

use std::fmt;

use crate::error::ConfigError;

/// Environment variable holding the account login.
pub const LOGIN_ENV: &str = "MCS_LOGIN";

/// Environment variable holding the account password.
pub const PASSWORD_ENV: &str = "MCS_PASSWORD";

/// Login and password for the billing API.
///
/// Immutable once loaded. `Debug` never prints either value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    login: String,
    password: String,
}

impl Credentials {
    /// Creates credentials from explicit values.
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }

    /// Loads credentials from `MCS_LOGIN` and `MCS_PASSWORD`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnv`] naming the first unset variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads credentials through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnv`] naming the first missing variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let login = lookup(LOGIN_ENV).ok_or(ConfigError::MissingEnv(LOGIN_ENV))?;
        let password = lookup(PASSWORD_ENV).ok_or(ConfigError::MissingEnv(PASSWORD_ENV))?;
        Ok(Self { login, password })
    }

    /// Returns the login (the account e-mail).
    pub fn login(&self) -> &str {
        &self.login
    }

    /// Returns the password.
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &"<redacted>")
            .field("password", &"<redacted>")
            .finish()
    }
}
