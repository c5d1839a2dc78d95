//! Credential redaction for log and error text.

use crate::models::Credentials;

/// Placeholder written in place of the login.
pub const LOGIN_PLACEHOLDER: &str = "<mcs-login>";

/// Placeholder written in place of the password.
pub const PASSWORD_PLACEHOLDER: &str = "<mcs-password>";

/// Replaces credential substrings in diagnostic text.
///
/// Built once from the loaded [`Credentials`] and handed to whatever emits
/// logs, so secrets never have to travel with the errors themselves.
#[derive(Clone)]
pub struct Redactor {
    // Longest secret first, so a secret containing the other is fully replaced.
    secrets: Vec<(String, &'static str)>,
}

impl Redactor {
    /// Creates a redactor for the given credentials.
    pub fn new(credentials: &Credentials) -> Self {
        let mut secrets: Vec<(String, &'static str)> = [
            (credentials.login(), LOGIN_PLACEHOLDER),
            (credentials.password(), PASSWORD_PLACEHOLDER),
        ]
        .into_iter()
        .filter(|(secret, _)| !secret.is_empty())
        .map(|(secret, placeholder)| (secret.to_string(), placeholder))
        .collect();
        secrets.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        Self { secrets }
    }

    /// Returns `text` with every credential occurrence replaced.
    pub fn redact(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (secret, placeholder) in &self.secrets {
            if out.contains(secret.as_str()) {
                out = out.replace(secret.as_str(), placeholder);
            }
        }
        out
    }

    /// Formats an error chain (`error: cause: cause`) and redacts it.
    pub fn redact_error(&self, error: &(dyn std::error::Error + 'static)) -> String {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        self.redact(&message)
    }
}

impl std::fmt::Debug for Redactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Redactor")
            .field("secrets", &self.secrets.len())
            .finish()
    }
}
