//! Domain models for the exporter.
//!
//! - [`credentials`] - Account credentials
//! - [`project`] - Billing projects

mod credentials;
mod project;

pub use credentials::{Credentials, LOGIN_ENV, PASSWORD_ENV};
pub use project::Project;
