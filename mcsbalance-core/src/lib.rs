// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # MCS Balance Core
//!
//! Core types shared by the MCS balance exporter crates.
//!
//! - [`Credentials`] - Login/password pair loaded from the environment
//! - [`Project`] - A billing project visible to the account
//! - [`Redactor`] - Scrubs credentials out of diagnostic text
//! - [`ConfigError`] - Startup configuration failures

pub mod error;
pub mod models;
pub mod redact;

pub use error::ConfigError;
pub use models::{Credentials, LOGIN_ENV, PASSWORD_ENV, Project};
pub use redact::Redactor;
