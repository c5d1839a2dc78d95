// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # MCS Balance Fetch
//!
//! Talks to the MCS billing API.
//!
//! ## Layers
//!
//! - [`client::HttpClient`] - Outbound requests with a fixed timeout, no retries
//! - [`session::SessionManager`] - Lazy, single-flight sign-in and session cookies
//! - [`balance::BalanceFetcher`] - One billing request per project
//! - [`source::McsClient`] - Both of the above behind the [`BalanceSource`] trait
//!
//! ## Example
//!
//! ```ignore
//! use mcsbalance_core::Credentials;
//! use mcsbalance_fetch::{BalanceSource, Endpoints, McsClient};
//!
//! let client = McsClient::new(credentials, Endpoints::default(), timeout)?;
//! client.ensure_authenticated().await?;
//! for project in client.projects().await {
//!     let balance = client.fetch_balance(&project.id).await?;
//! }
//! ```

pub mod api;
pub mod balance;
pub mod client;
pub mod error;
pub mod session;
pub mod source;

pub use api::{BillingResponse, DEFAULT_API_URL, Endpoints, SigninResponse};
pub use balance::BalanceFetcher;
pub use client::{DEFAULT_TIMEOUT, HttpClient, ResponseExt};
pub use error::{AuthError, FetchError};
pub use session::SessionManager;
pub use source::{BalanceSource, McsClient};
