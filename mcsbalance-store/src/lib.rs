// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # MCS Balance Store
//!
//! Holds the last known balance of every project and renders it as
//! Prometheus text exposition.
//!
//! ## Usage
//!
//! ```ignore
//! use mcsbalance_store::BalanceGauges;
//!
//! let gauges = BalanceGauges::new()?;
//! gauges.set("Alpha", 12.5);
//! let body = gauges.render()?;
//! ```

pub mod error;
pub mod gauges;

pub use error::StoreError;
pub use gauges::{BalanceGauges, METRIC_NAME, PROJECT_LABEL};
