//! Shared data model and domain error taxonomy for the ad delivery core.
//!
//! This crate has no I/O and no async runtime dependency: it exists so that
//! `ads-store`, `ads-runner`, `ads-persist`, `ads-stream`, and `ads-service`
//! all agree on one definition of `Ad`, `Version`, `AdId`, and `AdError`.

mod ad;
mod error;
mod id;
mod query;
mod version;

pub use ad::{Ad, AdValidationError};
pub use error::AdError;
pub use id::{AdId, RequestId};
pub use query::GetAdsQuery;
pub use version::Version;
