//! The in-memory, multi-index ad catalog.
//!
//! Owned exclusively by the runner ([`ads_runner`]); nothing in this crate
//! spawns tasks or touches a clock source other than what's passed in or
//! `Utc::now()` at the single call site `Store::get_ads` delegates to.

mod interval;
mod store;

pub use interval::IntervalIndex;
pub use store::Store;
