//! The write pipeline, replay subscriber, and lifecycle façade tying the ad
//! delivery core together.
//!
//! `AdService` is the composition root `ads-daemon` talks to: it owns the
//! relational write-of-record (`ads-persist`), the cross-replica lock and
//! event stream (`ads-stream`), and reaches the in-memory catalog
//! (`ads-store`) only through a single [`ads_runner::RunnerHandle`].

mod config;
mod replay;
mod service;
mod stream_envelope;

pub use config::AdServiceConfig;
pub use service::AdService;
