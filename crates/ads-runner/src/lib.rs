//! The single-writer request serializer.
//!
//! `ads-runner` is the only crate that is allowed to mutate an
//! [`ads_store::Store`]: [`Runner::run`] drains a request channel on one
//! task and routes each response back to a per-request reply channel via
//! [`ResponseRegistry`], giving the store strict serial write semantics
//! without a write lock on the hot path.

mod envelope;
mod registry;
mod runner;

pub use envelope::{
    CreateAdRequest, CreateAdResponse, CreateBatchAdRequest, GetAdRequest, GetAdResponse,
    RunnerRequest, RunnerResponse,
};
pub use registry::ResponseRegistry;
pub use runner::{new_runner, new_runner_with_capacity, Runner, RunnerHandle, DEFAULT_CHANNEL_CAPACITY};
