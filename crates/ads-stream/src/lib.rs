//! Cross-replica coordination for the ad delivery core's write pipeline:
//! a distributed lock guarding the critical section, and an event stream
//! replicas subscribe to for replay.

mod error;
mod fakes;
mod lock;
mod redis_lock;
mod redis_stream;
mod stream;

pub use error::Error;
pub use fakes::{FakeDistributedLock, FakeEventStream};
pub use lock::{DistributedLock, LockGuard};
pub use redis_lock::RedisDistributedLock;
pub use redis_stream::RedisEventStream;
pub use stream::{EventStream, StreamEntry};
