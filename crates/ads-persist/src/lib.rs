//! The Postgres-backed relational write-of-record.
//!
//! `ads-persist` owns the `ads` table: the durable, strictly-ordered ledger
//! that an [`ads-service`](../ads_service/index.html) write commits to
//! before it ever reaches the in-memory [`ads_store::Store`], and that a
//! fresh replica restores from on boot.

mod error;
mod repo;
mod row;

pub use error::Error;
pub use repo::{fetch_all_up_to, insert_ad, max_version, max_version_txn};
pub use row::AdRow;

pub use sqlx::{PgPool, Postgres, Transaction};
