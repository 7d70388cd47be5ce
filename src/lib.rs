//! In-memory, proof-of-work-secured ledger engine: an append-only chain of
//! transaction-bearing blocks, queryable by height, recency and ranking
//! metrics. The [`Ledger`] facade is the only entry point a serving layer
//! needs; it is safe to share across concurrent request handlers.

pub mod blockchain;
pub mod error;
pub mod ledger;
pub mod ranking;
pub mod transaction;

pub use blockchain::{Block, Chain};
pub use error::LedgerError;
pub use ledger::{DifficultyPolicy, Ledger, LedgerConfig};
pub use ranking::Metric;
pub use transaction::Transaction;
