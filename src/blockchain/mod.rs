pub mod block;
pub mod chain;
pub mod miner;

pub use block::{Block, GENESIS_PREVIOUS_HASH};
pub use chain::Chain;

/// Default Proof-of-Work difficulty (number of leading zeros).
pub const DEFAULT_DIFFICULTY: u32 = 3;

/// Base block subsidy (dev value).
pub const BLOCK_REWARD: u64 = 50;

/// Target seconds per block when difficulty auto-adjusts.
pub const TARGET_BLOCK_TIME_SECS: f64 = 10.0;

/// Difficulty bounds (keep low in dev to avoid long waits)
pub const DIFF_MIN: u32 = 1;
pub const DIFF_MAX: u32 = 6;
