use thiserror::Error;

/// Errors returned by the ledger engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Chain linkage would be broken by the attempted append. This indicates
    /// a bug in the miner/store pairing, not a recoverable condition.
    #[error("chain invariant violated: {0}")]
    InvariantViolation(String),

    /// No block exists at the requested height.
    #[error("no block at height {height}")]
    NotFound { height: u64 },

    /// A caller-supplied parameter was out of range or unrecognized.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
