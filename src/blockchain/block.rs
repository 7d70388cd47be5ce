use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::transaction::Transaction;

/// Sentinel previous-hash carried by the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// A single block in the chain holding a list of transactions plus the
/// metrics recorded when it was mined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub height: u64,
    pub timestamp: i64, // Unix timestamp (UTC)
    pub previous_hash: String,
    pub transactions: Vec<Transaction>,
    pub nonce: u64, // Proof-of-Work nonce
    pub difficulty: u32,
    /// Wall-clock seconds spent searching for the nonce.
    pub elapsed_time: f64,
    pub block_reward: u64,
    /// Search throughput: attempts per second (0.0 if elapsed_time was 0).
    pub hash_power: f64,
    pub hash: String, // Cached hash of the block
}

impl Block {
    /// Create the genesis block (first block in the chain). Not mined:
    /// nonce 0, zero metrics, no transactions.
    pub fn genesis(difficulty: u32) -> Self {
        let mut block = Self {
            height: 0,
            timestamp: Utc::now().timestamp(),
            previous_hash: String::from(GENESIS_PREVIOUS_HASH),
            transactions: Vec::new(),
            nonce: 0,
            difficulty,
            elapsed_time: 0.0,
            block_reward: 0,
            hash_power: 0.0,
            hash: String::new(),
        };
        block.hash = block.compute_hash();
        block
    }

    /// Compute the SHA-256 hash of this block using its content fields,
    /// excluding `hash` itself and the derived mining metrics. Transactions
    /// are serialized deterministically as JSON and included in the preimage.
    pub fn compute_hash(&self) -> String {
        let txs_json = serde_json::to_string(&self.transactions).expect("serialize txs");
        let preimage = format!(
            "{}:{}:{}:{}:{}:{}",
            self.height, self.timestamp, self.previous_hash, self.nonce, self.difficulty, txs_json
        );
        let mut hasher = Sha256::new();
        hasher.update(preimage.as_bytes());
        let digest = hasher.finalize();
        hex::encode(digest)
    }

    /// Whether `hash` satisfies the PoW predicate for `difficulty`:
    /// that many leading zeros (in hex). Harder monotonically as
    /// `difficulty` grows, and reproducible from the stored value.
    pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
        hash.chars().take(difficulty as usize).all(|c| c == '0')
    }

    /// Validate that the cached `hash` matches the block's content and,
    /// for non-genesis blocks, satisfies the recorded difficulty.
    /// (Does NOT validate chain linkage.)
    pub fn is_valid(&self) -> bool {
        if self.hash != self.compute_hash() {
            return false;
        }
        if self.height == 0 {
            return true; // genesis is not mined
        }
        Self::meets_difficulty(&self.hash, self.difficulty)
    }
}
