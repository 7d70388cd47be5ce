use std::time::Instant;

use chrono::Utc;
use log::debug;

use super::Block;
use crate::transaction::Transaction;

/// Perform Proof-of-Work: build the successor of `previous` carrying
/// `transactions`, then search nonces from 0 until the content hash meets
/// `difficulty`. Records the wall-clock duration of the search and the
/// resulting attempt rate. Blocks until a nonce is found, so callers must
/// not hold shared locks across this call.
pub fn mine(
    previous: &Block,
    difficulty: u32,
    transactions: Vec<Transaction>,
    block_reward: u64,
) -> Block {
    let mut block = Block {
        height: previous.height + 1,
        timestamp: Utc::now().timestamp(),
        previous_hash: previous.hash.clone(),
        transactions,
        nonce: 0,
        difficulty,
        elapsed_time: 0.0,
        block_reward,
        hash_power: 0.0,
        hash: String::new(),
    };

    let started = Instant::now();
    loop {
        block.hash = block.compute_hash();
        if Block::meets_difficulty(&block.hash, difficulty) {
            break;
        }
        block.nonce = block.nonce.wrapping_add(1);
    }

    block.elapsed_time = started.elapsed().as_secs_f64();
    let attempts = block.nonce + 1;
    block.hash_power = if block.elapsed_time > 0.0 {
        attempts as f64 / block.elapsed_time
    } else {
        0.0
    };

    debug!(
        "MINER - sealed block #{} after {} attempts in {:.3}s (hash={})",
        block.height, attempts, block.elapsed_time, block.hash
    );
    block
}
