use std::env;

use dotenvy::dotenv;
use log::info;
use rand::Rng;
use uuid::Uuid;

use blockchain_db::blockchain::TARGET_BLOCK_TIME_SECS;
use blockchain_db::{DifficultyPolicy, Ledger, LedgerConfig};

const RECIPIENTS: [&str; 3] = ["bibi", "benet", "gantz"];

/// Demo driver: submit batches of random transactions and mine a number of
/// blocks, then print chain summaries. Configured via env vars:
/// BLOCKS (default 5), DIFFICULTY (default 3), REWARD (default 50),
/// ADJUST (any value switches to the adjusting difficulty policy).
fn main() {
    let _ = dotenv();
    env_logger::init();

    let blocks: u32 = env_u32("BLOCKS", 5);
    let difficulty: u32 = env_u32("DIFFICULTY", 3);
    let reward: u64 = env_u32("REWARD", 50) as u64;
    let policy = if env::var("ADJUST").is_ok() {
        DifficultyPolicy::Adjusting {
            target_secs: TARGET_BLOCK_TIME_SECS,
        }
    } else {
        DifficultyPolicy::Constant(difficulty)
    };

    let ledger = Ledger::new(LedgerConfig {
        difficulty: policy,
        block_reward: reward,
    });

    println!("⛓️ Mining {blocks} blocks at difficulty {difficulty}");

    let mut rng = rand::thread_rng();
    for _ in 0..blocks {
        let batch = rng.gen_range(1..=10);
        for _ in 0..batch {
            let sender = Uuid::new_v4().simple().to_string();
            let recipient = RECIPIENTS[rng.gen_range(0..RECIPIENTS.len())];
            ledger.submit_transaction(sender, recipient, 1);
        }
        let block = ledger
            .mine_next_block()
            .expect("appending a freshly mined block cannot break linkage");
        info!(
            "mined #{}: {} txs, nonce={}, {:.3}s, {:.0} H/s",
            block.height,
            block.transactions.len(),
            block.nonce,
            block.elapsed_time,
            block.hash_power
        );
    }

    println!("chain length: {}", ledger.len());
    println!("chain valid:  {}", ledger.validate_chain());

    let top = ledger
        .get_top_blocks("hash_power", 3.min(ledger.len()))
        .expect("metric name and k are in range");
    for block in top {
        println!(
            "top hash_power: block #{} at {:.0} H/s (nonce={})",
            block.height, block.hash_power, block.nonce
        );
    }
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
