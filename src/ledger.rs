use std::sync::{Mutex, RwLock};

use log::{debug, info};

use crate::blockchain::{
    BLOCK_REWARD, Block, Chain, DEFAULT_DIFFICULTY, DIFF_MAX, DIFF_MIN, miner,
};
use crate::error::Result;
use crate::ranking::{Metric, RankingIndex};
use crate::transaction::{Transaction, TransactionPool};

/// How the mining difficulty evolves block to block. Fixed at construction
/// and applied identically on every `mine_next_block` call.
#[derive(Debug, Clone, Copy)]
pub enum DifficultyPolicy {
    /// Same difficulty for every block.
    Constant(u32),
    /// Step toward the target block time: raise difficulty when the tip was
    /// mined in under half the target, lower it when mining took more than
    /// double, staying within [DIFF_MIN, DIFF_MAX].
    Adjusting { target_secs: f64 },
}

impl DifficultyPolicy {
    /// Difficulty recorded on the genesis block.
    fn initial(&self) -> u32 {
        match self {
            DifficultyPolicy::Constant(d) => *d,
            DifficultyPolicy::Adjusting { .. } => DEFAULT_DIFFICULTY,
        }
    }

    /// Difficulty for the block that will follow `tip`. Deterministic from
    /// the tip's recorded metrics.
    fn next(&self, tip: &Block) -> u32 {
        match self {
            DifficultyPolicy::Constant(d) => *d,
            DifficultyPolicy::Adjusting { target_secs } => {
                let current = tip.difficulty;
                if tip.height == 0 {
                    return current; // genesis carries no mining time
                }
                if tip.elapsed_time < target_secs / 2.0 && current < DIFF_MAX {
                    current + 1
                } else if tip.elapsed_time > target_secs * 2.0 && current > DIFF_MIN {
                    current - 1
                } else {
                    current
                }
            }
        }
    }
}

/// Policy knobs fixed once at initialization.
#[derive(Debug, Clone, Copy)]
pub struct LedgerConfig {
    pub difficulty: DifficultyPolicy,
    pub block_reward: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: DifficultyPolicy::Constant(DEFAULT_DIFFICULTY),
            block_reward: BLOCK_REWARD,
        }
    }
}

/// Chain and ranking index behind one lock, so a reader can never observe
/// an appended block without its index entries.
#[derive(Debug)]
struct ChainState {
    chain: Chain,
    index: RankingIndex,
}

impl ChainState {
    fn new(difficulty: u32) -> Self {
        let chain = Chain::new(difficulty);
        let index = RankingIndex::new(chain.genesis());
        Self { chain, index }
    }
}

/// The single entry point to the ledger engine. Safe to share across
/// threads; the serving layer calls it synchronously.
pub struct Ledger {
    state: RwLock<ChainState>,
    pool: Mutex<TransactionPool>,
    // Serializes chain-shape mutations (mining, reset) against each other
    // without blocking readers during the PoW search.
    miner_gate: Mutex<()>,
    config: LedgerConfig,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

impl Ledger {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            state: RwLock::new(ChainState::new(config.difficulty.initial())),
            pool: Mutex::new(TransactionPool::new()),
            miner_gate: Mutex::new(()),
            config,
        }
    }

    /// Discard all blocks and pending transactions and start over from a
    /// fresh genesis block. Readers see either the old chain or the new
    /// genesis, never anything in between.
    pub fn reset(&self) {
        let _gate = self.miner_gate.lock().expect("mutex poisoned");

        let dropped = self.pool.lock().expect("mutex poisoned").drain();
        let mut state = self.state.write().expect("lock poisoned");
        let state = &mut *state;
        let old_len = state.chain.len();
        state.chain.reset(self.config.difficulty.initial());
        state.index.reset(state.chain.genesis());
        info!(
            "LEDGER - reset: dropped {} blocks and {} pending txs",
            old_len,
            dropped.len()
        );
    }

    /// Accept a transaction into the pending pool. Never rejects; content
    /// validation is outside this engine.
    pub fn submit_transaction(
        &self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: u64,
    ) -> Transaction {
        let tx = Transaction::new(sender, recipient, amount);
        let mut pool = self.pool.lock().expect("mutex poisoned");
        pool.add(tx.clone());
        debug!(
            "POOL - accepted tx {} -> {} ({}); size now {}",
            tx.sender,
            tx.recipient,
            tx.amount,
            pool.len()
        );
        tx
    }

    /// Snapshot of the pending pool in submission order.
    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.pool.lock().expect("mutex poisoned").pending().to_vec()
    }

    /// Drain the pool, mine its transactions into the successor of the
    /// current tip, append the result and index it. The PoW search runs on
    /// an unlocked snapshot; only the drain and the append take locks.
    pub fn mine_next_block(&self) -> Result<Block> {
        let _gate = self.miner_gate.lock().expect("mutex poisoned");

        let transactions = self.pool.lock().expect("mutex poisoned").drain();
        let (previous, difficulty) = {
            let state = self.state.read().expect("lock poisoned");
            let tip = state.chain.tip();
            (tip.clone(), self.config.difficulty.next(tip))
        };

        let block = miner::mine(&previous, difficulty, transactions, self.config.block_reward);

        let mut state = self.state.write().expect("lock poisoned");
        state.chain.append(block.clone())?;
        state.index.insert(&block);
        info!(
            "LEDGER - mined block #{} with {} txs (difficulty={}, nonce={})",
            block.height,
            block.transactions.len(),
            block.difficulty,
            block.nonce
        );
        Ok(block)
    }

    /// The block at `height`, or `NotFound`.
    pub fn get_block(&self, height: u64) -> Result<Block> {
        let state = self.state.read().expect("lock poisoned");
        state.chain.at(height).cloned()
    }

    /// The current tip.
    pub fn get_last_block(&self) -> Block {
        self.state.read().expect("lock poisoned").chain.tip().clone()
    }

    /// The block at height 0.
    pub fn get_genesis_block(&self) -> Block {
        self.state
            .read()
            .expect("lock poisoned")
            .chain
            .genesis()
            .clone()
    }

    /// The whole chain in height order, genesis first.
    pub fn get_all_blocks(&self) -> Vec<Block> {
        self.state.read().expect("lock poisoned").chain.all().to_vec()
    }

    /// The `n` most recent blocks, most recent first.
    pub fn get_last_n_blocks(&self, n: usize) -> Result<Vec<Block>> {
        self.state.read().expect("lock poisoned").chain.last_n(n)
    }

    /// The `k` blocks ranking highest on the named metric, best first,
    /// ties broken by recency. The metric name must be one of the closed
    /// set understood by [`Metric`].
    pub fn get_top_blocks(&self, metric: &str, k: usize) -> Result<Vec<Block>> {
        let metric: Metric = metric.parse()?;
        let state = self.state.read().expect("lock poisoned");
        let heights = state.index.top(metric, k)?;
        heights
            .into_iter()
            .map(|h| state.chain.at(h).cloned())
            .collect()
    }

    /// Number of blocks in the chain.
    pub fn len(&self) -> usize {
        self.state.read().expect("lock poisoned").chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().expect("lock poisoned").chain.is_empty()
    }

    /// Walk the whole chain checking linkage, hashes and PoW.
    pub fn validate_chain(&self) -> bool {
        self.state
            .read()
            .expect("lock poisoned")
            .chain
            .is_valid_chain()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::error::LedgerError;

    fn fast_ledger() -> Ledger {
        Ledger::new(LedgerConfig {
            difficulty: DifficultyPolicy::Constant(1),
            block_reward: 50,
        })
    }

    #[test]
    fn repeated_mining_keeps_chain_linked() {
        let ledger = fast_ledger();
        for _ in 0..4 {
            ledger.mine_next_block().unwrap();
        }

        let blocks = ledger.get_all_blocks();
        assert_eq!(blocks.len(), 5);
        for (i, pair) in blocks.windows(2).enumerate() {
            assert_eq!(pair[1].height, i as u64 + 1);
            assert_eq!(pair[1].previous_hash, pair[0].hash);
        }
        assert!(ledger.validate_chain());
    }

    #[test]
    fn reset_yields_single_genesis() {
        let ledger = fast_ledger();
        ledger.submit_transaction("a", "b", 1);
        ledger.mine_next_block().unwrap();
        assert_eq!(ledger.len(), 2);

        ledger.reset();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get_genesis_block().height, 0);
        assert!(ledger.pending_transactions().is_empty());
        assert_eq!(ledger.get_top_blocks("height", 1).unwrap()[0].height, 0);
    }

    #[test]
    fn mined_block_carries_submitted_transactions_in_order() {
        let ledger = fast_ledger();
        ledger.submit_transaction("A", "B", 1);
        ledger.submit_transaction("C", "D", 1);
        ledger.submit_transaction("E", "F", 1);

        let block = ledger.mine_next_block().unwrap();
        let senders: Vec<_> = block.transactions.iter().map(|t| t.sender.as_str()).collect();
        assert_eq!(senders, vec!["A", "C", "E"]);
        assert!(ledger.pending_transactions().is_empty());
    }

    #[test]
    fn scenario_reset_submit_mine_query() {
        let ledger = fast_ledger();
        ledger.reset();
        assert_eq!(ledger.len(), 1);

        ledger.submit_transaction("A", "B", 1);
        ledger.submit_transaction("C", "D", 1);
        ledger.submit_transaction("E", "F", 1);
        ledger.mine_next_block().unwrap();

        assert_eq!(ledger.len(), 2);
        let block1 = ledger.get_block(1).unwrap();
        assert_eq!(block1.transactions.len(), 3);
        assert!(ledger.pending_transactions().is_empty());

        let last_two = ledger.get_last_n_blocks(2).unwrap();
        assert_eq!(last_two[0].hash, block1.hash);
        assert_eq!(last_two[1].height, 0);
    }

    #[test]
    fn last_n_bounds_and_ordering() {
        let ledger = fast_ledger();
        ledger.mine_next_block().unwrap();
        ledger.mine_next_block().unwrap();

        let all = ledger.get_last_n_blocks(3).unwrap();
        let heights: Vec<_> = all.iter().map(|b| b.height).collect();
        assert_eq!(heights, vec![2, 1, 0]);
        assert!(matches!(
            ledger.get_last_n_blocks(4),
            Err(LedgerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn top_blocks_by_difficulty_breaks_ties_by_recency() {
        let ledger = fast_ledger();
        ledger.mine_next_block().unwrap();
        ledger.mine_next_block().unwrap();

        // Constant difficulty: every mined block ties, newest first; the
        // genesis block ties too (difficulty is recorded on it as well).
        let top = ledger.get_top_blocks("difficulty", 3).unwrap();
        let heights: Vec<_> = top.iter().map(|b| b.height).collect();
        assert_eq!(heights, vec![2, 1, 0]);

        assert!(matches!(
            ledger.get_top_blocks("difficulty", 9),
            Err(LedgerError::InvalidArgument(_))
        ));
        assert!(matches!(
            ledger.get_top_blocks("no_such_metric", 1),
            Err(LedgerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn unknown_height_is_not_found() {
        let ledger = fast_ledger();
        assert!(matches!(
            ledger.get_block(3),
            Err(LedgerError::NotFound { height: 3 })
        ));
    }

    #[test]
    fn concurrent_submissions_all_land_in_next_block() {
        let ledger = Arc::new(fast_ledger());
        let submitters = 100;

        let handles: Vec<_> = (0..submitters)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    ledger.submit_transaction(format!("sender-{i}"), "recipient", 1);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let block = ledger.mine_next_block().unwrap();
        assert_eq!(block.transactions.len(), submitters);

        let unique: HashSet<_> = block.transactions.iter().map(|t| t.sender.as_str()).collect();
        assert_eq!(unique.len(), submitters, "no tx lost or duplicated");
        assert!(ledger.pending_transactions().is_empty());
    }

    #[test]
    fn adjusting_policy_steps_toward_target() {
        let policy = DifficultyPolicy::Adjusting { target_secs: 10.0 };

        let mut fast_tip = Block::genesis(3);
        fast_tip.height = 1;
        fast_tip.elapsed_time = 0.5; // well under target/2 -> harder
        assert_eq!(policy.next(&fast_tip), 4);

        let mut slow_tip = fast_tip.clone();
        slow_tip.elapsed_time = 30.0; // over target*2 -> easier
        assert_eq!(policy.next(&slow_tip), 2);

        let mut on_target = fast_tip.clone();
        on_target.elapsed_time = 10.0;
        assert_eq!(policy.next(&on_target), 3);

        // Clamped at the bounds
        let mut at_max = fast_tip.clone();
        at_max.difficulty = DIFF_MAX;
        at_max.elapsed_time = 0.1;
        assert_eq!(policy.next(&at_max), DIFF_MAX);

        let mut at_min = fast_tip;
        at_min.difficulty = DIFF_MIN;
        at_min.elapsed_time = 100.0;
        assert_eq!(policy.next(&at_min), DIFF_MIN);
    }

    #[test]
    fn genesis_difficulty_follows_policy() {
        let ledger = Ledger::new(LedgerConfig {
            difficulty: DifficultyPolicy::Constant(2),
            block_reward: 10,
        });
        assert_eq!(ledger.get_genesis_block().difficulty, 2);
        let mined = ledger.mine_next_block().unwrap();
        assert_eq!(mined.difficulty, 2);
        assert_eq!(mined.block_reward, 10);
    }
}
