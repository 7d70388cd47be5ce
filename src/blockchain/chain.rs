use log::debug;

use super::{Block, GENESIS_PREVIOUS_HASH};
use crate::error::{LedgerError, Result};

/// Append-only, height-indexed sequence of blocks. Always holds at least
/// the genesis block; heights run contiguously from 0.
#[derive(Debug)]
pub struct Chain {
    blocks: Vec<Block>,
}

impl Chain {
    /// Initialize a new chain with a genesis block at the given difficulty.
    pub fn new(difficulty: u32) -> Self {
        Self {
            blocks: vec![Block::genesis(difficulty)],
        }
    }

    /// Append a block, making it the new tip. Fails with
    /// `InvariantViolation` if the block does not link to the current tip.
    pub fn append(&mut self, block: Block) -> Result<()> {
        let tip = self.tip();
        if block.height != tip.height + 1 {
            return Err(LedgerError::InvariantViolation(format!(
                "expected height {}, got {}",
                tip.height + 1,
                block.height
            )));
        }
        if block.previous_hash != tip.hash {
            return Err(LedgerError::InvariantViolation(format!(
                "block {} does not link to tip hash {}",
                block.height, tip.hash
            )));
        }
        debug!("CHAIN - appended block #{} (hash={})", block.height, block.hash);
        self.blocks.push(block);
        Ok(())
    }

    /// Discard all blocks and start over from a fresh genesis block at the
    /// given difficulty.
    pub fn reset(&mut self, difficulty: u32) {
        self.blocks = vec![Block::genesis(difficulty)];
    }

    /// The block at height 0.
    pub fn genesis(&self) -> &Block {
        &self.blocks[0]
    }

    /// The block at the highest height.
    pub fn tip(&self) -> &Block {
        self.blocks
            .last()
            .expect("chain always holds at least the genesis block")
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The block at `height`, or `NotFound` if out of range.
    pub fn at(&self, height: u64) -> Result<&Block> {
        self.blocks
            .get(height as usize)
            .ok_or(LedgerError::NotFound { height })
    }

    /// The `n` most recent blocks, most recent first. `n` equal to the
    /// chain length returns the whole chain; anything larger is an
    /// `InvalidArgument`.
    pub fn last_n(&self, n: usize) -> Result<Vec<Block>> {
        if n > self.len() {
            return Err(LedgerError::InvalidArgument(format!(
                "requested {} blocks but chain length is {}",
                n,
                self.len()
            )));
        }
        Ok(self.blocks[self.len() - n..].iter().rev().cloned().collect())
    }

    /// All blocks in height order, genesis first.
    pub fn all(&self) -> &[Block] {
        &self.blocks
    }

    /// Validate the entire chain: genesis shape, linkage, hashes and PoW.
    pub fn is_valid_chain(&self) -> bool {
        let genesis = &self.blocks[0];
        if genesis.height != 0
            || genesis.previous_hash != GENESIS_PREVIOUS_HASH
            || genesis.hash != genesis.compute_hash()
        {
            return false;
        }

        for i in 1..self.blocks.len() {
            let current = &self.blocks[i];
            let prev = &self.blocks[i - 1];

            // Check linkage and height contiguity
            if current.previous_hash != prev.hash || current.height != prev.height + 1 {
                return false;
            }

            // Check hash integrity + difficulty
            if !current.is_valid() {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::miner;
    use crate::transaction::Transaction;

    #[test]
    fn new_chain_holds_only_genesis() {
        let chain = Chain::new(2);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.genesis().height, 0);
        assert_eq!(chain.genesis().hash, chain.tip().hash);
        assert!(chain.is_valid_chain());
    }

    #[test]
    fn append_checks_linkage() {
        let mut chain = Chain::new(1);
        let good = miner::mine(&chain.tip().clone(), 1, Vec::new(), 50);

        // Wrong previous_hash
        let mut unlinked = good.clone();
        unlinked.previous_hash = String::from("bogus");
        assert!(matches!(
            chain.append(unlinked),
            Err(LedgerError::InvariantViolation(_))
        ));

        // Wrong height
        let mut skipped = good.clone();
        skipped.height = 5;
        assert!(matches!(
            chain.append(skipped),
            Err(LedgerError::InvariantViolation(_))
        ));

        chain.append(good).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.tip().height, 1);
    }

    #[test]
    fn at_reports_not_found_out_of_range() {
        let chain = Chain::new(1);
        assert_eq!(chain.at(0).unwrap().height, 0);
        assert!(matches!(
            chain.at(7),
            Err(LedgerError::NotFound { height: 7 })
        ));
    }

    #[test]
    fn last_n_is_most_recent_first() {
        let mut chain = Chain::new(1);
        for _ in 0..3 {
            let block = miner::mine(&chain.tip().clone(), 1, Vec::new(), 50);
            chain.append(block).unwrap();
        }

        let last_two = chain.last_n(2).unwrap();
        assert_eq!(last_two.len(), 2);
        assert_eq!(last_two[0].height, 3);
        assert_eq!(last_two[1].height, 2);

        let whole = chain.last_n(4).unwrap();
        assert_eq!(whole.first().unwrap().height, 3);
        assert_eq!(whole.last().unwrap().height, 0);

        assert!(chain.last_n(0).unwrap().is_empty());
        assert!(matches!(
            chain.last_n(5),
            Err(LedgerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn reset_starts_over_from_genesis() {
        let mut chain = Chain::new(1);
        let block = miner::mine(&chain.tip().clone(), 1, Vec::new(), 50);
        chain.append(block).unwrap();
        assert_eq!(chain.len(), 2);

        chain.reset(1);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.tip().height, 0);
        assert!(chain.is_valid_chain());
    }

    #[test]
    fn chain_with_mined_blocks_validates() {
        let mut chain = Chain::new(1);
        for i in 0..3 {
            let txs = vec![Transaction::new(format!("s{i}"), "r", 1)];
            let block = miner::mine(&chain.tip().clone(), 1, txs, 50);
            chain.append(block).unwrap();
        }
        assert!(chain.is_valid_chain());
    }
}
