use super::Transaction;

/// Ordered pool of transactions waiting to be mined into the next block.
/// Accepts anything (content validation is out of scope) and is unbounded.
#[derive(Debug, Default)]
pub struct TransactionPool {
    pending: Vec<Transaction>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transaction to the pending sequence. Never rejects.
    pub fn add(&mut self, tx: Transaction) {
        self.pending.push(tx);
    }

    /// Remove and return all pending transactions in submission order,
    /// leaving the pool empty. The caller holds the pool lock, so each
    /// transaction is drained exactly once.
    pub fn drain(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Read-only view of the pending sequence.
    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_pool_in_order() {
        let mut pool = TransactionPool::new();
        pool.add(Transaction::new("a", "b", 1));
        pool.add(Transaction::new("c", "d", 2));
        assert_eq!(pool.len(), 2);

        let drained = pool.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].sender, "a");
        assert_eq!(drained[1].sender, "c");
        assert!(pool.is_empty());
    }

    #[test]
    fn drain_on_empty_pool_returns_nothing() {
        let mut pool = TransactionPool::new();
        assert!(pool.drain().is_empty());
    }
}
