use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::blockchain::Block;
use crate::error::{LedgerError, Result};

/// Block metadata fields a top-K query can rank by. A closed set: anything
/// outside it is rejected as `InvalidArgument` when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Difficulty,
    ElapsedTime,
    BlockReward,
    HashPower,
    Height,
    Nonce,
    TransactionCount,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::Difficulty,
        Metric::ElapsedTime,
        Metric::BlockReward,
        Metric::HashPower,
        Metric::Height,
        Metric::Nonce,
        Metric::TransactionCount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Difficulty => "difficulty",
            Metric::ElapsedTime => "elapsed_time",
            Metric::BlockReward => "block_reward",
            Metric::HashPower => "hash_power",
            Metric::Height => "height",
            Metric::Nonce => "nonce",
            Metric::TransactionCount => "transaction_count",
        }
    }

    fn value_of(&self, block: &Block) -> MetricValue {
        match self {
            Metric::Difficulty => MetricValue::Count(block.difficulty as u64),
            Metric::ElapsedTime => MetricValue::Rate(block.elapsed_time),
            Metric::BlockReward => MetricValue::Count(block.block_reward),
            Metric::HashPower => MetricValue::Rate(block.hash_power),
            Metric::Height => MetricValue::Count(block.height),
            Metric::Nonce => MetricValue::Count(block.nonce),
            Metric::TransactionCount => MetricValue::Count(block.transactions.len() as u64),
        }
    }
}

impl FromStr for Metric {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "difficulty" => Ok(Metric::Difficulty),
            "elapsed_time" => Ok(Metric::ElapsedTime),
            "block_reward" => Ok(Metric::BlockReward),
            "hash_power" => Ok(Metric::HashPower),
            "height" => Ok(Metric::Height),
            "nonce" => Ok(Metric::Nonce),
            // "number_of_transaction" is the legacy spelling of this field
            "transaction_count" | "number_of_transaction" => Ok(Metric::TransactionCount),
            other => Err(LedgerError::InvalidArgument(format!(
                "unrecognized metric {other:?}"
            ))),
        }
    }
}

/// Metric value with a total order. Integer-backed fields compare exactly;
/// rate fields compare via `total_cmp` so the index stays well-ordered even
/// for equal or degenerate floats.
#[derive(Debug, Clone, Copy)]
enum MetricValue {
    Count(u64),
    Rate(f64),
}

impl Ord for MetricValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use MetricValue::*;
        match (self, other) {
            (Count(a), Count(b)) => a.cmp(b),
            (Rate(a), Rate(b)) => a.total_cmp(b),
            (Count(a), Rate(b)) => (*a as f64).total_cmp(b),
            (Rate(a), Count(b)) => a.total_cmp(&(*b as f64)),
        }
    }
}

impl PartialOrd for MetricValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for MetricValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MetricValue {}

/// One indexed block under one metric. Ordered ascending by value, then by
/// height, so reverse iteration yields descending value with ties broken by
/// the most recent block.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    value: MetricValue,
    height: u64,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .cmp(&other.value)
            .then(self.height.cmp(&other.height))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sorted views over block metadata, one ordered set per metric. Updated
/// incrementally on append; never rebuilt on read.
#[derive(Debug)]
pub struct RankingIndex {
    by_metric: HashMap<Metric, BTreeSet<Entry>>,
    indexed: usize,
}

impl RankingIndex {
    /// Build an index holding only the genesis block.
    pub fn new(genesis: &Block) -> Self {
        let mut index = Self {
            by_metric: Metric::ALL.iter().map(|m| (*m, BTreeSet::new())).collect(),
            indexed: 0,
        };
        index.insert(genesis);
        index
    }

    /// Insert a newly appended block into every per-metric set.
    /// Logarithmic per metric.
    pub fn insert(&mut self, block: &Block) {
        for metric in Metric::ALL {
            let entry = Entry {
                value: metric.value_of(block),
                height: block.height,
            };
            self.by_metric
                .get_mut(&metric)
                .expect("all metrics initialized at construction")
                .insert(entry);
        }
        self.indexed += 1;
    }

    /// Clear everything and reinitialize with the new genesis block.
    pub fn reset(&mut self, genesis: &Block) {
        for set in self.by_metric.values_mut() {
            set.clear();
        }
        self.indexed = 0;
        self.insert(genesis);
    }

    /// Heights of the `k` blocks with the greatest value of `metric`,
    /// most-significant-first, ties broken by descending height. Fails with
    /// `InvalidArgument` when `k` exceeds the number of indexed blocks.
    pub fn top(&self, metric: Metric, k: usize) -> Result<Vec<u64>> {
        if k > self.indexed {
            return Err(LedgerError::InvalidArgument(format!(
                "requested top {} but only {} blocks are indexed",
                k, self.indexed
            )));
        }
        let set = self
            .by_metric
            .get(&metric)
            .expect("all metrics initialized at construction");
        Ok(set.iter().rev().take(k).map(|e| e.height).collect())
    }

    /// Number of indexed blocks (always equals the chain length).
    pub fn len(&self) -> usize {
        self.indexed
    }

    pub fn is_empty(&self) -> bool {
        self.indexed == 0
    }
}
