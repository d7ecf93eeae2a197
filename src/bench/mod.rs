//! Benchmark harness comparing the hash table and both trees.
//!
//! A run loads `key<delimiter>value` records from a text file, then times
//! three phases against each engine in turn: insert every record, search
//! every key, delete every key.

mod runner;
mod workload;

pub use runner::{build_store, run, BenchReport};
pub use workload::Workload;

use crate::error::TreeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Degree the harness builds both trees with
pub const DEFAULT_BENCH_ORDER: usize = 1000;

/// Initial slot count of the hash table under test
pub const DEFAULT_HASH_CAPACITY: usize = 1000;

/// Data structure under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Hash,
    BTree,
    BPlus,
}

impl Engine {
    /// Every engine, in reporting order
    pub const ALL: [Engine; 3] = [Engine::Hash, Engine::BTree, Engine::BPlus];

    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Hash => "hash",
            Engine::BTree => "btree",
            Engine::BPlus => "bplus",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hash" => Ok(Engine::Hash),
            "btree" | "b-tree" => Ok(Engine::BTree),
            "bplus" | "b+tree" | "bplustree" => Ok(Engine::BPlus),
            other => Err(TreeError::invalid_argument(format!(
                "unknown engine '{other}', expected hash, btree or bplus"
            ))),
        }
    }
}

/// Benchmark configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchConfig {
    /// Order used for both trees (default: 1000)
    pub order: usize,
    /// Field separator of the data file (default: ',')
    pub delimiter: char,
    /// Engines to run, in order (default: all)
    pub engines: Vec<Engine>,
    /// Initial hash table capacity (default: 1000)
    pub hash_capacity: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            order: DEFAULT_BENCH_ORDER,
            delimiter: ',',
            engines: Engine::ALL.to_vec(),
            hash_capacity: DEFAULT_HASH_CAPACITY,
        }
    }
}

impl BenchConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tree order
    pub fn order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    /// Set the field delimiter
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Restrict the run to the given engines
    pub fn engines(mut self, engines: impl IntoIterator<Item = Engine>) -> Self {
        self.engines = engines.into_iter().collect();
        self
    }

    /// Set the initial hash table capacity
    pub fn hash_capacity(mut self, capacity: usize) -> Self {
        self.hash_capacity = capacity;
        self
    }
}
