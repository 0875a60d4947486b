//! Pass configuration

use serde::{Deserialize, Serialize};

/// Tunable knobs of the mutation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzConfig {
    /// Seed of the decision source; equal seeds give equal output
    pub seed: u64,
    /// Synthesized nodes allowed per function
    pub budget: u32,
    /// Percent chance that a visited node is replaced
    pub replace_chance: u32,
    /// Percent chance that a synthesis attempt yields `unreachable` outright
    pub unreachable_chance: u32,
    /// Upper bound on the number of children of a synthesized block
    pub max_block_len: u32,
}

impl FuzzConfig {
    pub const DEFAULT_SEED: u64 = 42;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_budget(mut self, budget: u32) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_replace_chance(mut self, percent: u32) -> Self {
        self.replace_chance = percent.min(100);
        self
    }

    pub fn with_unreachable_chance(mut self, percent: u32) -> Self {
        self.unreachable_chance = percent.min(100);
        self
    }

    /// Sets the block length bound; at least one child is always built
    pub fn with_max_block_len(mut self, len: u32) -> Self {
        self.max_block_len = len.max(1);
        self
    }
}

impl Default for FuzzConfig {
    fn default() -> Self {
        Self {
            seed: Self::DEFAULT_SEED,
            budget: 1000,
            replace_chance: 5,
            unreachable_chance: 5,
            max_block_len: 5,
        }
    }
}
