use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

use crate::model::{Question, QuestionId};

/// Per-epoch option ordering.
///
/// Every question gets a permutation of its option indices derived only from
/// `(epoch seed, question id)`, so asking twice within one epoch yields the
/// same order. [`ShuffleEngine::new_epoch`] draws a fresh seed and forgets all
/// previous orders.
#[derive(Debug, Clone)]
pub struct ShuffleEngine {
    seed: u64,
    epoch: u64,
    orders: HashMap<QuestionId, Vec<usize>>,
}

impl Default for ShuffleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ShuffleEngine {
    /// Start at epoch 0 with a random seed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            epoch: 0,
            orders: HashMap::new(),
        }
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Monotonic epoch counter; stable between transitions.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Display order for `question`: `order[display_position] = original_index`.
    pub fn option_order(&mut self, question: &Question) -> &[usize] {
        let seed = self.seed;
        self.orders
            .entry(question.id())
            .or_insert_with(|| permutation(seed, question.id(), question.option_count()))
    }

    /// Same order as [`ShuffleEngine::option_order`] without touching the memo.
    #[must_use]
    pub fn peek_order(&self, question: &Question) -> Vec<usize> {
        self.orders.get(&question.id()).cloned().unwrap_or_else(|| {
            permutation(self.seed, question.id(), question.option_count())
        })
    }

    /// End the current epoch with a freshly drawn seed.
    pub fn new_epoch(&mut self) {
        self.new_epoch_with_seed(rand::rng().random());
    }

    /// End the current epoch with a caller-chosen seed.
    pub fn new_epoch_with_seed(&mut self, seed: u64) {
        self.seed = seed;
        self.epoch = self.epoch.wrapping_add(1);
        self.orders.clear();
    }
}

/// Fisher–Yates permutation of `[0, len)` seeded by `(seed, id)`.
#[must_use]
pub fn permutation(seed: u64, id: QuestionId, len: usize) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(mix(seed, id.index() as u64));
    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(&mut rng);
    order
}

// splitmix64 finalizer over both inputs so neighbouring ids diverge.
fn mix(seed: u64, id: u64) -> u64 {
    let mut z = seed ^ id.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
