//! Seeded decision source
//!
//! Every random choice the pass makes goes through [`Noise`], in a fixed
//! order, so a seed fully determines the output.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ruido_ir::{Literal, ValueType};

pub struct Noise {
    rng: StdRng,
}

impl Noise {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    /// True with probability `percent / 100`
    pub fn chance(&mut self, percent: u32) -> bool {
        self.rng.gen_range(0..100) < percent
    }

    /// Uniform value in `0..bound`
    pub fn pick(&mut self, bound: usize) -> usize {
        assert!(bound > 0, "pick from an empty range");
        self.rng.gen_range(0..bound)
    }

    /// Uniform element of a non-empty slice
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.pick(items.len())]
    }

    /// Random constant of a concrete type
    ///
    /// Floats are drawn from small integers so they print and parse back
    /// to the same bits.
    pub fn literal(&mut self, ty: ValueType) -> Option<Literal> {
        let literal = match ty {
            ValueType::I32 => Literal::I32(self.rng.gen_range(-100..=100)),
            ValueType::I64 => Literal::I64(self.rng.gen_range(-10_000..=10_000)),
            ValueType::F32 => Literal::f32(self.rng.gen_range(-100..=100) as f32),
            ValueType::F64 => Literal::f64(self.rng.gen_range(-10_000..=10_000) as f64),
            ValueType::None | ValueType::Unreachable => return None,
        };
        Some(literal)
    }
}
