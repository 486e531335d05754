//! Per-battle seeded randomness
//!
//! One generator owned by the battle, seeded at creation and threaded
//! explicitly into adherence and damage draws. Never reseeded mid-battle:
//! replaying the log must reproduce the same snapshot without consulting
//! the generator at all (events record resolved outcomes).

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// The battle's single random source
#[derive(Debug, Clone)]
pub struct BattleRng {
    rng: ChaCha8Rng,
    seed: u64,
}

impl BattleRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// The seed this battle was created with
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform adherence roll in [0, 100)
    pub fn adherence_roll(&mut self) -> u8 {
        self.rng.gen_range(0..100)
    }

    /// Additive damage variance in [0, max] inclusive
    pub fn damage_variance(&mut self, max: i32) -> i32 {
        if max <= 0 {
            return 0;
        }
        self.rng.gen_range(0..=max)
    }

    /// Critical hit check against a percent chance
    pub fn crit_check(&mut self, chance_percent: u8) -> bool {
        self.rng.gen_range(0u8..100) < chance_percent
    }
}
