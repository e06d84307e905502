//! Seeded cosmetic perturbation between forecast steps.
//!
//! Repeated model calls on a slowly changing input tend to return visually
//! identical values for every step. The loop multiplies steps after the first
//! by a small factor drawn from a generator seeded with `base_seed + step`, so
//! the same request always yields the same numbers. It carries no statistical
//! meaning and can be switched off.

use rand::prelude::*;
use rand::rngs::StdRng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JitterPolicy {
    pub enabled: bool,
    pub base_seed: u64,
    /// Maximum relative perturbation (0.03 = ±3%).
    pub amplitude: f64,
}

impl Default for JitterPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            base_seed: 42,
            amplitude: 0.03,
        }
    }
}

impl JitterPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Multiplicative factor for `step` (always 1.0 for step 0 or when disabled).
    pub fn factor(&self, step: usize) -> f64 {
        let amplitude = self.amplitude.abs();
        if !self.enabled || step == 0 || amplitude == 0.0 || !amplitude.is_finite() {
            return 1.0;
        }
        let mut rng = StdRng::seed_from_u64(self.base_seed.wrapping_add(step as u64));
        1.0 + rng.gen_range(-amplitude..=amplitude)
    }
}
