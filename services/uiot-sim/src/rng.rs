use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Shared random source for sampling and loss draws. Seeded runs are reproducible.
#[derive(Clone)]
pub struct SimRng(Arc<Mutex<StdRng>>);

impl SimRng {
    pub fn seeded(seed: u64) -> Self { Self(Arc::new(Mutex::new(StdRng::seed_from_u64(seed)))) }

    pub fn from_entropy() -> Self { Self(Arc::new(Mutex::new(StdRng::from_entropy()))) }

    pub fn new(seed: Option<u64>) -> Self { seed.map(Self::seeded).unwrap_or_else(Self::from_entropy) }

    /// Drawn uniformly from `[min, max)`, then rounded to two decimals, so the
    /// result lies in the closed range `[min, max]`.
    pub fn sample(&self, min: f64, max: f64) -> f64 {
        let v: f64 = self.0.lock().gen_range(min..max);
        (v * 100.0).round() / 100.0
    }

    /// True with probability `p`; `p >= 1.0` always hits, `p <= 0.0` never does.
    pub fn chance(&self, p: f64) -> bool {
        if p <= 0.0 { return false; }
        if p >= 1.0 { return true; }
        self.0.lock().gen::<f64>() < p
    }
}
