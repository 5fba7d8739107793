use std::sync::Mutex;

use chrono::{DateTime, Duration, Months, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::promo::domain::{truncate_to_day, PromoCode, MAX_DISCOUNT};

/// Days after today within which a generated code may start.
pub const START_WINDOW_DAYS: u32 = 30;
/// Length of a generated code's validity window.
pub const VALIDITY_MONTHS: u32 = 6;

/// Randomness used when generating sample codes.
pub trait RandomSource: Send + Sync {
    /// Uniform integer in `0..upper`.
    fn below(&self, upper: u32) -> u32;
    /// Uniform float in `[0, upper)`.
    fn fraction_below(&self, upper: f32) -> f32;
}

/// Process randomness via `rand::thread_rng`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn below(&self, upper: u32) -> u32 {
        rand::thread_rng().gen_range(0..upper)
    }

    fn fraction_below(&self, upper: f32) -> f32 {
        rand::thread_rng().gen_range(0.0..upper)
    }
}

/// Reproducible randomness for tests and fixtures.
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        match self.rng.lock() {
            Ok(mut rng) => f(&mut rng),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

impl RandomSource for SeededRandom {
    fn below(&self, upper: u32) -> u32 {
        self.with_rng(|rng| rng.gen_range(0..upper))
    }

    fn fraction_below(&self, upper: f32) -> f32 {
        self.with_rng(|rng| rng.gen_range(0.0..upper))
    }
}

/// Generate `n` unused codes starting within the next month, each valid for six months.
pub fn generate(n: usize, now: DateTime<Utc>, rng: &dyn RandomSource) -> Vec<PromoCode> {
    let today = truncate_to_day(now);
    (0..n)
        .map(|_| {
            let valid_from = today + Duration::days(i64::from(rng.below(START_WINDOW_DAYS)));
            let valid_to = valid_from
                .checked_add_months(Months::new(VALIDITY_MONTHS))
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            PromoCode::new(valid_from, valid_to, rng.fraction_below(MAX_DISCOUNT))
        })
        .collect()
}
