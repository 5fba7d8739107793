use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::clock::{Clock, SystemClock};
use crate::errors::ServiceError;
use crate::promo::domain::{ApplyResult, InvalidReason, PromoCode, ValidationResult};
use crate::promo::sample::{self, RandomSource};
use crate::storage::{get_json, set_json, KvStore};

enum Lookup {
    Redeemable(PromoCode),
    Rejected(InvalidReason),
}

/// Validates and redeems promo codes stored one per key.
#[derive(Clone)]
pub struct PromoService {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
}

impl PromoService {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    async fn lookup(&self, input: &str) -> Result<Lookup, ServiceError> {
        let key = PromoCode::key_for(input);
        let Some(code) = get_json::<PromoCode>(self.store.as_ref(), &key).await? else {
            return Ok(Lookup::Rejected(InvalidReason::UnknownCode));
        };
        Ok(match code.check(self.clock.now()) {
            Some(reason) => Lookup::Rejected(reason),
            None => Lookup::Redeemable(code),
        })
    }

    /// Check a presented code without changing anything.
    #[instrument(skip(self))]
    pub async fn validate(&self, input: &str) -> Result<ValidationResult, ServiceError> {
        Ok(match self.lookup(input).await? {
            Lookup::Redeemable(code) => ValidationResult::valid(input, code.discount),
            Lookup::Rejected(reason) => ValidationResult::invalid(input, reason),
        })
    }

    /// Redeem a code: mark it used and return its discount. A second apply
    /// on the same code is rejected as already used.
    #[instrument(skip(self))]
    pub async fn apply(&self, input: &str) -> Result<ApplyResult, ServiceError> {
        let mut code = match self.lookup(input).await? {
            Lookup::Redeemable(code) => code,
            Lookup::Rejected(reason) => {
                return Ok(ValidationResult::invalid(input, reason).into());
            }
        };
        code.used = true;
        set_json(self.store.as_ref(), &PromoCode::key_for(input), &code).await?;
        info!(code = %code.code, discount = code.discount, "promo_code_applied");
        Ok(ValidationResult::valid(input, code.discount).into())
    }

    /// Write each code under its lower-cased key. Writes are independent:
    /// if one fails, the codes before it stay written.
    pub async fn store_all(&self, codes: &[PromoCode]) -> Result<(), ServiceError> {
        for (written, code) in codes.iter().enumerate() {
            if let Err(e) = set_json(self.store.as_ref(), &code.key(), code).await {
                warn!(written, total = codes.len(), error = %e, "storing promo codes stopped early");
                return Err(e);
            }
        }
        Ok(())
    }

    /// `n` fresh codes relative to this service's clock.
    pub fn generate_sample(&self, n: usize, rng: &dyn RandomSource) -> Vec<PromoCode> {
        sample::generate(n, self.clock.now(), rng)
    }

    /// Generate and persist `n` codes, returning them.
    #[instrument(skip(self, rng))]
    pub async fn seed(&self, n: usize, rng: &dyn RandomSource) -> Result<Vec<PromoCode>, ServiceError> {
        let codes = self.generate_sample(n, rng);
        self.store_all(&codes).await?;
        info!(count = codes.len(), "promo_codes_seeded");
        Ok(codes)
    }
}
