//! Single-use, time-windowed promo codes, one store entry per code.

pub mod domain;
pub mod sample;
pub mod service;

pub use domain::{ApplyResult, InvalidReason, PromoCode, ValidationResult, MAX_DISCOUNT};
pub use sample::{RandomSource, SeededRandom, ThreadRandom};
pub use service::PromoService;
