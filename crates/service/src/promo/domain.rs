use std::fmt;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discounts are drawn from `[0, MAX_DISCOUNT)`.
pub const MAX_DISCOUNT: f32 = 0.35;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PromoCode {
    pub code: String,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub discount: f32,
    pub used: bool,
}

impl PromoCode {
    /// Fresh unused code; both window bounds are truncated to midnight UTC.
    pub fn new(valid_from: DateTime<Utc>, valid_to: DateTime<Utc>, discount: f32) -> Self {
        Self {
            code: Uuid::new_v4().to_string(),
            valid_from: truncate_to_day(valid_from),
            valid_to: truncate_to_day(valid_to),
            discount,
            used: false,
        }
    }

    /// Store key for a presented code; lookups are case-insensitive.
    pub fn key_for(input: &str) -> String {
        input.to_lowercase()
    }

    pub fn key(&self) -> String {
        Self::key_for(&self.code)
    }

    /// Why this code cannot be redeemed at `now`, or `None` when it can.
    /// The window is half-open: `valid_from <= now < valid_to`.
    pub fn check(&self, now: DateTime<Utc>) -> Option<InvalidReason> {
        if self.used {
            Some(InvalidReason::AlreadyUsed)
        } else if now < self.valid_from {
            Some(InvalidReason::NotYetActive)
        } else if now >= self.valid_to {
            Some(InvalidReason::Expired)
        } else {
            None
        }
    }
}

pub fn truncate_to_day(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.date_naive().and_time(NaiveTime::MIN).and_utc()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidReason {
    UnknownCode,
    AlreadyUsed,
    NotYetActive,
    Expired,
}

impl InvalidReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidReason::UnknownCode => "Invalid code presented",
            InvalidReason::AlreadyUsed => "Code has already been used",
            InvalidReason::NotYetActive => "Code is not active yet",
            InvalidReason::Expired => "Code has expired",
        }
    }
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of `validate`. `reason` is always present, empty when valid.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ValidationResult {
    pub code: String,
    #[serde(rename = "isValid")]
    pub valid: bool,
    #[serde(default)]
    pub reason: String,
    pub discount: f32,
}

impl ValidationResult {
    pub fn valid(input: &str, discount: f32) -> Self {
        Self { code: input.to_string(), valid: true, reason: String::new(), discount }
    }

    pub fn invalid(input: &str, reason: InvalidReason) -> Self {
        Self { code: input.to_string(), valid: false, reason: reason.to_string(), discount: 0.0 }
    }
}

/// Outcome of `apply`. `reason` is left out of the JSON when empty.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ApplyResult {
    pub code: String,
    #[serde(rename = "isValid")]
    pub valid: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    pub discount: f32,
}

impl From<ValidationResult> for ApplyResult {
    fn from(v: ValidationResult) -> Self {
        Self { code: v.code, valid: v.valid, reason: v.reason, discount: v.discount }
    }
}
