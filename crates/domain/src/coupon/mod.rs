//! Coupons and the discount evaluator.

mod evaluator;

pub use evaluator::{CouponEvaluation, CouponOutcome, evaluate};

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use common::CouponId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::Money;

/// Errors raised when building a coupon.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CouponError {
    #[error("Coupon code is required")]
    EmptyCode,

    #[error("Invalid discount value {value} (must be greater than 0)")]
    InvalidDiscount { value: f64 },

    #[error("Invalid percentage {value} (must not exceed 100)")]
    PercentageTooLarge { value: f64 },

    #[error("Invalid minimum purchase {value} (must not be negative)")]
    InvalidMinimum { value: i64 },

    #[error("Invalid expiry date '{0}': expected an RFC 3339 timestamp")]
    InvalidExpiry(String),
}

/// Case-normalized coupon code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CouponCode(String);

impl CouponCode {
    /// Trims and upper-cases `raw`.
    pub fn normalize(raw: &str) -> Result<Self, CouponError> {
        let code = raw.trim().to_uppercase();
        if code.is_empty() {
            return Err(CouponError::EmptyCode);
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CouponCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How much a coupon takes off.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Discount {
    /// Flat amount off.
    Fixed(Money),
    /// Percent of the cart total.
    Percentage(f64),
}

impl Discount {
    /// Discount granted on `cart_total`.
    pub fn amount_for(&self, cart_total: Money) -> Money {
        match *self {
            Discount::Fixed(amount) => amount,
            Discount::Percentage(percent) => cart_total.percent(percent),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Discount::Fixed(_) => "fixed",
            Discount::Percentage(_) => "percentage",
        }
    }

    fn validate(&self) -> Result<(), CouponError> {
        match *self {
            Discount::Fixed(amount) if !amount.is_positive() => Err(CouponError::InvalidDiscount {
                value: amount.minor() as f64,
            }),
            Discount::Percentage(percent) if !(percent > 0.0) => {
                Err(CouponError::InvalidDiscount { value: percent })
            }
            Discount::Percentage(percent) if percent > 100.0 => {
                Err(CouponError::PercentageTooLarge { value: percent })
            }
            _ => Ok(()),
        }
    }
}

/// A discount coupon.
///
/// `expiry_date` is kept as the stored string; [`Coupon::expires_at`]
/// interprets it at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: CouponId,
    pub code: CouponCode,
    pub discount: Discount,
    #[serde(default)]
    pub min_purchase: Money,
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

fn active_by_default() -> bool {
    true
}

impl Coupon {
    /// Validates and builds a new active coupon.
    pub fn create(
        code: &str,
        discount: Discount,
        min_purchase: Money,
        expiry_date: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self, CouponError> {
        let code = CouponCode::normalize(code)?;
        discount.validate()?;

        if min_purchase.is_negative() {
            return Err(CouponError::InvalidMinimum {
                value: min_purchase.minor(),
            });
        }

        let expiry_date = match expiry_date.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => {
                let parsed =
                    parse_expiry(raw).ok_or_else(|| CouponError::InvalidExpiry(raw.to_string()))?;
                Some(parsed.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            None => None,
        };

        Ok(Self {
            id: CouponId::new(),
            code,
            discount,
            min_purchase,
            expiry_date,
            is_active: true,
            created_at: now,
        })
    }

    /// Parsed expiry.
    ///
    /// A stored value that does not parse counts as "no expiry".
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.expiry_date.as_deref()?;
        let parsed = parse_expiry(raw);
        if parsed.is_none() {
            tracing::warn!(code = %self.code, expiry = raw, "unparseable coupon expiry, treating as no expiry");
        }
        parsed
    }
}

fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
