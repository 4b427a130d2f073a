//! # Promo Codes
//!
//! Client-recognized discount tokens matched against a static catalog.
//!
//! Promos only affect the displayed checkout total. They are never part of
//! the persisted cart.

use crate::Money;
use serde::Serialize;
use thiserror::Error;

/// Why a code was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromoError {
    #[error("Invalid promo code. Please try another code.")]
    Unknown(String),

    #[error("This promo code requires a minimum order of KSH{minimum}")]
    MinimumNotMet { minimum: Money },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PromoKind {
    /// Whole percent off the subtotal.
    Percentage(u32),
    /// Flat amount off the subtotal.
    Fixed(Money),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromoCode {
    pub code: String,
    pub kind: PromoKind,
    pub min_order: Option<Money>,
}

impl PromoCode {
    #[must_use]
    pub fn percentage(code: impl Into<String>, percent: u32) -> Self {
        Self {
            code: code.into(),
            kind: PromoKind::Percentage(percent.min(100)),
            min_order: None,
        }
    }

    #[must_use]
    pub fn fixed(code: impl Into<String>, amount: Money) -> Self {
        Self {
            code: code.into(),
            kind: PromoKind::Fixed(amount.non_negative()),
            min_order: None,
        }
    }

    #[must_use]
    pub fn with_min_order(mut self, minimum: Money) -> Self {
        self.min_order = Some(minimum);
        self
    }

    #[must_use]
    pub fn matches(&self, code: &str) -> bool {
        self.code.eq_ignore_ascii_case(code.trim())
    }

    #[must_use]
    pub fn qualifies(&self, subtotal: Money) -> bool {
        self.min_order.is_none_or(|minimum| subtotal >= minimum)
    }

    /// Discount this code grants on `subtotal`.
    ///
    /// Zero when the minimum order is not met. Never exceeds the subtotal.
    #[must_use]
    pub fn discount_for(&self, subtotal: Money) -> Money {
        if !self.qualifies(subtotal) {
            return Money::ZERO;
        }
        let subtotal = subtotal.non_negative();
        let discount = match self.kind {
            PromoKind::Percentage(percent) => subtotal.percent(percent),
            PromoKind::Fixed(amount) => amount,
        };
        discount.min(subtotal)
    }
}

/// The set of codes the storefront recognizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoCatalog {
    codes: Vec<PromoCode>,
}

impl Default for PromoCatalog {
    fn default() -> Self {
        Self::new(vec![
            PromoCode::percentage("WELCOME10", 10),
            PromoCode::percentage("SAVE20", 20).with_min_order(Money::from_major(50)),
            PromoCode::fixed("FREESHIP", Money::from_cents(599)),
            PromoCode::fixed("SWEET5", Money::from_major(5)),
        ])
    }
}

impl PromoCatalog {
    #[must_use]
    pub fn new(codes: Vec<PromoCode>) -> Self {
        Self { codes }
    }

    pub fn codes(&self) -> &[PromoCode] {
        &self.codes
    }

    /// Case-insensitive lookup.
    #[must_use]
    pub fn find(&self, code: &str) -> Option<&PromoCode> {
        self.codes.iter().find(|promo| promo.matches(code))
    }

    /// Validate `code` against the current subtotal.
    pub fn apply(&self, code: &str, subtotal: Money) -> Result<&PromoCode, PromoError> {
        let promo = self
            .find(code)
            .ok_or_else(|| PromoError::Unknown(code.trim().to_string()))?;
        match promo.min_order {
            Some(minimum) if subtotal < minimum => Err(PromoError::MinimumNotMet { minimum }),
            _ => Ok(promo),
        }
    }
}
