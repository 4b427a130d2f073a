//! # Checkout
//!
//! Checkout total derivation, checkout form validation and the order
//! payload handed to the orders API.
//!
//! Payment itself is out of scope: this module only decides what the
//! customer would pay and whether the form is complete enough to submit.

use crate::promo::PromoCode;
use crate::{Money, ProductId};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

// =============================================================================
// PRICING
// =============================================================================

/// Shipping and tax rules applied on top of the discounted subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingPolicy {
    /// Flat shipping fee charged below the free-shipping threshold.
    pub shipping_fee: Money,
    /// Orders with a subtotal strictly above this ship free.
    pub free_shipping_over: Money,
    /// Tax in basis points (1/100 of a percent) of the discounted subtotal.
    pub tax_basis_points: u32,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            shipping_fee: Money::ZERO,
            free_shipping_over: Money::from_major(5000),
            tax_basis_points: 0,
        }
    }
}

impl PricingPolicy {
    #[must_use]
    pub fn shipping_for(&self, subtotal: Money) -> Money {
        if subtotal > self.free_shipping_over {
            Money::ZERO
        } else {
            self.shipping_fee
        }
    }

    #[must_use]
    pub fn tax_for(&self, taxable: Money) -> Money {
        taxable.scale(self.tax_basis_points, 10_000)
    }
}

/// Totals shown on the checkout page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutSummary {
    pub subtotal: Money,
    pub promo_code: Option<String>,
    pub discount: Money,
    pub discounted_subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}

impl CheckoutSummary {
    #[must_use]
    pub fn compute(subtotal: Money, promo: Option<&PromoCode>, policy: &PricingPolicy) -> Self {
        let discount = promo.map_or(Money::ZERO, |p| p.discount_for(subtotal));
        let discounted_subtotal = subtotal.saturating_sub(discount).non_negative();
        let shipping = policy.shipping_for(subtotal);
        let tax = policy.tax_for(discounted_subtotal);
        let total = discounted_subtotal.saturating_add(shipping).saturating_add(tax);

        Self {
            subtotal,
            promo_code: promo
                .filter(|p| p.qualifies(subtotal))
                .map(|p| p.code.clone()),
            discount,
            discounted_subtotal,
            shipping,
            tax,
            total,
        }
    }
}

// =============================================================================
// ORDER PAYLOAD
// =============================================================================

/// One `{product_id, quantity}` entry of `POST /orders`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub items: Vec<OrderLine>,
}

// =============================================================================
// CHECKOUT FORM
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Mpesa,
    Card,
}

/// Why a checkout form cannot be submitted. The first failing check wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("Missing email")]
    MissingEmail,

    #[error("Missing name")]
    MissingName,

    #[error("Missing address")]
    MissingAddress,

    #[error("Complete your address")]
    IncompleteAddress,

    #[error("Invalid M-PESA number")]
    InvalidMpesaNumber,

    #[error("Invalid card details")]
    InvalidCardDetails,
}

/// Contact, shipping and payment details entered at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckoutForm {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub county: String,
    pub zip_code: String,
    pub payment_method: PaymentMethod,
    pub mpesa_phone: String,
    pub card_number: String,
    pub name_on_card: String,
    pub expiry_date: String,
    pub cvv: String,
}

impl CheckoutForm {
    pub fn validate(&self) -> Result<(), CheckoutError> {
        let blank = |s: &str| s.trim().is_empty();

        if blank(&self.email) {
            return Err(CheckoutError::MissingEmail);
        }
        if blank(&self.first_name) || blank(&self.last_name) {
            return Err(CheckoutError::MissingName);
        }
        if blank(&self.address) {
            return Err(CheckoutError::MissingAddress);
        }
        if blank(&self.city) || blank(&self.county) || blank(&self.zip_code) {
            return Err(CheckoutError::IncompleteAddress);
        }

        match self.payment_method {
            PaymentMethod::Mpesa if !MPESA_NUMBER.is_match(&self.mpesa_phone) => {
                Err(CheckoutError::InvalidMpesaNumber)
            }
            PaymentMethod::Card if !self.card_is_plausible() => {
                Err(CheckoutError::InvalidCardDetails)
            }
            _ => Ok(()),
        }
    }

    fn card_is_plausible(&self) -> bool {
        let digits: String = self
            .card_number
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        CARD_NUMBER.is_match(&digits)
            && !self.name_on_card.trim().is_empty()
            && EXPIRY.is_match(&self.expiry_date)
            && CVV.is_match(&self.cvv)
    }
}

/// `254` followed by exactly nine digits.
static MPESA_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^254[0-9]{9}$").expect("valid M-PESA number regex"));

/// Card number with whitespace removed.
static CARD_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{12,}$").expect("valid card number regex"));

/// `MM/YY` with a month of 01 through 12.
static EXPIRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0[1-9]|1[0-2])/[0-9]{2}$").expect("valid expiry regex"));

static CVV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{3,4}$").expect("valid CVV regex"));

// =============================================================================
// TESTS
// =============================================================================
