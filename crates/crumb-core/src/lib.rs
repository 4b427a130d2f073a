//! # Crumb Core
//!
//! The deterministic shopping-cart engine behind the Crumb storefront.
//!
//! The storefront delegates inventory, pricing and payment to a remote API.
//! What stays on the client is the cart: an ordered list of line items with
//! derived totals, promo-code discounting and checkout totals, persisted
//! across restarts.
//!
//! ## Design Principles
//!
//! - No floats: every amount is a [`Money`] in integer minor units
//! - Totals are derived: [`cart::recompute`] runs after every mutation
//! - No network, no async: remote lookups happen in `crumb-client`
//!   and are handed to [`store::CartStore::finish_add`]

pub mod cart;
pub mod checkout;
pub mod error;
pub mod formats;
pub mod money;
pub mod notice;
pub mod promo;
pub mod storage;
pub mod store;

pub use cart::{Cart, CartAction, CartTotals, recompute};
pub use checkout::{
    CheckoutError, CheckoutForm, CheckoutSummary, OrderLine, OrderRequest, PaymentMethod,
    PricingPolicy,
};
pub use error::{CartError, StorageError};
pub use money::{Money, MoneyError};
pub use notice::{Notice, NoticeKind, Severity};
pub use promo::{PromoCatalog, PromoCode, PromoError, PromoKind};
pub use storage::{CartStorage, FileStorage, MemoryStorage, RedbStorage};
pub use store::{AddOutcome, AddTicket, CartStore};

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Product identifier assigned by the remote catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ProductId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

// =============================================================================
// PRODUCT SNAPSHOT
// =============================================================================

/// Authoritative product data as returned by `GET /products/{id}`.
///
/// Only the fields the cart needs are kept; anything else the API sends
/// (description, rating, timestamps) is ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category_name: String,
    /// Units in stock. `None` when the API does not report stock.
    #[serde(default)]
    pub stock: Option<i64>,
}

impl ProductSnapshot {
    /// Whether the product can be added to a cart.
    ///
    /// Unknown stock counts as available.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.stock.is_none_or(|stock| stock > 0)
    }
}

// =============================================================================
// LINE ITEM
// =============================================================================

/// One product-and-quantity entry in the cart.
///
/// Owned by the cart. Only `quantity` changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub quantity: u32,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category_name: String,
}

impl LineItem {
    /// New line for a product with quantity 1.
    #[must_use]
    pub fn from_product(product: &ProductSnapshot) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            quantity: 1,
            image: product.image.clone(),
            category_name: product.category_name.clone(),
        }
    }

    /// `price × quantity`, saturating.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price.saturating_mul(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn product(stock: Option<i64>) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId(7),
            name: "Croissant".to_string(),
            price: Money::from_cents(499),
            image: "croissant.jpg".to_string(),
            category_name: "Pastries".to_string(),
            stock,
        }
    }

    #[test]
    fn unknown_stock_is_available() {
        assert!(product(None).in_stock());
        assert!(product(Some(3)).in_stock());
        assert!(!product(Some(0)).in_stock());
        assert!(!product(Some(-2)).in_stock());
    }

    #[test]
    fn line_from_product_starts_at_one() {
        let line = LineItem::from_product(&product(Some(5)));
        assert_eq!(line.quantity, 1);
        assert_eq!(line.id, ProductId(7));
        assert_eq!(line.category_name, "Pastries");
    }

    #[test]
    fn snapshot_ignores_extra_api_fields() {
        let json = r#"{
            "id": 3, "name": "Baguette", "price": 2.5, "image": "b.jpg",
            "category_name": "Bread", "stock": 12, "rating": 4.5,
            "isActive": true, "lowStockThreshold": 10
        }"#;
        let snapshot: ProductSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.id, ProductId(3));
        assert_eq!(snapshot.price, Money::from_cents(250));
        assert_eq!(snapshot.stock, Some(12));
    }
}
