//! User-visible notifications recorded by the cart store.

use crate::promo::{PromoCode, PromoError, PromoKind};
use crate::{LineItem, ProductSnapshot};
use serde::Serialize;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Added,
    Removed,
    Cleared,
    OutOfStock,
    AddFailed,
    AddCancelled,
    PromoApplied,
    PromoRejected,
}

impl NoticeKind {
    #[must_use]
    pub fn severity(self) -> Severity {
        match self {
            Self::OutOfStock | Self::AddFailed | Self::PromoRejected => Severity::Destructive,
            _ => Severity::Info,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Destructive,
}

/// A toast-style notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub severity: Severity,
    pub title: String,
    pub description: String,
}

impl Notice {
    #[must_use]
    pub fn new(kind: NoticeKind, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            title: title.into(),
            description: description.into(),
        }
    }

    #[must_use]
    pub fn added(product: &ProductSnapshot) -> Self {
        Self::new(
            NoticeKind::Added,
            "Added to cart",
            format!("{} has been added to your cart.", product.name),
        )
    }

    #[must_use]
    pub fn removed(item: &LineItem) -> Self {
        Self::new(
            NoticeKind::Removed,
            "Removed from cart",
            format!("{} has been removed from your cart.", item.name),
        )
    }

    #[must_use]
    pub fn cleared() -> Self {
        Self::new(
            NoticeKind::Cleared,
            "Cart cleared",
            "All items have been removed from your cart.",
        )
    }

    #[must_use]
    pub fn out_of_stock(product: &ProductSnapshot) -> Self {
        Self::new(
            NoticeKind::OutOfStock,
            "Out of stock",
            format!("{} is out of stock.", product.name),
        )
    }

    /// The lookup failed. The reason stays in logs, not in the toast.
    #[must_use]
    pub fn add_failed() -> Self {
        Self::new(
            NoticeKind::AddFailed,
            "Failed to add to cart",
            "Something went wrong while adding the item to your cart.",
        )
    }

    /// The cart changed while the lookup was in flight, so the add was dropped.
    #[must_use]
    pub fn add_cancelled() -> Self {
        Self::new(
            NoticeKind::AddCancelled,
            "Not added to cart",
            "Your cart changed before the item could be added. Please try again.",
        )
    }

    #[must_use]
    pub fn promo_applied(promo: &PromoCode) -> Self {
        let description = match promo.kind {
            PromoKind::Percentage(percent) => {
                format!("{}% discount applied to your order.", percent)
            }
            PromoKind::Fixed(amount) => format!("KSH{} discount applied to your order.", amount),
        };
        Self::new(NoticeKind::PromoApplied, "Promo code applied!", description)
    }

    #[must_use]
    pub fn promo_rejected(error: &PromoError) -> Self {
        Self::new(NoticeKind::PromoRejected, "Promo not applied", error.to_string())
    }

}
