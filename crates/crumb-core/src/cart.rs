//! # Cart
//!
//! The cart reducer and its derived totals.
//!
//! Every mutation goes through [`Cart::apply`], and every `apply` ends with a
//! full [`recompute`]. Totals are never bookkept incrementally, so they
//! cannot drift from the item list.
//!
//! Invariants held after every `apply`:
//! - `total == Σ price × quantity`
//! - `item_count == Σ quantity`
//! - no two items share an id, and no item has quantity 0

use crate::checkout::OrderLine;
use crate::{LineItem, Money, ProductId, ProductSnapshot};
use serde::Serialize;

// =============================================================================
// DERIVED TOTALS
// =============================================================================

/// Totals derived from the item list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    pub total: Money,
    pub item_count: u64,
}

/// Recompute totals from scratch over `items`.
///
/// O(n) per call; carts hold a few dozen lines at most.
#[must_use]
pub fn recompute(items: &[LineItem]) -> CartTotals {
    items.iter().fold(CartTotals::default(), |acc, item| CartTotals {
        total: acc.total.saturating_add(item.line_total()),
        item_count: acc.item_count.saturating_add(u64::from(item.quantity)),
    })
}

// =============================================================================
// ACTIONS
// =============================================================================

/// A cart mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Increment the product's line, or append it with quantity 1.
    AddItem(ProductSnapshot),
    /// Drop the line with this id. Absent ids are a no-op.
    RemoveItem(ProductId),
    /// Set a line's quantity. Non-positive quantities remove the line.
    UpdateQuantity { id: ProductId, quantity: i64 },
    /// Drop every line.
    Clear,
    /// Replace the item list, e.g. when rehydrating from storage.
    Load(Vec<LineItem>),
}

// =============================================================================
// CART
// =============================================================================

/// Ordered list of line items plus derived totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cart {
    items: Vec<LineItem>,
    #[serde(flatten)]
    totals: CartTotals,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cart from a possibly untrusted item list.
    ///
    /// Lines with quantity 0 are dropped. Repeated ids are merged into the
    /// first occurrence with quantities summed.
    #[must_use]
    pub fn from_items(items: Vec<LineItem>) -> Self {
        let mut cart = Self::new();
        cart.apply(CartAction::Load(items));
        cart
    }

    /// Apply an action and recompute totals.
    ///
    /// Returns `true` if the item list changed.
    pub fn apply(&mut self, action: CartAction) -> bool {
        let changed = match action {
            CartAction::AddItem(product) => {
                if let Some(item) = self.items.iter_mut().find(|i| i.id == product.id) {
                    item.quantity = item.quantity.saturating_add(1);
                } else {
                    self.items.push(LineItem::from_product(&product));
                }
                true
            }
            CartAction::RemoveItem(id) => self.remove_line(id),
            CartAction::UpdateQuantity { id, quantity } => {
                if quantity <= 0 {
                    self.remove_line(id)
                } else {
                    let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
                    match self.items.iter_mut().find(|i| i.id == id) {
                        Some(item) if item.quantity != quantity => {
                            item.quantity = quantity;
                            true
                        }
                        _ => false,
                    }
                }
            }
            CartAction::Clear => {
                let changed = !self.items.is_empty();
                self.items.clear();
                changed
            }
            CartAction::Load(items) => {
                let normalized = normalize(items);
                let changed = normalized != self.items;
                self.items = normalized;
                changed
            }
        };

        self.totals = recompute(&self.items);
        changed
    }

    fn remove_line(&mut self, id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    #[must_use]
    pub fn totals(&self) -> CartTotals {
        self.totals
    }

    #[must_use]
    pub fn total(&self) -> Money {
        self.totals.total
    }

    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.totals.item_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Quantity of a product in the cart, 0 when absent.
    #[must_use]
    pub fn item_quantity(&self, id: ProductId) -> u32 {
        self.get(id).map(|item| item.quantity).unwrap_or(0)
    }

    /// The `POST /orders` line payload for this cart.
    #[must_use]
    pub fn order_lines(&self) -> Vec<OrderLine> {
        self.items
            .iter()
            .map(|item| OrderLine {
                product_id: item.id,
                quantity: item.quantity,
            })
            .collect()
    }
}

fn normalize(items: Vec<LineItem>) -> Vec<LineItem> {
    let mut out: Vec<LineItem> = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity == 0 {
            continue;
        }
        if let Some(existing) = out.iter_mut().find(|i| i.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            out.push(item);
        }
    }
    out
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use proptest::prelude::*;

    fn product(id: u64, cents: i64) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId(id),
            name: format!("Product {id}"),
            price: Money::from_cents(cents),
            image: String::new(),
            category_name: "Bakery".to_string(),
            stock: Some(10),
        }
    }

    fn line(id: u64, cents: i64, quantity: u32) -> LineItem {
        LineItem {
            quantity,
            ..LineItem::from_product(&product(id, cents))
        }
    }

    #[test]
    fn adding_twice_increments_instead_of_duplicating() {
        let mut cart = Cart::new();
        cart.apply(CartAction::AddItem(product(1, 499)));
        cart.apply(CartAction::AddItem(product(1, 499)));

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.item_quantity(ProductId(1)), 2);
        assert_eq!(cart.total(), Money::from_cents(998));
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn add_keeps_insertion_order() {
        let mut cart = Cart::new();
        cart.apply(CartAction::AddItem(product(3, 100)));
        cart.apply(CartAction::AddItem(product(1, 100)));
        cart.apply(CartAction::AddItem(product(3, 100)));

        let ids: Vec<_> = cart.items().iter().map(|i| i.id.0).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn croissant_quantity_update() {
        let mut cart = Cart::from_items(vec![LineItem {
            name: "Croissant".to_string(),
            ..line(1, 499, 2)
        }]);

        cart.apply(CartAction::UpdateQuantity {
            id: ProductId(1),
            quantity: 5,
        });

        assert_eq!(cart.total(), Money::from_cents(2495));
        assert_eq!(cart.total().to_string(), "24.95");
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn zero_or_negative_quantity_removes() {
        for quantity in [0, -1] {
            let mut cart = Cart::from_items(vec![line(1, 100, 3), line(2, 200, 1)]);
            let changed = cart.apply(CartAction::UpdateQuantity {
                id: ProductId(1),
                quantity,
            });
            assert!(changed);
            assert_eq!(cart.item_quantity(ProductId(1)), 0);
            assert_eq!(cart.items().len(), 1);
            assert_eq!(cart.total(), Money::from_cents(200));
        }
    }

    #[test]
    fn update_absent_id_is_noop() {
        let mut cart = Cart::from_items(vec![line(1, 100, 1)]);
        let before = cart.clone();
        assert!(!cart.apply(CartAction::UpdateQuantity {
            id: ProductId(9),
            quantity: 4,
        }));
        assert_eq!(cart, before);
    }

    #[test]
    fn remove_absent_id_is_noop() {
        let mut cart = Cart::from_items(vec![line(1, 100, 2)]);
        let before = cart.clone();
        assert!(!cart.apply(CartAction::RemoveItem(ProductId(42))));
        assert_eq!(cart, before);
    }

    #[test]
    fn huge_quantity_saturates() {
        let mut cart = Cart::from_items(vec![line(1, 100, 1)]);
        cart.apply(CartAction::UpdateQuantity {
            id: ProductId(1),
            quantity: i64::MAX,
        });
        assert_eq!(cart.item_quantity(ProductId(1)), u32::MAX);
        assert_eq!(cart.item_count(), u64::from(u32::MAX));
    }

    #[test]
    fn clear_empties_and_zeroes_totals() {
        let mut cart = Cart::from_items(vec![line(1, 100, 2), line(2, 50, 1)]);
        assert!(cart.apply(CartAction::Clear));
        assert!(cart.is_empty());
        assert_eq!(cart.totals(), CartTotals::default());
        assert!(!cart.apply(CartAction::Clear));
    }

    #[test]
    fn load_merges_duplicates_and_drops_zero_lines() {
        let cart = Cart::from_items(vec![line(1, 100, 2), line(2, 50, 0), line(1, 100, 3)]);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.item_quantity(ProductId(1)), 5);
        assert_eq!(cart.total(), Money::from_cents(500));
    }

    #[test]
    fn order_lines_follow_cart_order() {
        let cart = Cart::from_items(vec![line(4, 100, 2), line(2, 50, 1)]);
        let lines = cart.order_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].product_id, ProductId(4));
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[1].product_id, ProductId(2));
    }

    #[test]
    fn serializes_items_with_totals() {
        let cart = Cart::from_items(vec![line(1, 499, 2)]);
        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json["total"], "9.98");
        assert_eq!(json["item_count"], 2);
        assert_eq!(json["items"][0]["quantity"], 2);
    }

    // =========================================================================
    // PROPERTY TESTS
    // =========================================================================

    fn arb_action() -> impl Strategy<Value = CartAction> {
        prop_oneof![
            (0u64..6, 1i64..2_000).prop_map(|(id, cents)| CartAction::AddItem(product(id, cents))),
            (0u64..6).prop_map(|id| CartAction::RemoveItem(ProductId(id))),
            (0u64..6, -3i64..50).prop_map(|(id, quantity)| CartAction::UpdateQuantity {
                id: ProductId(id),
                quantity
            }),
            Just(CartAction::Clear),
        ]
    }

    proptest! {
        #[test]
        fn totals_match_items_after_every_action(actions in prop::collection::vec(arb_action(), 0..64)) {
            let mut cart = Cart::new();
            for action in actions {
                cart.apply(action);

                let expected_total = cart
                    .items()
                    .iter()
                    .fold(0i64, |acc, i| acc + i.price.cents() * i64::from(i.quantity));
                let expected_count: u64 = cart.items().iter().map(|i| u64::from(i.quantity)).sum();

                prop_assert_eq!(cart.total().cents(), expected_total);
                prop_assert_eq!(cart.item_count(), expected_count);

                let mut ids: Vec<_> = cart.items().iter().map(|i| i.id).collect();
                ids.sort();
                ids.dedup();
                prop_assert_eq!(ids.len(), cart.items().len());
                prop_assert!(cart.items().iter().all(|i| i.quantity > 0));
            }
        }
    }
}
