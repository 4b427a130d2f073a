//! # Cart Store
//!
//! Single source of truth for the in-progress order.
//!
//! The store owns a [`Cart`], a storage backend and a queue of user-visible
//! [`Notice`]s. It is constructed explicitly and handed by reference to
//! whatever needs it; there is no global instance.
//!
//! ## Adding products
//!
//! Adding needs a remote product lookup, which this crate does not perform.
//! The flow is split in two:
//!
//! 1. [`CartStore::begin_add`] issues an [`AddTicket`]
//! 2. the caller performs the lookup without holding the store
//! 3. [`CartStore::finish_add`] applies the result
//!
//! Each ticket remembers two counters: the store's epoch, bumped by clear and
//! reload, and the removal count of its own product, bumped when that line is
//! removed or set to zero. A ticket whose counters no longer match is
//! discarded as [`AddOutcome::Stale`] with an [`NoticeKind::AddCancelled`](crate::notice::NoticeKind::AddCancelled)
//! notice. A slow lookup therefore never resurrects an item the user removed
//! after clicking add, and changes to other lines do not affect it.

use crate::cart::{Cart, CartAction};
use crate::error::CartError;
use crate::notice::Notice;
use crate::storage::CartStorage;
use crate::{LineItem, Money, ProductId, ProductSnapshot};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;

/// Notices kept before the oldest is dropped.
pub const MAX_PENDING_NOTICES: usize = 64;

/// Handle for an in-flight add.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddTicket {
    product_id: ProductId,
    seq: u64,
    epoch: u64,
    removals: u64,
}

impl AddTicket {
    #[must_use]
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// Monotonic per store.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Result of completing an add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AddOutcome {
    /// The product is in the cart with this quantity.
    Added { quantity: u32 },
    /// The lookup reported no stock. Cart unchanged.
    OutOfStock,
    /// The lookup failed. Cart unchanged.
    Failed { reason: String },
    /// The cart was cleared or reloaded, or this product's line was
    /// removed, while the lookup was in flight. Cart unchanged.
    Stale,
}

/// The cart plus its persistence and notification queue.
pub struct CartStore<S: CartStorage> {
    cart: Cart,
    storage: S,
    epoch: u64,
    /// Per-product removal counts since the last epoch bump.
    removals: BTreeMap<ProductId, u64>,
    next_seq: u64,
    notices: VecDeque<Notice>,
}

impl<S: CartStorage> fmt::Debug for CartStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &self.cart)
            .field("epoch", &self.epoch)
            .field("removals", &self.removals)
            .field("pending_notices", &self.notices.len())
            .finish()
    }
}

impl<S: CartStorage> CartStore<S> {
    /// Open a store, rehydrating from `storage`.
    ///
    /// Absent, unreadable or malformed storage yields an empty cart.
    pub fn open(storage: S) -> Self {
        let cart = Cart::from_items(load_or_empty(&storage));
        Self {
            cart,
            storage,
            epoch: 0,
            removals: BTreeMap::new(),
            next_seq: 0,
            notices: VecDeque::new(),
        }
    }

    /// Re-read storage, replacing the in-memory cart. Bumps the epoch.
    pub fn reload(&mut self) {
        let items = load_or_empty(&self.storage);
        self.cart.apply(CartAction::Load(items));
        self.bump_epoch();
    }

    // =========================================================================
    // READS
    // =========================================================================

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn items(&self) -> &[LineItem] {
        self.cart.items()
    }

    #[must_use]
    pub fn total(&self) -> Money {
        self.cart.total()
    }

    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.cart.item_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    /// Quantity of a product in the cart, 0 when absent.
    #[must_use]
    pub fn item_quantity(&self, id: ProductId) -> u32 {
        self.cart.item_quantity(id)
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Start adding `id`. Perform the product lookup, then call
    /// [`Self::finish_add`] with its result.
    pub fn begin_add(&mut self, id: ProductId) -> AddTicket {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        AddTicket {
            product_id: id,
            seq,
            epoch: self.epoch,
            removals: self.removals_of(id),
        }
    }

    /// Apply a product lookup result.
    ///
    /// Lookup failures and out-of-stock products leave the cart unchanged and
    /// record a notice; they are outcomes, not errors. The only error is a
    /// failure to persist a successful add.
    pub fn finish_add<E: fmt::Display>(
        &mut self,
        ticket: AddTicket,
        lookup: Result<ProductSnapshot, E>,
    ) -> Result<AddOutcome, CartError> {
        if ticket.epoch != self.epoch || ticket.removals != self.removals_of(ticket.product_id) {
            self.notify(Notice::add_cancelled());
            return Ok(AddOutcome::Stale);
        }

        let product = match lookup {
            Ok(product) if product.id == ticket.product_id => product,
            Ok(product) => {
                self.notify(Notice::add_failed());
                return Ok(AddOutcome::Failed {
                    reason: format!(
                        "lookup for product {} returned product {}",
                        ticket.product_id, product.id
                    ),
                });
            }
            Err(e) => {
                self.notify(Notice::add_failed());
                return Ok(AddOutcome::Failed {
                    reason: e.to_string(),
                });
            }
        };

        if !product.in_stock() {
            self.notify(Notice::out_of_stock(&product));
            return Ok(AddOutcome::OutOfStock);
        }

        let notice = Notice::added(&product);
        let id = product.id;
        self.cart.apply(CartAction::AddItem(product));
        self.notify(notice);
        self.persist()?;

        Ok(AddOutcome::Added {
            quantity: self.cart.item_quantity(id),
        })
    }

    /// Add a product whose data is already at hand.
    pub fn add_product(&mut self, product: ProductSnapshot) -> Result<AddOutcome, CartError> {
        let ticket = self.begin_add(product.id);
        self.finish_add(ticket, Ok::<_, std::convert::Infallible>(product))
    }

    /// Remove a line. Returns `false` (and does nothing) if `id` is absent.
    pub fn remove(&mut self, id: ProductId) -> Result<bool, CartError> {
        let Some(item) = self.cart.get(id).cloned() else {
            return Ok(false);
        };
        self.cart.apply(CartAction::RemoveItem(id));
        self.record_removal(id);
        self.notify(Notice::removed(&item));
        self.persist()?;
        Ok(true)
    }

    /// Set a line's quantity; `quantity <= 0` removes the line.
    ///
    /// Returns whether the cart changed. Absent ids are a no-op.
    pub fn update_quantity(&mut self, id: ProductId, quantity: i64) -> Result<bool, CartError> {
        if !self.cart.apply(CartAction::UpdateQuantity { id, quantity }) {
            return Ok(false);
        }
        if quantity <= 0 {
            self.record_removal(id);
        }
        self.persist()?;
        Ok(true)
    }

    /// Empty the cart.
    pub fn clear(&mut self) -> Result<(), CartError> {
        self.cart.apply(CartAction::Clear);
        self.bump_epoch();
        self.notify(Notice::cleared());
        self.persist()
    }

    // =========================================================================
    // NOTICES
    // =========================================================================

    /// Queue a notice, dropping the oldest past [`MAX_PENDING_NOTICES`].
    pub fn notify(&mut self, notice: Notice) {
        if self.notices.len() >= MAX_PENDING_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(notice);
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    /// Drain pending notices, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn bump_epoch(&mut self) {
        self.epoch = self.epoch.saturating_add(1);
        // Every outstanding ticket is stale now, so per-product counts can restart.
        self.removals.clear();
    }

    fn record_removal(&mut self, id: ProductId) {
        let count = self.removals.entry(id).or_insert(0);
        *count = count.saturating_add(1);
    }

    fn removals_of(&self, id: ProductId) -> u64 {
        self.removals.get(&id).copied().unwrap_or(0)
    }

    fn persist(&mut self) -> Result<(), CartError> {
        self.storage.save(self.cart.items())?;
        Ok(())
    }
}

fn load_or_empty<S: CartStorage>(storage: &S) -> Vec<LineItem> {
    storage.load().ok().flatten().unwrap_or_default()
}

// =============================================================================
// TESTS
// =============================================================================
