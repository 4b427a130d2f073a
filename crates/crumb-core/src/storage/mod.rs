//! # Storage Module
//!
//! Backends that persist the cart item list between sessions.
//!
//! - `MemoryStorage`: in-process, JSON-encoded, for tests and ephemeral carts
//! - `FileStorage`: a JSON file, replaced atomically on every save
//! - `RedbStorage`: a redb embedded database (ACID, crash safe)

mod file;
mod memory;
mod redb_cart;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use redb_cart::RedbStorage;

use crate::LineItem;
use crate::error::StorageError;

/// Where the cart item list lives between sessions.
pub trait CartStorage {
    /// Read the stored item list. `Ok(None)` when nothing has been stored.
    fn load(&self) -> Result<Option<Vec<LineItem>>, StorageError>;

    /// Replace the stored item list.
    fn save(&mut self, items: &[LineItem]) -> Result<(), StorageError>;
}

impl<S: CartStorage + ?Sized> CartStorage for Box<S> {
    fn load(&self) -> Result<Option<Vec<LineItem>>, StorageError> {
        (**self).load()
    }

    fn save(&mut self, items: &[LineItem]) -> Result<(), StorageError> {
        (**self).save(items)
    }
}
