//! redb-backed cart storage.
//!
//! One table, one key ([`CART_STORAGE_KEY`]), value in the binary format.

use super::CartStorage;
use crate::LineItem;
use crate::error::StorageError;
use crate::formats::{CART_STORAGE_KEY, decode_binary, encode_binary};
use redb::{Database, ReadableDatabase, TableDefinition, TableError};
use std::path::Path;

const CART_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("cart");

/// Cart storage in a redb database file.
pub struct RedbStorage {
    db: Database,
}

impl std::fmt::Debug for RedbStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStorage").finish_non_exhaustive()
    }
}

impl RedbStorage {
    /// Open or create the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref()).map_err(redb::Error::from)?;
        Ok(Self { db })
    }
}

impl CartStorage for RedbStorage {
    fn load(&self) -> Result<Option<Vec<LineItem>>, StorageError> {
        let txn = self.db.begin_read().map_err(redb::Error::from)?;
        let table = match txn.open_table(CART_TABLE) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(redb::Error::from(e).into()),
        };
        let Some(guard) = table.get(CART_STORAGE_KEY).map_err(redb::Error::from)? else {
            return Ok(None);
        };
        Ok(Some(decode_binary(guard.value())?))
    }

    fn save(&mut self, items: &[LineItem]) -> Result<(), StorageError> {
        let bytes = encode_binary(items)?;
        let txn = self.db.begin_write().map_err(redb::Error::from)?;
        {
            let mut table = txn.open_table(CART_TABLE).map_err(redb::Error::from)?;
            table
                .insert(CART_STORAGE_KEY, bytes.as_slice())
                .map_err(redb::Error::from)?;
        }
        txn.commit().map_err(redb::Error::from)?;
        Ok(())
    }
}
