use super::CartStorage;
use crate::LineItem;
use crate::error::StorageError;
use crate::formats::{decode_json, encode_json};

/// In-memory storage holding the JSON encoding, like a browser's local storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    raw: Option<Vec<u8>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from arbitrary stored bytes, valid or not.
    #[must_use]
    pub fn with_raw(raw: impl Into<Vec<u8>>) -> Self {
        Self {
            raw: Some(raw.into()),
        }
    }

    /// The bytes currently stored.
    pub fn raw(&self) -> Option<&[u8]> {
        self.raw.as_deref()
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self) -> Result<Option<Vec<LineItem>>, StorageError> {
        match &self.raw {
            Some(raw) => Ok(Some(decode_json(raw)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, items: &[LineItem]) -> Result<(), StorageError> {
        self.raw = Some(encode_json(items)?);
        Ok(())
    }
}
