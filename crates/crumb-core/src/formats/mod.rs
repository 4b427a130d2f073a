//! # Formats Module
//!
//! Serialization of the persisted cart item list.
//!
//! This module contains:
//! - JSON format (the list of line items, as the storefront keeps it)
//! - Binary format (postcard + header) for the redb backend
//!
//! Note: File and database I/O live in `storage`. This module only handles
//! format conversion (pure transformations).

mod persistence;

pub use persistence::*;
