//! Persisted cart encodings.
//!
//! JSON decoding is lenient per entry: the stored value must be a list, but
//! entries that do not parse as line items are skipped rather than failing
//! the whole cart.

use crate::LineItem;
use thiserror::Error;

/// Key under which the cart item list is stored.
pub const CART_STORAGE_KEY: &str = "sweet-delights-cart";

/// Magic bytes for the binary format.
pub const BINARY_MAGIC: &[u8; 4] = b"CRMB";

/// Current binary format version.
pub const BINARY_VERSION: u8 = 1;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stored cart is not a list")]
    NotAList,

    #[error("binary error: {0}")]
    Binary(#[from] postcard::Error),

    #[error("bad header: expected {expected:?} v{version}")]
    BadHeader { expected: [u8; 4], version: u8 },
}

/// Encode the item list as a JSON array.
pub fn encode_json(items: &[LineItem]) -> Result<Vec<u8>, FormatError> {
    Ok(serde_json::to_vec(items)?)
}

/// Decode a JSON array of line items, skipping malformed entries.
pub fn decode_json(bytes: &[u8]) -> Result<Vec<LineItem>, FormatError> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    let serde_json::Value::Array(entries) = value else {
        return Err(FormatError::NotAList);
    };

    Ok(entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect())
}

/// Encode the item list as header + postcard payload.
pub fn encode_binary(items: &[LineItem]) -> Result<Vec<u8>, FormatError> {
    let mut out = Vec::with_capacity(64);
    out.extend_from_slice(BINARY_MAGIC);
    out.push(BINARY_VERSION);
    let payload = postcard::to_allocvec(items)?;
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Decode header + postcard payload.
pub fn decode_binary(bytes: &[u8]) -> Result<Vec<LineItem>, FormatError> {
    let header_len = BINARY_MAGIC.len() + 1;
    let header_ok = bytes.len() >= header_len
        && &bytes[..BINARY_MAGIC.len()] == BINARY_MAGIC
        && bytes[BINARY_MAGIC.len()] == BINARY_VERSION;
    if !header_ok {
        return Err(FormatError::BadHeader {
            expected: *BINARY_MAGIC,
            version: BINARY_VERSION,
        });
    }
    Ok(postcard::from_bytes(&bytes[header_len..])?)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::{Money, ProductId};

    fn croissant() -> LineItem {
        LineItem {
            id: ProductId(1),
            name: "Croissant".to_string(),
            price: Money::from_cents(499),
            quantity: 2,
            image: "croissant.jpg".to_string(),
            category_name: "Pastries".to_string(),
        }
    }

    #[test]
    fn json_shape_matches_storefront() {
        let bytes = encode_json(&[croissant()]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value[0]["id"], 1);
        assert_eq!(value[0]["price"], "4.99");
        assert_eq!(value[0]["quantity"], 2);
        assert_eq!(value[0]["category_name"], "Pastries");
    }

    #[test]
    fn decodes_numeric_prices_written_by_the_web_client() {
        let raw = br#"[{"id":1,"name":"Croissant","price":4.99,"quantity":2,
            "image":"c.jpg","category_name":"Pastries"}]"#;
        let items = decode_json(raw).unwrap();
        assert_eq!(items, vec![LineItem { image: "c.jpg".to_string(), ..croissant() }]);
    }

    #[test]
    fn non_list_is_rejected() {
        assert!(matches!(decode_json(br#"{"items":[]}"#), Err(FormatError::NotAList)));
        assert!(matches!(decode_json(b"not json"), Err(FormatError::Json(_))));
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let raw = br#"[{"id":1,"name":"Croissant","price":"4.99","quantity":2},
            {"id":"x"}, 42, {"id":2,"name":"Bun","price":"1.00","quantity":-1}]"#;
        let items = decode_json(raw).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, ProductId(1));
    }

    #[test]
    fn binary_header_is_checked() {
        let bytes = encode_binary(&[croissant()]).unwrap();
        assert_eq!(&bytes[..4], BINARY_MAGIC);
        assert_eq!(decode_binary(&bytes).unwrap(), vec![croissant()]);

        assert!(matches!(
            decode_binary(b"XXXX\x01"),
            Err(FormatError::BadHeader { .. })
        ));
        assert!(matches!(decode_binary(b"CR"), Err(FormatError::BadHeader { .. })));
    }
}
