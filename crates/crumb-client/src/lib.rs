//! # Crumb Client - The Wire
//!
//! Typed access to the storefront product API and the add-to-cart flow
//! built on it.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use crumb_client::{ProductClient, add_to_cart};
//! use crumb_core::{CartStore, MemoryStorage, ProductId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ProductClient::new("https://api.example.com")?;
//!     let mut store = CartStore::open(MemoryStorage::new());
//!
//!     let outcome = add_to_cart(&mut store, &client, ProductId(7)).await?;
//!     println!("{outcome:?}, {} items", store.item_count());
//!     Ok(())
//! }
//! ```
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐  begin_add   ┌──────────────┐
//! │  CartStore   │ ───────────► │  AddTicket   │
//! │ (crumb-core) │              └──────┬───────┘
//! │              │                     │ GET /products/{id}
//! │              │  finish_add  ┌──────▼───────┐
//! │              │ ◄─────────── │ ProductClient│
//! └──────────────┘              └──────────────┘
//! ```

use crumb_core::{AddOutcome, CartError, CartStorage, CartStore, ProductId, ProductSnapshot};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// ERROR TYPE
// =============================================================================

/// Errors from the product API.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server answered with a non-success status.
    #[error("server returned status {0}")]
    Status(u16),

    /// Response had no product payload.
    #[error("product {0} missing from response")]
    MissingProduct(ProductId),

    /// Bearer token contains characters not allowed in a header.
    #[error("invalid API token: {0}")]
    InvalidToken(String),
}

// =============================================================================
// RESPONSE TYPES
// =============================================================================

/// Body of `GET /products/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetProductResponse {
    #[serde(default)]
    pub product: Option<ProductSnapshot>,
}

// =============================================================================
// LOOKUP TRAIT
// =============================================================================

/// Source of authoritative product data.
///
/// [`ProductClient`] is the production implementation.
pub trait ProductLookup {
    fn lookup(&self, id: ProductId) -> impl Future<Output = Result<ProductSnapshot, Error>> + Send;
}

// =============================================================================
// CLIENT
// =============================================================================

/// HTTP client for the product API.
#[derive(Debug, Clone)]
pub struct ProductClient {
    base_url: String,
    client: reqwest::Client,
}

impl ProductClient {
    /// Create a client for `base_url` with the default timeout.
    ///
    /// Fails only if the TLS backend cannot be initialized.
    pub fn new(base_url: impl Into<String>) -> Result<Self, Error> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client that sends `Authorization: Bearer <token>`.
    pub fn with_token(
        base_url: impl Into<String>,
        token: &str,
        timeout: Duration,
    ) -> Result<Self, Error> {
        use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

        let mut headers = HeaderMap::new();
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| Error::InvalidToken(e.to_string()))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self {
            base_url: normalize_base(base_url.into()),
            client,
        })
    }

    /// Create a client with a custom timeout and no token.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: normalize_base(base_url.into()),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch current product data.
    pub async fn get_product(&self, id: ProductId) -> Result<ProductSnapshot, Error> {
        let url = format!("{}/products/{}", self.base_url, id);
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status(status.as_u16()));
        }

        let body = resp.bytes().await?;
        let parsed: GetProductResponse = serde_json::from_slice(&body)?;
        parsed.product.ok_or(Error::MissingProduct(id))
    }
}

impl ProductLookup for ProductClient {
    fn lookup(&self, id: ProductId) -> impl Future<Output = Result<ProductSnapshot, Error>> + Send {
        self.get_product(id)
    }
}

fn normalize_base(mut base: String) -> String {
    while base.ends_with('/') {
        base.pop();
    }
    base
}

// =============================================================================
// ADD TO CART
// =============================================================================

/// Look up `id` and add it to the cart, best effort.
///
/// Lookup failures and out-of-stock products are logged, recorded as store
/// notices and returned as an [`AddOutcome`]. The only error is a failure
/// to persist the updated cart.
pub async fn add_to_cart<S, L>(
    store: &mut CartStore<S>,
    lookup: &L,
    id: ProductId,
) -> Result<AddOutcome, CartError>
where
    S: CartStorage,
    L: ProductLookup,
{
    let ticket = store.begin_add(id);
    let result = lookup.lookup(id).await;
    let outcome = store.finish_add(ticket, result)?;
    log_outcome(id, &outcome);
    Ok(outcome)
}

/// Log an add outcome at the level it deserves.
pub fn log_outcome(id: ProductId, outcome: &AddOutcome) {
    match outcome {
        AddOutcome::Added { quantity } => debug!(product_id = %id, quantity, "added to cart"),
        AddOutcome::OutOfStock => debug!(product_id = %id, "product out of stock"),
        AddOutcome::Failed { reason } => warn!(product_id = %id, %reason, "add to cart failed"),
        AddOutcome::Stale => debug!(product_id = %id, "discarded stale add"),
    }
}
