//! # HTTP API
//!
//! Local cart service for UI consumers.
//!
//! | Method | Path                          | Body               |
//! |--------|-------------------------------|--------------------|
//! | GET    | `/health`                     |                    |
//! | GET    | `/cart`                       |                    |
//! | POST   | `/cart/items`                 | `{"product_id"}`   |
//! | PUT    | `/cart/items/{id}`            | `{"quantity"}`     |
//! | DELETE | `/cart/items/{id}`            |                    |
//! | GET    | `/cart/items/{id}/quantity`   |                    |
//! | DELETE | `/cart`                       |                    |
//! | POST   | `/checkout/summary`           | `{"promo"?}`       |
//! | GET    | `/notices`                    |                    |
//!
//! The store sits behind an async mutex. Adds release it while the product
//! lookup is in flight and re-acquire it to finish.

use crate::cli::Store;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use crumb_client::{ProductClient, log_outcome};
use crumb_core::{
    AddOutcome, Cart, CartError, CheckoutSummary, Notice, PricingPolicy, ProductId, PromoCatalog,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

// =============================================================================
// STATE
// =============================================================================

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<Store>>,
    pub products: ProductClient,
    pub catalog: Arc<PromoCatalog>,
    pub pricing: PricingPolicy,
}

impl AppState {
    pub fn new(store: Store, products: ProductClient, pricing: PricingPolicy) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            products,
            catalog: Arc::new(PromoCatalog::default()),
            pricing,
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Cart(#[from] CartError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        error!(error = %self, "request failed");
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

// =============================================================================
// PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: u64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryRequest {
    #[serde(default)]
    pub promo: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AddItemResponse {
    pub outcome: AddOutcome,
    pub cart: Cart,
}

#[derive(Debug, Serialize)]
pub struct QuantityResponse {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    #[serde(flatten)]
    pub summary: CheckoutSummary,
    pub promo_error: Option<String>,
}

// =============================================================================
// ROUTER
// =============================================================================

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/cart", get(get_cart).delete(clear_cart))
        .route("/cart/items", post(add_item))
        .route("/cart/items/{id}", put(update_item).delete(remove_item))
        .route("/cart/items/{id}/quantity", get(item_quantity))
        .route("/checkout/summary", post(checkout_summary))
        .route("/notices", get(take_notices))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl+C or SIGTERM.
pub async fn serve(state: AppState, addr: &str) -> Result<(), ApiError> {
    let listener = TcpListener::bind(addr).await?;
    info!("Cart service listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Cart service stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn get_cart(State(state): State<AppState>) -> Json<Cart> {
    Json(state.store.lock().await.cart().clone())
}

async fn add_item(
    State(state): State<AppState>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<AddItemResponse>, ApiError> {
    let id = ProductId(req.product_id);
    let ticket = state.store.lock().await.begin_add(id);

    let result = state.products.get_product(id).await;

    let mut store = state.store.lock().await;
    let outcome = store.finish_add(ticket, result)?;
    log_outcome(id, &outcome);

    Ok(Json(AddItemResponse {
        outcome,
        cart: store.cart().clone(),
    }))
}

async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Json<Cart>, ApiError> {
    let mut store = state.store.lock().await;
    store.update_quantity(ProductId(id), req.quantity)?;
    Ok(Json(store.cart().clone()))
}

async fn remove_item(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Cart>, ApiError> {
    let mut store = state.store.lock().await;
    store.remove(ProductId(id))?;
    Ok(Json(store.cart().clone()))
}

async fn item_quantity(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Json<QuantityResponse> {
    let id = ProductId(id);
    let quantity = state.store.lock().await.item_quantity(id);
    Json(QuantityResponse {
        product_id: id,
        quantity,
    })
}

async fn clear_cart(State(state): State<AppState>) -> Result<Json<Cart>, ApiError> {
    let mut store = state.store.lock().await;
    store.clear()?;
    Ok(Json(store.cart().clone()))
}

async fn checkout_summary(
    State(state): State<AppState>,
    Json(req): Json<SummaryRequest>,
) -> Json<SummaryResponse> {
    let mut store = state.store.lock().await;
    let subtotal = store.total();

    let (promo, promo_error) = match req.promo.as_deref().map(str::trim) {
        None | Some("") => (None, None),
        Some(code) => match state.catalog.apply(code, subtotal) {
            Ok(promo) => {
                store.notify(Notice::promo_applied(promo));
                (Some(promo), None)
            }
            Err(e) => {
                store.notify(Notice::promo_rejected(&e));
                (None, Some(e.to_string()))
            }
        },
    };

    Json(SummaryResponse {
        summary: CheckoutSummary::compute(subtotal, promo, &state.pricing),
        promo_error,
    })
}

async fn take_notices(State(state): State<AppState>) -> Json<Vec<Notice>> {
    Json(state.store.lock().await.take_notices())
}
