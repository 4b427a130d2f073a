//! Integration tests for crumb-client.
//!
//! Uses wiremock to mock the storefront product API.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use crumb_client::{Error, GetProductResponse, ProductClient, add_to_cart};
use crumb_core::{AddOutcome, CartStore, MemoryStorage, Money, NoticeKind, ProductId};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// HELPERS
// =============================================================================

fn product_json(id: u64, name: &str, price: f64, stock: i64) -> serde_json::Value {
    serde_json::json!({
        "product": {
            "id": id,
            "name": name,
            "price": price,
            "description": "Freshly baked",
            "image": format!("{id}.jpg"),
            "isActive": true,
            "rating": 4.8,
            "stock": stock,
            "category_name": "Pastries",
            "lowStockThreshold": 10
        }
    })
}

async fn mount_product(server: &MockServer, id: u64, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/products/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

// =============================================================================
// RESPONSE TYPE TESTS
// =============================================================================

#[test]
fn test_get_product_response_deserialization() {
    let body = product_json(7, "Croissant", 4.99, 12);
    let resp: GetProductResponse = serde_json::from_value(body).unwrap();
    let product = resp.product.unwrap();
    assert_eq!(product.id, ProductId(7));
    assert_eq!(product.price, Money::from_cents(499));
    assert_eq!(product.stock, Some(12));
    assert_eq!(product.category_name, "Pastries");
}

#[test]
fn test_get_product_response_null_product() {
    let resp: GetProductResponse = serde_json::from_str(r#"{"product":null}"#).unwrap();
    assert!(resp.product.is_none());
}

// =============================================================================
// CLIENT TESTS WITH WIREMOCK
// =============================================================================

#[tokio::test]
async fn test_client_get_product() {
    let server = MockServer::start().await;
    mount_product(&server, 7, product_json(7, "Croissant", 4.99, 12)).await;

    let client = ProductClient::new(server.uri()).unwrap();
    let product = client.get_product(ProductId(7)).await.unwrap();

    assert_eq!(product.name, "Croissant");
    assert_eq!(product.price.to_string(), "4.99");
}

#[tokio::test]
async fn test_client_trailing_slash_base_url() {
    let server = MockServer::start().await;
    mount_product(&server, 3, product_json(3, "Baguette", 2.5, 4)).await;

    let client = ProductClient::new(format!("{}/", server.uri())).unwrap();
    let product = client.get_product(ProductId(3)).await.unwrap();
    assert_eq!(product.price, Money::from_cents(250));
}

#[tokio::test]
async fn test_client_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/7"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(product_json(
            7,
            "Croissant",
            4.99,
            1,
        )))
        .mount(&server)
        .await;

    let client =
        ProductClient::with_token(server.uri(), "secret-token", Duration::from_secs(5)).unwrap();
    assert!(client.get_product(ProductId(7)).await.is_ok());
}

#[test]
fn test_client_constructors_return_result() {
    let client = ProductClient::new("http://localhost:8080//").unwrap();
    assert_eq!(client.base_url(), "http://localhost:8080");

    let client = ProductClient::with_timeout("http://localhost", Duration::from_secs(1)).unwrap();
    assert_eq!(client.base_url(), "http://localhost");
}

#[test]
fn test_invalid_token_rejected() {
    let result = ProductClient::with_token("http://localhost", "bad\ntoken", Duration::from_secs(5));
    assert!(matches!(result, Err(Error::InvalidToken(_))));
}

#[tokio::test]
async fn test_client_not_found_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = ProductClient::new(server.uri()).unwrap();
    match client.get_product(ProductId(404)).await.unwrap_err() {
        Error::Status(code) => assert_eq!(code, 404),
        other => panic!("Expected Status error, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_client_missing_product() {
    let server = MockServer::start().await;
    mount_product(&server, 5, serde_json::json!({ "product": null })).await;

    let client = ProductClient::new(server.uri()).unwrap();
    match client.get_product(ProductId(5)).await.unwrap_err() {
        Error::MissingProduct(id) => assert_eq!(id, ProductId(5)),
        other => panic!("Expected MissingProduct, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_client_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = ProductClient::new(server.uri()).unwrap();
    assert!(matches!(
        client.get_product(ProductId(1)).await,
        Err(Error::Json(_))
    ));
}

#[tokio::test]
async fn test_client_connection_refused() {
    // Use a port that's definitely not listening
    let client = ProductClient::new("http://127.0.0.1:1").unwrap();
    match client.get_product(ProductId(1)).await.unwrap_err() {
        Error::Http(_) => {}
        other => panic!("Expected Http error, got: {:?}", other),
    }
}

// =============================================================================
// ADD TO CART FLOW
// =============================================================================

#[tokio::test]
async fn test_add_to_cart_twice_increments() {
    let server = MockServer::start().await;
    mount_product(&server, 7, product_json(7, "Croissant", 4.99, 12)).await;

    let client = ProductClient::new(server.uri()).unwrap();
    let mut store = CartStore::open(MemoryStorage::new());

    add_to_cart(&mut store, &client, ProductId(7)).await.unwrap();
    let outcome = add_to_cart(&mut store, &client, ProductId(7)).await.unwrap();

    assert_eq!(outcome, AddOutcome::Added { quantity: 2 });
    assert_eq!(store.items().len(), 1);
    assert_eq!(store.total(), Money::from_cents(998));
}

#[tokio::test]
async fn test_add_to_cart_out_of_stock() {
    let server = MockServer::start().await;
    mount_product(&server, 8, product_json(8, "Eclair", 3.5, 0)).await;

    let client = ProductClient::new(server.uri()).unwrap();
    let mut store = CartStore::open(MemoryStorage::new());

    let outcome = add_to_cart(&mut store, &client, ProductId(8)).await.unwrap();

    assert_eq!(outcome, AddOutcome::OutOfStock);
    assert!(store.is_empty());
    let kinds: Vec<_> = store.take_notices().into_iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NoticeKind::OutOfStock]);
}

#[tokio::test]
async fn test_add_to_cart_server_error_is_not_propagated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/9"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = ProductClient::new(server.uri()).unwrap();
    let mut store = CartStore::open(MemoryStorage::new());

    let outcome = add_to_cart(&mut store, &client, ProductId(9)).await.unwrap();

    assert!(matches!(outcome, AddOutcome::Failed { .. }));
    assert!(store.is_empty());
    assert_eq!(store.take_notices()[0].kind, NoticeKind::AddFailed);
}

// =============================================================================
// ERROR TYPE TESTS
// =============================================================================

#[test]
fn test_error_display_status() {
    assert_eq!(Error::Status(503).to_string(), "server returned status 503");
}

#[test]
fn test_error_display_json() {
    let json_err = serde_json::from_str::<GetProductResponse>("invalid").unwrap_err();
    let err = Error::Json(json_err);
    assert!(format!("{}", err).starts_with("JSON error:"));
}
