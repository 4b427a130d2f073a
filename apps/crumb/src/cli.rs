//! # CLI Module
//!
//! Command-line interface over a persisted cart.
//!
//! Every command opens the store from disk, applies one operation and lets
//! the store persist the result. Notices the store records are printed
//! after the command's own output.

use crate::config::{Overrides, StorageBackend};
use clap::{Parser, Subcommand};
use crumb_client::{ProductLookup, add_to_cart};
use crumb_core::{
    Cart, CartStorage, CartStore, CheckoutForm, CheckoutSummary, FileStorage, Notice,
    OrderRequest, PricingPolicy, ProductId, PromoCatalog, RedbStorage, Severity,
};
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};

/// Storage chosen at runtime.
pub type BoxedStorage = Box<dyn CartStorage + Send>;

/// The store every command works on.
pub type Store = CartStore<BoxedStorage>;

type CmdResult = Result<(), Box<dyn Error>>;

// =============================================================================
// ARGUMENTS
// =============================================================================

#[derive(Parser, Debug)]
#[command(name = "crumb", version, about = "Storefront shopping cart")]
pub struct Cli {
    /// Config file (default: ./crumb.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage backend: file or redb
    #[arg(long, global = true)]
    pub storage: Option<String>,

    /// Cart location
    #[arg(long, global = true)]
    pub cart: Option<PathBuf>,

    /// Product API base URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List cart items and totals
    Show,
    /// Add one unit of a product (checks stock with the API)
    Add { id: u64 },
    /// Remove a product from the cart
    Remove { id: u64 },
    /// Set a product's quantity; zero or less removes it
    Set {
        id: u64,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
    /// Print the quantity of one product
    Quantity { id: u64 },
    /// Promo code utilities
    Promo {
        #[command(subcommand)]
        action: PromoAction,
    },
    /// Show checkout totals and optionally validate a checkout form
    Checkout {
        /// Promo code to apply
        #[arg(long)]
        promo: Option<String>,
        /// JSON checkout form to validate
        #[arg(long)]
        form: Option<PathBuf>,
        /// Empty the cart once the form validates
        #[arg(long, requires = "form")]
        clear: bool,
    },
    /// Serve the cart over HTTP
    Serve {
        /// Address to bind, e.g. 127.0.0.1:8080
        #[arg(long)]
        bind: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum PromoAction {
    /// List recognized codes
    List,
    /// Check a code against the current cart
    Check { code: String },
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            api_url: self.api_url.clone(),
            backend: self.storage.clone(),
            cart_path: self.cart.clone(),
            bind: match &self.command {
                Commands::Serve { bind } => bind.clone(),
                _ => None,
            },
        }
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Open the cart at `path` with the given backend.
pub fn open_store(path: &Path, backend: StorageBackend) -> Result<Store, Box<dyn Error>> {
    let storage: BoxedStorage = match backend {
        StorageBackend::File => Box::new(FileStorage::new(path)),
        StorageBackend::Redb => Box::new(RedbStorage::open(path)?),
    };
    Ok(CartStore::open(storage))
}

// =============================================================================
// COMMANDS
// =============================================================================

pub fn cmd_show(path: &Path, backend: StorageBackend, json: bool) -> CmdResult {
    let store = open_store(path, backend)?;
    if json {
        print_json(store.cart())?;
    } else {
        print_cart(store.cart());
    }
    Ok(())
}

pub async fn cmd_add<L: ProductLookup>(
    path: &Path,
    backend: StorageBackend,
    json: bool,
    lookup: &L,
    id: u64,
) -> CmdResult {
    let mut store = open_store(path, backend)?;
    let outcome = add_to_cart(&mut store, lookup, ProductId(id)).await?;

    if json {
        print_json(&serde_json::json!({
            "outcome": outcome,
            "cart": store.cart(),
            "notices": store.take_notices(),
        }))?;
    } else {
        print_notices(&store.take_notices());
        print_cart(store.cart());
    }
    Ok(())
}

pub fn cmd_remove(path: &Path, backend: StorageBackend, json: bool, id: u64) -> CmdResult {
    let mut store = open_store(path, backend)?;
    let removed = store.remove(ProductId(id))?;
    finish_mutation(&mut store, json, serde_json::json!({ "removed": removed }))
}

pub fn cmd_set(
    path: &Path,
    backend: StorageBackend,
    json: bool,
    id: u64,
    quantity: i64,
) -> CmdResult {
    let mut store = open_store(path, backend)?;
    let changed = store.update_quantity(ProductId(id), quantity)?;
    finish_mutation(&mut store, json, serde_json::json!({ "changed": changed }))
}

pub fn cmd_clear(path: &Path, backend: StorageBackend, json: bool) -> CmdResult {
    let mut store = open_store(path, backend)?;
    store.clear()?;
    finish_mutation(&mut store, json, serde_json::json!({ "cleared": true }))
}

pub fn cmd_quantity(path: &Path, backend: StorageBackend, json: bool, id: u64) -> CmdResult {
    let store = open_store(path, backend)?;
    let quantity = store.item_quantity(ProductId(id));
    if json {
        print_json(&serde_json::json!({ "product_id": id, "quantity": quantity }))?;
    } else {
        println!("{}", quantity);
    }
    Ok(())
}

pub fn cmd_promo_list(catalog: &PromoCatalog, json: bool) -> CmdResult {
    if json {
        print_json(&catalog.codes())?;
        return Ok(());
    }
    for promo in catalog.codes() {
        let minimum = promo
            .min_order
            .map(|m| format!(" (min order {})", m))
            .unwrap_or_default();
        let kind = match promo.kind {
            crumb_core::PromoKind::Percentage(p) => format!("{}% off", p),
            crumb_core::PromoKind::Fixed(amount) => format!("{} off", amount),
        };
        println!("{:<12} {}{}", promo.code, kind, minimum);
    }
    Ok(())
}

/// Check a code against the current subtotal. Rejected codes are errors.
pub fn cmd_promo_check(
    path: &Path,
    backend: StorageBackend,
    json: bool,
    catalog: &PromoCatalog,
    code: &str,
) -> CmdResult {
    let store = open_store(path, backend)?;
    let subtotal = store.total();
    let promo = catalog.apply(code, subtotal)?;

    let discount = promo.discount_for(subtotal);
    if json {
        print_json(&serde_json::json!({ "promo": promo, "discount": discount }))?;
    } else {
        println!("{} applies: -{} on {}", promo.code, discount, subtotal);
    }
    Ok(())
}

pub fn cmd_checkout(
    path: &Path,
    backend: StorageBackend,
    json: bool,
    catalog: &PromoCatalog,
    pricing: &PricingPolicy,
    promo: Option<&str>,
    form: Option<&Path>,
    clear: bool,
) -> CmdResult {
    let mut store = open_store(path, backend)?;
    let subtotal = store.total();

    let applied = match promo {
        Some(code) => match catalog.apply(code, subtotal) {
            Ok(promo) => {
                store.notify(Notice::promo_applied(promo));
                Some(promo)
            }
            Err(e) => {
                store.notify(Notice::promo_rejected(&e));
                None
            }
        },
        None => None,
    };
    let summary = CheckoutSummary::compute(subtotal, applied, pricing);

    let order = match form {
        Some(form_path) => {
            if store.is_empty() {
                return Err("cart is empty".into());
            }
            let form: CheckoutForm = serde_json::from_slice(&std::fs::read(form_path)?)?;
            form.validate()?;
            Some(OrderRequest {
                items: store.cart().order_lines(),
            })
        }
        None => None,
    };

    if json {
        print_json(&serde_json::json!({
            "summary": summary,
            "order": order,
            "notices": store.take_notices(),
        }))?;
    } else {
        print_notices(&store.take_notices());
        print_summary(&summary);
        if let Some(order) = &order {
            println!("\nOrder payload:");
            println!("{}", serde_json::to_string_pretty(order)?);
        }
    }

    if clear && order.is_some() {
        store.clear()?;
        store.take_notices();
    }
    Ok(())
}

// =============================================================================
// OUTPUT
// =============================================================================

fn finish_mutation(store: &mut Store, json: bool, result: serde_json::Value) -> CmdResult {
    if json {
        print_json(&serde_json::json!({
            "result": result,
            "cart": store.cart(),
            "notices": store.take_notices(),
        }))?;
    } else {
        print_notices(&store.take_notices());
        print_cart(store.cart());
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_notices(notices: &[Notice]) {
    for notice in notices {
        let marker = match notice.severity {
            Severity::Info => "*",
            Severity::Destructive => "!",
        };
        println!("{} {}: {}", marker, notice.title, notice.description);
    }
}

fn print_cart(cart: &Cart) {
    if cart.is_empty() {
        println!("Your cart is empty");
        return;
    }
    println!("{:>6}  {:<28} {:>5} {:>10} {:>10}", "ID", "Item", "Qty", "Price", "Line");
    for item in cart.items() {
        println!(
            "{:>6}  {:<28} {:>5} {:>10} {:>10}",
            item.id.to_string(),
            item.name,
            item.quantity,
            item.price.to_string(),
            item.line_total().to_string()
        );
    }
    println!("\nItems: {}  Total: KSH{}", cart.item_count(), cart.total());
}

fn print_summary(summary: &CheckoutSummary) {
    println!("Subtotal: KSH{}", summary.subtotal);
    if let Some(code) = &summary.promo_code {
        println!("{}: -KSH{}", code, summary.discount);
    }
    if summary.shipping.is_zero() {
        println!("Shipping: Free");
    } else {
        println!("Shipping: KSH{}", summary.shipping);
    }
    println!("Tax: KSH{}", summary.tax);
    println!("Total: KSH{}", summary.total);
}
