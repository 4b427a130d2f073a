//! # Crumb
//!
//! Storefront shopping cart: CLI and local HTTP service.

use clap::Parser;
use crumb::api::{self, AppState};
use crumb::cli::{self, Cli, Commands, PromoAction};
use crumb::config::{ConfigFile, Settings};
use crumb_client::ProductClient;
use crumb_core::PromoCatalog;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("crumb=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let file = ConfigFile::discover(args.config.as_deref())?;
    let settings = Settings::resolve(file, args.overrides())?;
    let path = settings.cart_path.as_path();
    let backend = settings.backend;
    let json = args.json;
    let catalog = PromoCatalog::default();

    match args.command {
        Commands::Show => cli::cmd_show(path, backend, json),
        Commands::Add { id } => {
            let client = product_client(&settings)?;
            cli::cmd_add(path, backend, json, &client, id).await
        }
        Commands::Remove { id } => cli::cmd_remove(path, backend, json, id),
        Commands::Set { id, quantity } => cli::cmd_set(path, backend, json, id, quantity),
        Commands::Clear => cli::cmd_clear(path, backend, json),
        Commands::Quantity { id } => cli::cmd_quantity(path, backend, json, id),
        Commands::Promo { action } => match action {
            PromoAction::List => cli::cmd_promo_list(&catalog, json),
            PromoAction::Check { code } => {
                cli::cmd_promo_check(path, backend, json, &catalog, &code)
            }
        },
        Commands::Checkout { promo, form, clear } => cli::cmd_checkout(
            path,
            backend,
            json,
            &catalog,
            &settings.pricing,
            promo.as_deref(),
            form.as_deref(),
            clear,
        ),
        Commands::Serve { .. } => {
            let store = cli::open_store(path, backend)?;
            let client = product_client(&settings)?;
            let state = AppState::new(store, client, settings.pricing);
            api::serve(state, &settings.bind).await?;
            Ok(())
        }
    }
}

fn product_client(settings: &Settings) -> Result<ProductClient, crumb_client::Error> {
    match &settings.api_token {
        Some(token) => ProductClient::with_token(&settings.api_url, token, settings.timeout),
        None => ProductClient::with_timeout(&settings.api_url, settings.timeout),
    }
}
