//! # Crumb Library
//!
//! This library exposes the Crumb application modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod api;
pub mod cli;
pub mod config;

// Re-export crumb_core for convenience
pub use crumb_core;
