//! # Configuration
//!
//! Optional TOML file plus CLI overrides.
//!
//! ```toml
//! [api]
//! base_url = "https://api.example.com"
//! token = "${CRUMB_API_TOKEN}"
//! timeout_secs = 10
//!
//! [storage]
//! backend = "redb"
//! path = "cart.redb"
//!
//! [pricing]
//! shipping_fee = 3.50
//! free_shipping_over = 5000
//! tax_basis_points = 0
//!
//! [server]
//! bind = "127.0.0.1:8080"
//! ```
//!
//! Precedence: CLI flag, then file, then built-in default.

use crumb_core::PricingPolicy;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "crumb.toml";
pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("unknown storage backend {0:?} (expected \"file\" or \"redb\")")]
    UnknownBackend(String),
}

// =============================================================================
// STORAGE BACKEND
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageBackend {
    #[default]
    File,
    Redb,
}

impl StorageBackend {
    /// Default cart location for this backend.
    #[must_use]
    pub fn default_path(self) -> PathBuf {
        match self {
            Self::File => PathBuf::from("crumb-cart.json"),
            Self::Redb => PathBuf::from("crumb-cart.redb"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" | "json" => Ok(Self::File),
            "redb" => Ok(Self::Redb),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::File => "file",
            Self::Redb => "redb",
        })
    }
}

// =============================================================================
// FILE SCHEMA
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub api: Option<ApiSection>,
    pub storage: Option<StorageSection>,
    pub pricing: Option<PricingPolicy>,
    pub server: Option<ServerSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiSection {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StorageSection {
    pub backend: Option<String>,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServerSection {
    pub bind: Option<String>,
}

impl ConfigFile {
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `explicit` if given (it must exist), otherwise `crumb.toml` in the
    /// working directory if present, otherwise an empty config.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let default = Path::new(DEFAULT_CONFIG_FILE);
        if default.exists() {
            Self::load(default)
        } else {
            Ok(Self::default())
        }
    }
}

// =============================================================================
// RESOLVED SETTINGS
// =============================================================================

/// Values given on the command line. `None` defers to the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub backend: Option<String>,
    pub cart_path: Option<PathBuf>,
    pub bind: Option<String>,
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub api_token: Option<String>,
    pub timeout: Duration,
    pub backend: StorageBackend,
    pub cart_path: PathBuf,
    pub pricing: PricingPolicy,
    pub bind: String,
}

impl Settings {
    pub fn resolve(file: ConfigFile, overrides: Overrides) -> Result<Self, ConfigError> {
        let api = file.api.unwrap_or_default();
        let storage = file.storage.unwrap_or_default();
        let server = file.server.unwrap_or_default();

        let backend = match overrides.backend.or(storage.backend) {
            Some(name) => expand_env_vars(&name).parse()?,
            None => StorageBackend::default(),
        };
        let cart_path = overrides
            .cart_path
            .or(storage.path)
            .unwrap_or_else(|| backend.default_path());

        Ok(Self {
            api_url: overrides
                .api_url
                .or(api.base_url)
                .map(|url| expand_env_vars(&url))
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_token: api
                .token
                .map(|token| expand_env_vars(&token))
                .filter(|token| !token.is_empty()),
            timeout: Duration::from_secs(api.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            backend,
            cart_path,
            pricing: file.pricing.unwrap_or_default(),
            bind: overrides
                .bind
                .or(server.bind)
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
        })
    }
}

/// Replace `${VAR}` with the variable's value; unset variables expand to "".
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let var = &after[..end];
                if !var.is_empty() {
                    out.push_str(&env::var(var).unwrap_or_default());
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}
