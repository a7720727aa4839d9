//! Application configuration loaded from environment variables.

use common::TaxRate;
use thiserror::Error;

/// Server configuration.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `PAYMENT_WEBHOOK_TOKEN` — shared secret for webhook deliveries (required)
/// - `PAYMENT_API_KEY` — gateway API credential (required)
/// - `PAYMENT_BASE_URL` — gateway endpoint override (optional)
/// - `TAX_RATE_BPS` — sales tax in basis points (default: `1000`)
///
/// The two payment secrets are required: without them every webhook call
/// would have to be accepted blind, so startup fails instead.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub webhook_token: String,
    pub gateway_api_key: String,
    pub gateway_base_url: Option<String>,
    pub tax_rate: TaxRate,
}

/// Errors detected while loading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is missing or empty.
    #[error("Missing required environment variable {name}")]
    MissingVar { name: &'static str },

    /// An environment variable holds an unparseable value.
    #[error("Invalid value for environment variable {name}: {value:?}")]
    InvalidVar { name: &'static str, value: String },
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// Factored out of [`Config::from_env`] so tests can exercise the
    /// rules without mutating process-global state.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            match lookup(name) {
                Some(value) if !value.is_empty() => Ok(value),
                _ => Err(ConfigError::MissingVar { name }),
            }
        };

        let port = match lookup("PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidVar {
                name: "PORT",
                value,
            })?,
            None => 3000,
        };

        let tax_rate = match lookup("TAX_RATE_BPS") {
            Some(value) => {
                let bps = value.parse().map_err(|_| ConfigError::InvalidVar {
                    name: "TAX_RATE_BPS",
                    value,
                })?;
                TaxRate::from_basis_points(bps)
            }
            None => TaxRate::default(),
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            webhook_token: required("PAYMENT_WEBHOOK_TOKEN")?,
            gateway_api_key: required("PAYMENT_API_KEY")?,
            gateway_base_url: lookup("PAYMENT_BASE_URL"),
            tax_rate,
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
