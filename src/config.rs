//! Service configuration loaded from environment variables.

use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;

use crate::application::order_service::OrderServiceSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Reads from environment variables (a `.env` file is honoured by `main`):
/// - `DATABASE_URL`: required
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `8080`)
/// - `PRODUCTS_SERVICE_URL`: product catalog base URL
/// - `PAYMENTS_SERVICE_URL`: payment service base URL
/// - `REMOTE_TIMEOUT_MS`: bound on every remote call (default: `5000`)
/// - `PAYMENT_CURRENCY`: currency sent with payment sessions (default: `"usd"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub products_service_url: String,
    pub payments_service_url: String,
    pub remote_timeout: Duration,
    pub payment_currency: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str, default: &str| {
            vars.get(name)
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        let database_url = vars
            .get("DATABASE_URL")
            .cloned()
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let port = get("PORT", "8080");
        let port = port.parse().map_err(|_| ConfigError::Invalid {
            name: "PORT",
            value: port,
        })?;

        let timeout_ms = get("REMOTE_TIMEOUT_MS", "5000");
        let remote_timeout = match timeout_ms.parse::<u64>() {
            Ok(ms) if ms > 0 => Duration::from_millis(ms),
            _ => {
                return Err(ConfigError::Invalid {
                    name: "REMOTE_TIMEOUT_MS",
                    value: timeout_ms,
                })
            }
        };

        Ok(Self {
            database_url,
            host: get("HOST", "0.0.0.0"),
            port,
            products_service_url: get("PRODUCTS_SERVICE_URL", "http://localhost:3001"),
            payments_service_url: get("PAYMENTS_SERVICE_URL", "http://localhost:3003"),
            remote_timeout,
            payment_currency: get("PAYMENT_CURRENCY", "usd"),
        })
    }

    pub fn service_settings(&self) -> OrderServiceSettings {
        OrderServiceSettings {
            remote_timeout: self.remote_timeout,
            currency: self.payment_currency.clone(),
        }
    }
}
