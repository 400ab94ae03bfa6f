//! Environment configuration

use rust_decimal::Decimal;
use std::collections::HashSet;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::pricing::ShippingPolicy;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub max_connections: u32,
    pub nats_url: Option<String>,
    pub admin_user_ids: HashSet<String>,
    pub shipping: ShippingPolicy,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

impl AppConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let defaults = ShippingPolicy::default();
        Ok(Self {
            database_url,
            port: parse_or(&lookup, "PORT", 8083)?,
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            nats_url: lookup("NATS_URL").filter(|url| !url.trim().is_empty()),
            admin_user_ids: lookup("ADMIN_USER_IDS")
                .map(|ids| {
                    ids.split(',')
                        .map(str::trim)
                        .filter(|id| !id.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            shipping: ShippingPolicy {
                free_shipping_threshold: parse_or::<Decimal>(
                    &lookup,
                    "FREE_SHIPPING_THRESHOLD",
                    defaults.free_shipping_threshold,
                )?,
                flat_fee: parse_or::<Decimal>(&lookup, "SHIPPING_FEE", defaults.flat_fee)?,
            },
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
