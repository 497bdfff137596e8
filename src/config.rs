// src/config.rs
use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;

use log::info;
use thiserror::Error;

pub const MEMORY_STORE: &str = "memory";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub max_connections: u32,
    pub alpha_vantage_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Config {
            bind_addr: parse_or(&lookup, "PORTFOLIO_ADDR", "127.0.0.1:3030")?,
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://portfolio.db?mode=rwc".to_string()),
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", "5")?,
            alpha_vantage_key: lookup("ALPHA_VANTAGE_API_KEY").filter(|k| !k.is_empty()),
        })
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_STORE
    }
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value,
    })
}
