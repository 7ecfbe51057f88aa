//! Runtime configuration from environment variables
//!
//! `dotenvy` loads a `.env` file first when one is present.

use rust_decimal::Decimal;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::pricing::metadata::DEFAULT_METADATA_LIMIT;
use crate::pricing::models::{PricingMode, ScenarioFees};

/// Longest idle expiry the session cache accepts (one year)
const MAX_SESSION_IDLE_SECS: u64 = 365 * 24 * 60 * 60;

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub pricing_mode: PricingMode,
    pub scenario_fees: ScenarioFees,
    pub metadata_limit: usize,
    pub session_idle: Duration,
}

impl Config {
    /// Defaults for everything except the database URL
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            pricing_mode: PricingMode::default(),
            scenario_fees: ScenarioFees::default(),
            metadata_limit: DEFAULT_METADATA_LIMIT,
            session_idle: Duration::from_secs(30 * 60),
        }
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let mut config = Self::new(database_url);
        let defaults = config.scenario_fees;

        if let Some(addr) = parse_var(&lookup, "BIND_ADDR")? {
            config.bind_addr = addr;
        }
        if let Some(mode) = parse_var::<PricingMode, _>(&lookup, "PRICING_MODE")? {
            config.pricing_mode = mode;
        }
        config.scenario_fees = ScenarioFees {
            cover: parse_var::<Decimal, _>(&lookup, "DEFAULT_COVER_FEE")?.unwrap_or(defaults.cover),
            formatting: parse_var::<Decimal, _>(&lookup, "DEFAULT_FORMATTING_FEE")?
                .unwrap_or(defaults.formatting),
        };
        if let Some(limit) = parse_var(&lookup, "PAYMENT_METADATA_LIMIT")? {
            config.metadata_limit = limit;
        }
        if let Some(minutes) = parse_var::<u64, _>(&lookup, "SESSION_IDLE_MINUTES")? {
            config.session_idle = minutes
                .checked_mul(60)
                .filter(|secs| *secs <= MAX_SESSION_IDLE_SECS)
                .map(Duration::from_secs)
                .ok_or_else(|| ConfigError::Invalid {
                    name: "SESSION_IDLE_MINUTES",
                    message: format!("must be at most {} minutes", MAX_SESSION_IDLE_SECS / 60),
                })?;
        }

        if config.scenario_fees.cover < Decimal::ZERO || config.scenario_fees.formatting < Decimal::ZERO {
            return Err(ConfigError::Invalid {
                name: "DEFAULT_COVER_FEE/DEFAULT_FORMATTING_FEE",
                message: "fees must not be negative".to_string(),
            });
        }

        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                name,
                message: e.to_string(),
            }),
    }
}
