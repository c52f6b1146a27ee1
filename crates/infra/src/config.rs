//! Catalog configuration loading and representation.

use core::str::FromStr;

use thiserror::Error;

use shopfront_catalog::selector::{
    DEFAULT_LIMIT, DEFAULT_NEW_ARRIVALS_WINDOW_DAYS, DEFAULT_TRENDING_WINDOW_DAYS,
};

pub const ENV_DEFAULT_LIMIT: &str = "SHOPFRONT_DEFAULT_LIMIT";
pub const ENV_TRENDING_WINDOW_DAYS: &str = "SHOPFRONT_TRENDING_WINDOW_DAYS";
pub const ENV_NEW_ARRIVALS_WINDOW_DAYS: &str = "SHOPFRONT_NEW_ARRIVALS_WINDOW_DAYS";
pub const ENV_MAX_SLUG_ATTEMPTS: &str = "SHOPFRONT_MAX_SLUG_ATTEMPTS";

/// Attempts at inserting a product before a slug collision becomes fatal.
pub const DEFAULT_MAX_SLUG_ATTEMPTS: u32 = 16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Settings for the catalog service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Result count when a selector call gives none.
    pub default_limit: usize,
    pub trending_window_days: u32,
    pub new_arrivals_window_days: u32,
    pub max_slug_attempts: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            trending_window_days: DEFAULT_TRENDING_WINDOW_DAYS,
            new_arrivals_window_days: DEFAULT_NEW_ARRIVALS_WINDOW_DAYS,
            max_slug_attempts: DEFAULT_MAX_SLUG_ATTEMPTS,
        }
    }
}

impl CatalogConfig {
    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`. Unset keys keep their defaults;
    /// set-but-unparsable keys are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            default_limit: read(&lookup, ENV_DEFAULT_LIMIT, defaults.default_limit)?,
            trending_window_days: read(
                &lookup,
                ENV_TRENDING_WINDOW_DAYS,
                defaults.trending_window_days,
            )?,
            new_arrivals_window_days: read(
                &lookup,
                ENV_NEW_ARRIVALS_WINDOW_DAYS,
                defaults.new_arrivals_window_days,
            )?,
            max_slug_attempts: read(&lookup, ENV_MAX_SLUG_ATTEMPTS, defaults.max_slug_attempts)?,
        };

        if config.max_slug_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: ENV_MAX_SLUG_ATTEMPTS,
                value: "0".to_string(),
            });
        }

        tracing::debug!(?config, "catalog configuration loaded");
        Ok(config)
    }
}

fn read<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}
