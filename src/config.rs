//! Server configuration from environment variables.
//!
//! | Variable                | Default                        |
//! |-------------------------|--------------------------------|
//! | `WELLNEST_PORT`         | `3000`                         |
//! | `WELLNEST_DATABASE_URL` | `sqlite:wellnest.db?mode=rwc`  |
//! | `WELLNEST_UTC_OFFSET`   | `Z` (UTC)                      |

use std::env;

use anyhow::Context;

use crate::calendar::DayBoundary;

/// Default port if not specified via environment variable.
pub const DEFAULT_PORT: u16 = 3000;

/// Default database path if not specified via environment variable.
pub const DEFAULT_DB_URL: &str = "sqlite:wellnest.db?mode=rwc";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Where calendar days start for every day-bucketed statistic.
    pub day_boundary: DayBoundary,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: DEFAULT_DB_URL.to_string(),
            day_boundary: DayBoundary::utc(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unset variables fall back to
    /// defaults; set but malformed ones are an error.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = lookup("WELLNEST_PORT") {
            config.port = port
                .parse()
                .with_context(|| format!("WELLNEST_PORT must be a port number, got '{port}'"))?;
        }

        if let Some(url) = lookup("WELLNEST_DATABASE_URL") {
            config.database_url = url;
        }

        if let Some(offset) = lookup("WELLNEST_UTC_OFFSET") {
            config.day_boundary = offset.parse().context("WELLNEST_UTC_OFFSET")?;
        }

        Ok(config)
    }
}
