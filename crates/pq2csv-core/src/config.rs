//! Conversion configuration.
//!
//! Values come from defaults, then `PQ2CSV_*` environment variables, then
//! whatever the caller (usually the CLI) overrides explicitly.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Rows between periodic flushes of the output stream.
pub const DEFAULT_FLUSH_EVERY: u64 = 1000;

/// Rows decoded per Arrow record batch.
pub const DEFAULT_BATCH_SIZE: usize = 1024;

pub const ENV_ROW_LIMIT: &str = "PQ2CSV_ROW_LIMIT";
pub const ENV_FLUSH_EVERY: &str = "PQ2CSV_FLUSH_EVERY";
pub const ENV_BATCH_SIZE: &str = "PQ2CSV_BATCH_SIZE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Maximum number of data rows to emit; 0 means unlimited.
    pub row_limit: u64,
    pub flush_every: u64,
    pub batch_size: usize,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            row_limit: 0,
            flush_every: DEFAULT_FLUSH_EVERY,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl ConvertConfig {
    /// Defaults overlaid with the `PQ2CSV_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = parse_var(&lookup, ENV_ROW_LIMIT)? {
            cfg.row_limit = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_FLUSH_EVERY)? {
            cfg.flush_every = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_BATCH_SIZE)? {
            cfg.batch_size = v;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn with_row_limit(mut self, row_limit: u64) -> Self {
        self.row_limit = row_limit;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.flush_every == 0 {
            return Err(Error::Config("flush_every must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".into()));
        }
        Ok(())
    }

    /// The row limit as an option, `None` when unlimited.
    pub fn limit(&self) -> Option<u64> {
        (self.row_limit > 0).then_some(self.row_limit)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::Config(format!("{key}={raw:?}: {e}"))),
    }
}
