// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_FIELD_MANAGER: &str = "rdev-reconciler";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid reconciler config: {0}")]
    Toml(#[from] toml::de::Error),
}

fn env_ms(key: &str) -> Option<Duration> {
    std::env::var(key).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

/// Delay between polls of the workspace store (default 10s).
pub fn poll_interval() -> Duration {
    env_ms("RDEV_POLL_INTERVAL_MS").unwrap_or(Duration::from_secs(10))
}

/// Bound on one apply call to the agent (default 30s).
pub fn apply_timeout() -> Duration {
    env_ms("RDEV_APPLY_TIMEOUT_MS").unwrap_or(Duration::from_secs(30))
}

/// Bound on waiting for the agent's status report (default 60s).
pub fn report_timeout() -> Duration {
    env_ms("RDEV_REPORT_TIMEOUT_MS").unwrap_or(Duration::from_secs(60))
}

/// Retries after a conflicting or failed apply before giving up (default 3).
pub fn max_apply_retries() -> u32 {
    std::env::var("RDEV_MAX_APPLY_RETRIES").ok().and_then(|s| s.parse().ok()).unwrap_or(3)
}

/// Initial retry backoff, doubled per attempt (default 500ms).
pub fn retry_backoff() -> Duration {
    env_ms("RDEV_RETRY_BACKOFF_MS").unwrap_or(Duration::from_millis(500))
}

/// Field manager for server-side apply.
pub fn field_manager() -> String {
    std::env::var("RDEV_FIELD_MANAGER")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_FIELD_MANAGER.to_string())
}

/// Tracing filter directive, if set.
pub fn log_filter() -> Option<String> {
    std::env::var("RDEV_LOG").ok().filter(|s| !s.is_empty())
}

/// Tunables for the reconciliation loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    pub poll_interval: Duration,
    pub apply_timeout: Duration,
    pub report_timeout: Duration,
    pub max_apply_retries: u32,
    pub retry_backoff: Duration,
    pub field_manager: String,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            apply_timeout: Duration::from_secs(30),
            report_timeout: Duration::from_secs(60),
            max_apply_retries: 3,
            retry_backoff: Duration::from_millis(500),
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
        }
    }
}

/// On-disk form; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    poll_interval_ms: Option<u64>,
    apply_timeout_ms: Option<u64>,
    report_timeout_ms: Option<u64>,
    max_apply_retries: Option<u32>,
    retry_backoff_ms: Option<u64>,
    field_manager: Option<String>,
}

impl ReconcilerConfig {
    pub fn from_env() -> Self {
        Self {
            poll_interval: poll_interval(),
            apply_timeout: apply_timeout(),
            report_timeout: report_timeout(),
            max_apply_retries: max_apply_retries(),
            retry_backoff: retry_backoff(),
            field_manager: field_manager(),
        }
    }

    /// Parse a TOML document; omitted keys keep their defaults.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(source)?;
        let defaults = Self::default();
        Ok(Self {
            poll_interval: file
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            apply_timeout: file
                .apply_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.apply_timeout),
            report_timeout: file
                .report_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.report_timeout),
            max_apply_retries: file.max_apply_retries.unwrap_or(defaults.max_apply_retries),
            retry_backoff: file
                .retry_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_backoff),
            field_manager: file.field_manager.unwrap_or(defaults.field_manager),
        })
    }

    /// Backoff before retry number `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.retry_backoff.saturating_mul(2u32.saturating_pow(attempt))
    }

    rdev_core::setters! {
        set {
            poll_interval: Duration,
            apply_timeout: Duration,
            report_timeout: Duration,
            max_apply_retries: u32,
            retry_backoff: Duration,
        }
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
