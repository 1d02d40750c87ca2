//! # Configuration Module
//!
//! Runtime configuration for the bot, read from the environment (and an
//! optional `.env` file). Every setting except the bot token has a default.

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

// Defaults for the gateway and media handling
pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:5000";
pub const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LANGUAGE: &str = "en";
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024; // 10MB limit for forwarded images
pub const DEFAULT_HEALTH_CHECK_INTERVAL_SECS: u64 = 60;

/// Recovery configuration for gateway failures
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Consecutive failures before the circuit opens
    pub circuit_breaker_threshold: u32,
    /// Seconds the circuit stays open before calls are let through again
    pub circuit_breaker_reset_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            circuit_breaker_threshold: 5,
            circuit_breaker_reset_secs: 60, // 1 minute
        }
    }
}

/// Settings for the HTTP inference gateway
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL; `/predict` is appended
    pub base_url: String,
    /// Upper bound for a single prediction, including waiting for readiness
    pub timeout_secs: u64,
    pub recovery: RecoveryConfig,
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GATEWAY_URL.to_string(),
            timeout_secs: DEFAULT_GATEWAY_TIMEOUT_SECS,
            recovery: RecoveryConfig::default(),
        }
    }
}

/// Output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow::anyhow!("Unknown log format: {other}")),
        }
    }
}

/// Top-level bot configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub telegram_token: String,
    pub gateway: GatewayConfig,
    pub max_image_bytes: usize,
    pub default_language: String,
    pub health_check_interval_secs: u64,
    pub log_format: LogFormat,
}

impl BotConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let telegram_token = lookup("TELEGRAM_BOT_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .context("TELEGRAM_BOT_TOKEN must be set")?;

        let defaults = GatewayConfig::default();
        let gateway = GatewayConfig {
            base_url: lookup("GATEWAY_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            timeout_secs: parse_or(&lookup, "GATEWAY_TIMEOUT_SECS", defaults.timeout_secs)?,
            recovery: RecoveryConfig {
                circuit_breaker_threshold: parse_or(
                    &lookup,
                    "CIRCUIT_BREAKER_THRESHOLD",
                    defaults.recovery.circuit_breaker_threshold,
                )?,
                circuit_breaker_reset_secs: parse_or(
                    &lookup,
                    "CIRCUIT_BREAKER_RESET_SECS",
                    defaults.recovery.circuit_breaker_reset_secs,
                )?,
            },
        };

        if gateway.timeout_secs == 0 {
            anyhow::bail!("GATEWAY_TIMEOUT_SECS must be greater than zero");
        }

        let log_format = match lookup("LOG_FORMAT") {
            Some(value) => value.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            telegram_token,
            gateway,
            max_image_bytes: parse_or(&lookup, "MAX_IMAGE_BYTES", MAX_IMAGE_BYTES)?,
            default_language: lookup("DEFAULT_LANGUAGE")
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            health_check_interval_secs: parse_or(
                &lookup,
                "HEALTH_CHECK_INTERVAL_SECS",
                DEFAULT_HEALTH_CHECK_INTERVAL_SECS,
            )?,
            log_format,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid value for {key} ({raw}): {e}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = BotConfig::from_lookup(lookup_from(&[("TELEGRAM_BOT_TOKEN", "123:abc")])).unwrap();

        assert_eq!(config.gateway.base_url, DEFAULT_GATEWAY_URL);
        assert_eq!(config.gateway.timeout_secs, 30);
        assert_eq!(config.gateway.recovery.circuit_breaker_threshold, 5);
        assert_eq!(config.max_image_bytes, MAX_IMAGE_BYTES);
        assert_eq!(config.default_language, "en");
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_missing_token_is_error() {
        assert!(BotConfig::from_lookup(lookup_from(&[])).is_err());
        assert!(BotConfig::from_lookup(lookup_from(&[("TELEGRAM_BOT_TOKEN", "  ")])).is_err());
    }

    #[test]
    fn test_overrides_and_invalid_values() {
        let config = BotConfig::from_lookup(lookup_from(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("GATEWAY_URL", "http://inference:8080/"),
            ("GATEWAY_TIMEOUT_SECS", "12"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();
        assert_eq!(config.gateway.base_url, "http://inference:8080");
        assert_eq!(config.gateway.timeout(), Duration::from_secs(12));
        assert_eq!(config.log_format, LogFormat::Json);

        let invalid = BotConfig::from_lookup(lookup_from(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("GATEWAY_TIMEOUT_SECS", "soon"),
        ]));
        assert!(invalid.is_err());

        let zero = BotConfig::from_lookup(lookup_from(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("GATEWAY_TIMEOUT_SECS", "0"),
        ]));
        assert!(zero.is_err());
    }
}
