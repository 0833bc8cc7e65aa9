//! Process configuration, read from the environment.

use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_JWT_SECRET: &str = "dev-secret";
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;
pub const DEFAULT_NOTIFICATION_BUFFER: usize = 256;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// A debit leaving a quantity at or below this emits a low-stock notification.
    pub low_stock_threshold: i64,
    /// Capacity of the SSE broadcast channel.
    pub notification_buffer: usize,
    /// `JWT_SECRET` was unset and the development secret is in use.
    pub using_default_secret: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = parse_var(&lookup, "OUTLETOPS_BIND_ADDR", DEFAULT_BIND_ADDR)?;

        let (jwt_secret, using_default_secret) = match lookup("JWT_SECRET") {
            Some(s) if !s.trim().is_empty() => (s, false),
            Some(s) => {
                return Err(ConfigError::Invalid {
                    var: "JWT_SECRET",
                    value: s,
                    reason: "must not be blank".to_string(),
                });
            }
            None => (DEFAULT_JWT_SECRET.to_string(), true),
        };

        let low_stock_threshold: i64 = parse_var(
            &lookup,
            "OUTLETOPS_LOW_STOCK_THRESHOLD",
            &DEFAULT_LOW_STOCK_THRESHOLD.to_string(),
        )?;
        if low_stock_threshold < 0 {
            return Err(ConfigError::Invalid {
                var: "OUTLETOPS_LOW_STOCK_THRESHOLD",
                value: low_stock_threshold.to_string(),
                reason: "must not be negative".to_string(),
            });
        }

        let notification_buffer: usize = parse_var(
            &lookup,
            "OUTLETOPS_NOTIFICATION_BUFFER",
            &DEFAULT_NOTIFICATION_BUFFER.to_string(),
        )?;
        if notification_buffer == 0 {
            return Err(ConfigError::Invalid {
                var: "OUTLETOPS_NOTIFICATION_BUFFER",
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }

        Ok(Self {
            bind_addr,
            jwt_secret,
            low_stock_threshold,
            notification_buffer,
            using_default_secret,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            notification_buffer: DEFAULT_NOTIFICATION_BUFFER,
            using_default_secret: true,
        }
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    let raw = lookup(var).unwrap_or_else(|| default.to_string());
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        var,
        value: raw.clone(),
        reason: e.to_string(),
    })
}
