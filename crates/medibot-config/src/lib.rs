//! Environment-driven configuration for the medibot relay.

use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;

// ─────────────────────────────────────────────────────────────────────────────
// Keys & Defaults
// ─────────────────────────────────────────────────────────────────────────────

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const API_BASE_VAR: &str = "OPENAI_API_BASE";
pub const MODEL_VAR: &str = "MEDIBOT_MODEL";
pub const BIND_ADDR_VAR: &str = "MEDIBOT_BIND_ADDR";
pub const ALLOWED_ORIGIN_VAR: &str = "MEDIBOT_ALLOWED_ORIGIN";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

// ─────────────────────────────────────────────────────────────────────────────
// Error
// ─────────────────────────────────────────────────────────────────────────────

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Provider credential. `None` lets the server start; calls then fail.
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    /// Model override; the provider default applies when unset.
    pub model: Option<String>,
    pub bind_addr: SocketAddr,
    /// The only origin allowed by CORS.
    pub allowed_origin: String,
}

impl RelayConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration from an arbitrary key lookup. Empty values are
    /// treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = get(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr.parse::<SocketAddr>().map_err(|e| ConfigError::InvalidValue {
            key: BIND_ADDR_VAR,
            value: bind_addr.clone(),
            reason: e.to_string(),
        })?;

        let allowed_origin = get(ALLOWED_ORIGIN_VAR).unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string());
        validate_origin(&allowed_origin)?;

        Ok(Self {
            api_key: get(API_KEY_VAR),
            api_base: get(API_BASE_VAR),
            model: get(MODEL_VAR),
            bind_addr,
            allowed_origin,
        })
    }

    /// Convenience for tests and tooling that hold values in a map.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }
}

fn validate_origin(origin: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        key: ALLOWED_ORIGIN_VAR,
        value: origin.to_string(),
        reason: reason.to_string(),
    };

    let host = origin
        .strip_prefix("http://")
        .or_else(|| origin.strip_prefix("https://"))
        .ok_or_else(|| invalid("origin must start with http:// or https://"))?;

    if host.is_empty() || host.contains('/') || host.contains(char::is_whitespace) {
        return Err(invalid("origin must be scheme://host[:port] with no path"));
    }
    Ok(())
}
