//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (DELTAPROXY_*)
//! 2. The bare TARGET_ORIGIN environment variable
//! 3. TOML config file (if DELTAPROXY_CONFIG_FILE set)
//! 4. Built-in defaults

use std::net::SocketAddr;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::store::EvictionPolicy;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (DELTAPROXY_*)
/// 2. TARGET_ORIGIN environment variable
/// 3. TOML config file (if DELTAPROXY_CONFIG_FILE set)
/// 4. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin base address every proxied path is resolved against.
    ///
    /// Set via DELTAPROXY_TARGET_ORIGIN or TARGET_ORIGIN.
    /// Required: the server refuses to start without it.
    #[serde(default)]
    pub target_origin: Option<String>,

    /// Address the HTTP listener binds to.
    ///
    /// Set via DELTAPROXY_BIND_ADDR environment variable.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// User-Agent string for upstream requests.
    ///
    /// Set via DELTAPROXY_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Upstream request timeout in milliseconds.
    ///
    /// Set via DELTAPROXY_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum upstream body size in bytes.
    ///
    /// Set via DELTAPROXY_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Cap on stored snapshots; least recently used are evicted first.
    ///
    /// Set via DELTAPROXY_MAX_ENTRIES. Unset means the store grows without bound.
    #[serde(default)]
    pub max_entries: Option<usize>,

    /// Snapshot time-to-live in seconds.
    ///
    /// Set via DELTAPROXY_MAX_AGE_SECS. Unset means snapshots never expire.
    #[serde(default)]
    pub max_age_secs: Option<u64>,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_user_agent() -> String {
    "deltaproxy/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            target_origin: None,
            bind_addr: default_bind_addr(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            max_entries: None,
            max_age_secs: None,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Snapshot eviction settings derived from `max_entries` and `max_age_secs`.
    pub fn eviction_policy(&self) -> EvictionPolicy {
        EvictionPolicy { max_entries: self.max_entries, max_age: self.max_age_secs.map(Duration::from_secs) }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `DELTAPROXY_`
    /// 2. `TARGET_ORIGIN`
    /// 3. TOML file from `DELTAPROXY_CONFIG_FILE` (if set)
    /// 4. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("DELTAPROXY_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment
            .merge(Env::raw().only(&["TARGET_ORIGIN"]).map(|key| key.as_str().to_lowercase().into()))
            .merge(
                Env::prefixed("DELTAPROXY_")
                    .ignore(&["CONFIG_FILE"])
                    .map(|key| key.as_str().to_lowercase().into())
                    .split("__"),
            );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Parsed origin base address.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if no origin is configured and
    /// `ConfigError::Invalid` if it is not an absolute http(s) URL.
    pub fn require_target_origin(&self) -> Result<Url, ConfigError> {
        let raw = self.target_origin.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "target_origin".into(),
            hint: "Set TARGET_ORIGIN or DELTAPROXY_TARGET_ORIGIN environment variable".into(),
        })?;
        validation::parse_origin(raw)
    }
}
