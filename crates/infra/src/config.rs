//! Configuration loading and representation.
//!
//! Everything comes from process environment variables:
//!
//! | Variable | Default |
//! |---|---|
//! | `BIND_ADDR` | `0.0.0.0` |
//! | `PORT` | `5000` |
//! | `REDIS_URL` | `redis://127.0.0.1:6379` |
//! | `RESIDENT_STORE` | `redis` (or `memory`) |
//!
//! Empty values count as unset.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var}={value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Which hash store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" | "in-memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend '{other}' (expected redis or memory)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub redis_url: String,
    pub store_backend: StoreBackend,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            store_backend: StoreBackend::Redis,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable lookup (tests pass a map here).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();

        if let Some(v) = get("BIND_ADDR") {
            cfg.bind_addr = parse_var("BIND_ADDR", v)?;
        }
        if let Some(v) = get("PORT") {
            cfg.port = parse_var("PORT", v)?;
        }
        if let Some(v) = get("REDIS_URL") {
            cfg.redis_url = v;
        }
        if let Some(v) = get("RESIDENT_STORE") {
            cfg.store_backend = parse_var("RESIDENT_STORE", v)?;
        }

        Ok(cfg)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn parse_var<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    let parsed = value.trim().parse::<T>();
    parsed.map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
        value,
    })
}
