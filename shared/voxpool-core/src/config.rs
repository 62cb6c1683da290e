//! Configuration management for microservices

use crate::error::{Result, VoxpoolError};
use std::collections::HashMap;
use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;

/// Where configuration values come from, keyed by environment variable name.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;

    /// Value with surrounding whitespace removed; blank values count as unset.
    fn get_non_empty(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn get_or(&self, key: &str, default: &str) -> String {
        self.get_non_empty(key).unwrap_or_else(|| default.to_string())
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get_non_empty(key) {
            Some(raw) => raw
                .parse()
                .map_err(|e| VoxpoolError::Config(format!("Invalid {}: {}", key, e))),
            None => Ok(default),
        }
    }
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub service_name: String,
    pub http_bind: SocketAddr,
    pub log_level: String,
    pub json_logs: bool,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_source(&ProcessEnv)
    }

    pub fn from_source(source: &impl EnvSource) -> Result<Self> {
        Self::named(source, "unknown")
    }

    /// Like `from_source`, with `default_name` used when `SERVICE_NAME` is unset
    pub fn named(source: &impl EnvSource, default_name: &str) -> Result<Self> {
        let default_bind: SocketAddr = ([0, 0, 0, 0], 8080).into();
        Ok(Self {
            service_name: source.get_or("SERVICE_NAME", default_name),
            http_bind: source.parse_or("HTTP_BIND", default_bind)?,
            log_level: source.get_or("RUST_LOG", "info"),
            json_logs: source
                .get_non_empty("JSON_LOGS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        })
    }
}
