//! # Runtime Configuration Module
//!
//! Application configuration: an optional YAML file, then environment overrides.
//!
//! ```yaml
//! server:
//!   addr: "0.0.0.0:8080"
//!   api_prefix: api
//!   stack_size: 0x4000
//! generator:
//!   base_path: api
//!   naming: path            # or operation-id
//!   default_group: Default
//!   strict_collisions: false
//! uploads:
//!   dir: ./uploaded-specs   # omit to keep uploads in memory only
//! ```
//!
//! ## Environment Variables
//!
//! | Variable               | Overrides                  |
//! |------------------------|----------------------------|
//! | `LIVEROUTE_ADDR`       | `server.addr`              |
//! | `LIVEROUTE_STACK_SIZE` | `server.stack_size`        |
//! | `LIVEROUTE_BASE_PATH`  | `generator.base_path`      |
//! | `LIVEROUTE_NAMING`     | `generator.naming`         |
//! | `LIVEROUTE_UPLOAD_DIR` | `uploads.dir`              |
//!
//! `LIVEROUTE_STACK_SIZE` accepts decimal (`32768`) or hexadecimal (`0x8000`) values.
//! The stack size applies to every `may` coroutine serving HTTP requests.

use crate::generator::{GeneratorConfig, NamingStrategy};
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::env;
use std::path::{Path, PathBuf};

const DEFAULT_STACK_SIZE: usize = 0x4000;

fn parse_stack_size(val: &str) -> Option<usize> {
    let val = val.trim();
    match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}

fn deserialize_stack_size<'de, D: Deserializer<'de>>(d: D) -> Result<usize, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(usize),
        Text(String),
    }
    match Raw::deserialize(d)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) => parse_stack_size(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid stack size '{s}'"))),
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind
    pub addr: String,
    /// Prefix of the swagger and dynamic routes (`api` → `/api/dynamic/...`)
    pub api_prefix: String,
    /// Coroutine stack size in bytes
    #[serde(deserialize_with = "deserialize_stack_size")]
    pub stack_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
            api_prefix: "api".to_string(),
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Directory uploaded specifications are persisted to
    pub dir: Option<PathBuf>,
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub generator: GeneratorConfig,
    pub uploads: UploadConfig,
}

impl AppConfig {
    /// Parse a YAML configuration document.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).context("invalid configuration")
    }

    /// Read `path` (if given), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)
                    .with_context(|| format!("failed to read config file {}", p.display()))?;
                Self::from_yaml(&text).with_context(|| format!("in {}", p.display()))?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `LIVEROUTE_*` overrides looked up through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(addr) = lookup("LIVEROUTE_ADDR") {
            self.server.addr = addr;
        }
        if let Some(raw) = lookup("LIVEROUTE_STACK_SIZE") {
            self.server.stack_size = parse_stack_size(&raw)
                .with_context(|| format!("invalid LIVEROUTE_STACK_SIZE '{raw}'"))?;
        }
        if let Some(base) = lookup("LIVEROUTE_BASE_PATH") {
            self.generator.base_path = base;
        }
        if let Some(raw) = lookup("LIVEROUTE_NAMING") {
            self.generator.naming = raw
                .parse::<NamingStrategy>()
                .map_err(anyhow::Error::msg)
                .context("invalid LIVEROUTE_NAMING")?;
        }
        if let Some(dir) = lookup("LIVEROUTE_UPLOAD_DIR") {
            self.uploads.dir = (!dir.trim().is_empty()).then(|| PathBuf::from(dir));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.addr, "0.0.0.0:8080");
        assert_eq!(config.server.api_prefix, "api");
        assert_eq!(config.server.stack_size, 0x4000);
        assert_eq!(config.generator, GeneratorConfig::default());
        assert!(config.uploads.dir.is_none());
    }

    #[test]
    fn test_partial_yaml() {
        let config = AppConfig::from_yaml(
            "server:\n  addr: 127.0.0.1:9000\n  stack_size: '0x8000'\ngenerator:\n  strict_collisions: true\n",
        )
        .unwrap();
        assert_eq!(config.server.addr, "127.0.0.1:9000");
        assert_eq!(config.server.api_prefix, "api");
        assert_eq!(config.server.stack_size, 0x8000);
        assert!(config.generator.strict_collisions);
        assert_eq!(config.generator.base_path, "api");
    }

    #[test]
    fn test_numeric_stack_size() {
        let config = AppConfig::from_yaml("server:\n  stack_size: 65536\n").unwrap();
        assert_eq!(config.server.stack_size, 65536);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("LIVEROUTE_ADDR", "127.0.0.1:1234"),
            ("LIVEROUTE_STACK_SIZE", "0x10000"),
            ("LIVEROUTE_NAMING", "operation-id"),
            ("LIVEROUTE_UPLOAD_DIR", "/tmp/specs"),
        ]
        .into_iter()
        .collect();
        let mut config = AppConfig::default();
        config
            .apply_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.server.addr, "127.0.0.1:1234");
        assert_eq!(config.server.stack_size, 0x10000);
        assert_eq!(config.generator.naming, NamingStrategy::OperationId);
        assert_eq!(config.uploads.dir, Some(PathBuf::from("/tmp/specs")));
    }

    #[test]
    fn test_invalid_override_is_error() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(|k| (k == "LIVEROUTE_NAMING").then(|| "tags".to_string()))
            .unwrap_err();
        assert!(format!("{err:#}").contains("unknown naming strategy"));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(AppConfig::from_yaml("server: [").is_err());
        assert_eq!(AppConfig::from_yaml("").unwrap(), AppConfig::default());
    }
}
