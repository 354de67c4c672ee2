//! Configuration for redopctl.
//!
//! Everything comes from `REDOP_*` environment variables. The render layout
//! must match the one the operator runs with, otherwise every artifact diffs.

use std::str::FromStr;

use anyhow::{Context, Result};
use redop_redis_config::{
    Placement, RenderOptions, DEFAULT_ADDRESS_DIRECTIVE, DEFAULT_ARTIFACT_KEY,
};

use crate::error::CliError;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(CliError::InvalidSetting {
                name: "REDOP_LOG_FORMAT",
                value: s.to_string(),
            }),
        }
    }
}

/// redopctl configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default tracing filter (trace, debug, info, warn, error). `RUST_LOG` wins.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Layout of the rendered artifact.
    pub render: RenderOptions,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let log_level = lookup("REDOP_LOG_LEVEL").unwrap_or_else(|| "warn".to_string());

        let log_format = lookup("REDOP_LOG_FORMAT")
            .map(|v| v.parse::<LogFormat>())
            .transpose()?
            .unwrap_or_default();

        let artifact_key =
            lookup("REDOP_ARTIFACT_KEY").unwrap_or_else(|| DEFAULT_ARTIFACT_KEY.to_string());

        let address_directive = lookup("REDOP_ADDRESS_DIRECTIVE")
            .unwrap_or_else(|| DEFAULT_ADDRESS_DIRECTIVE.to_string());

        let address_placement = lookup("REDOP_ADDRESS_PLACEMENT")
            .map(|v| v.parse::<Placement>())
            .transpose()
            .context("invalid REDOP_ADDRESS_PLACEMENT")?
            .unwrap_or_default();

        if artifact_key.is_empty() {
            return Err(CliError::InvalidSetting {
                name: "REDOP_ARTIFACT_KEY",
                value: artifact_key,
            }
            .into());
        }
        if address_directive.is_empty() || address_directive.contains(char::is_whitespace) {
            return Err(CliError::InvalidSetting {
                name: "REDOP_ADDRESS_DIRECTIVE",
                value: address_directive,
            }
            .into());
        }

        Ok(Self {
            log_level,
            log_format,
            render: RenderOptions {
                artifact_key,
                address_directive,
                address_placement,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.render, RenderOptions::default());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("REDOP_LOG_LEVEL", "debug"),
            ("REDOP_LOG_FORMAT", "JSON"),
            ("REDOP_ARTIFACT_KEY", "redis-6.conf"),
            ("REDOP_ADDRESS_DIRECTIVE", "slaveof"),
            ("REDOP_ADDRESS_PLACEMENT", "first"),
        ])
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.render.artifact_key, "redis-6.conf");
        assert_eq!(config.render.address_directive, "slaveof");
        assert_eq!(config.render.address_placement, Placement::First);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(load(&[("REDOP_LOG_FORMAT", "xml")]).is_err());
        assert!(load(&[("REDOP_ADDRESS_PLACEMENT", "middle")]).is_err());
        assert!(load(&[("REDOP_ADDRESS_DIRECTIVE", "replica of")]).is_err());
        assert!(load(&[("REDOP_ARTIFACT_KEY", "")]).is_err());
    }
}
