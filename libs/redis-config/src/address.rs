//! Connection targets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Default Redis port.
pub const DEFAULT_REDIS_PORT: u16 = 6379;

/// A `(host, port)` connection target, typically the current master.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    /// Hostname or IP address.
    pub host: String,

    /// TCP port.
    pub port: u16,
}

impl Address {
    /// Create a new address.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse the `host port` argument form used inside redis.conf.
    pub fn from_directive_args(args: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidAddress(args.to_string());

        let mut parts = args.split_whitespace();
        let (Some(host), Some(port), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(invalid());
        };
        let port = port.parse().map_err(|_| invalid())?;

        Ok(Self::new(host, port))
    }

    /// The `host port` argument form used inside redis.conf.
    pub fn directive_args(&self) -> String {
        format!("{} {}", self.host, self.port)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Address {
    type Err = ConfigError;

    /// Parse `host:port`, `[v6]:port`, or a bare host with the default port.
    ///
    /// The host must be non-empty and free of whitespace, so that the address
    /// survives a trip through a `host port` directive line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidAddress(s.to_string());

        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
            let port = match tail.strip_prefix(':') {
                Some(port) => port.parse().map_err(|_| invalid())?,
                None if tail.is_empty() => DEFAULT_REDIS_PORT,
                None => return Err(invalid()),
            };
            (host, port)
        } else {
            match s.rsplit_once(':') {
                Some((host, _)) if host.contains(':') => return Err(invalid()),
                Some((host, port)) => (host, port.parse().map_err(|_| invalid())?),
                None => (s, DEFAULT_REDIS_PORT),
            }
        };

        if host.is_empty() || host.contains(char::is_whitespace) {
            return Err(invalid());
        }

        Ok(Self::new(host, port))
    }
}
