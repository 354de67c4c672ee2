//! # redop-redis-config
//!
//! Canonical `redis.conf` rendering for the operator's ConfigMap.
//!
//! ## Format
//!
//! ```text
//! maxmemory 2gb
//! save 60 1000
//! timeout 0
//! replicaof 192.168.1.100 6379
//! ```
//!
//! User directives are sorted byte-wise by key so that the rendered text is a
//! pure function of the directive set and the master address. The address
//! directive sits at a fixed position (after the sorted block by default). The
//! whole text is stored under a single key (`redis.conf` by default), and the
//! reconciler compares it byte-for-byte with what is in the cluster.

mod address;
mod error;
mod render;

pub use address::{Address, DEFAULT_REDIS_PORT};
pub use error::ConfigError;
pub use render::{
    check_directive, render, ConfigRenderer, ParsedConfig, Placement, RenderOptions,
    RenderedArtifact, DEFAULT_ADDRESS_DIRECTIVE, DEFAULT_ARTIFACT_KEY,
};
