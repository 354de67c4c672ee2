//! # redop-resources
//!
//! Resource requirements for Redis workloads and their canonical form.
//!
//! ## Normalization
//!
//! The API server hands back quantities in whatever spelling it prefers, while
//! the desired state carries the spelling the user wrote. Comparing the two as
//! text makes the reconciler rewrite objects that have not changed. [`normalize`]
//! rewrites every quantity into one compact spelling so that both sides can be
//! compared byte-for-byte:
//!
//! - memory-class resources use the largest exact binary suffix (`4096Mi` → `4Gi`)
//! - `cpu` uses whole cores when exact, milli-cores otherwise (`1000m` → `1`)
//! - everything else passes through untouched
//!
//! Normalization never changes a magnitude and is idempotent.

mod error;
mod quantity;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

pub use error::QuantityError;
pub use quantity::{Magnitude, Quantity, BINARY_SUFFIXES};

/// CPU resource name.
pub const RESOURCE_CPU: &str = "cpu";

/// Memory resource name.
pub const RESOURCE_MEMORY: &str = "memory";

/// Ephemeral storage resource name.
pub const RESOURCE_EPHEMERAL_STORAGE: &str = "ephemeral-storage";

/// Persistent storage resource name.
pub const RESOURCE_STORAGE: &str = "storage";

/// A table of resource name to quantity.
pub type ResourceList = BTreeMap<String, Quantity>;

/// Compute resource limits and requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Upper bounds.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub limits: ResourceList,

    /// Guaranteed amounts.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub requests: ResourceList,
}

impl ResourceSpec {
    /// Create an empty spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a limit, parsing the quantity leniently.
    pub fn with_limit(mut self, name: impl Into<String>, quantity: impl Into<String>) -> Self {
        let quantity = Quantity::parse_lossy(quantity);
        self.limits.insert(name.into(), quantity);
        self
    }

    /// Add a request, parsing the quantity leniently.
    pub fn with_request(mut self, name: impl Into<String>, quantity: impl Into<String>) -> Self {
        let quantity = Quantity::parse_lossy(quantity);
        self.requests.insert(name.into(), quantity);
        self
    }

    /// Returns true if neither table has entries.
    pub fn is_empty(&self) -> bool {
        self.limits.is_empty() && self.requests.is_empty()
    }

    /// Returns true if both specs have the same names with the same display forms.
    ///
    /// Unlike `==`, which compares magnitudes, this is the textual comparison a
    /// stored object is subject to.
    pub fn is_identical(&self, other: &Self) -> bool {
        lists_identical(&self.limits, &other.limits)
            && lists_identical(&self.requests, &other.requests)
    }
}

fn lists_identical(a: &ResourceList, b: &ResourceList) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .all(|((ka, qa), (kb, qb))| ka == kb && qa.is_identical(qb))
}

/// How a resource name is canonicalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceClass {
    /// Cores, canonicalized in whole or milli units.
    Cpu,

    /// Bytes, canonicalized with binary suffixes.
    Memory,

    /// Left as written.
    Other,
}

impl ResourceClass {
    /// Classify a resource name.
    pub fn of(name: &str) -> Self {
        match name {
            RESOURCE_CPU => Self::Cpu,
            RESOURCE_MEMORY | RESOURCE_EPHEMERAL_STORAGE | RESOURCE_STORAGE => Self::Memory,
            _ => Self::Other,
        }
    }
}

/// Rewrite every quantity in `spec` into its most compact exact form.
pub fn normalize(spec: &ResourceSpec) -> ResourceSpec {
    ResourceSpec {
        limits: normalize_list(&spec.limits),
        requests: normalize_list(&spec.requests),
    }
}

fn normalize_list(list: &ResourceList) -> ResourceList {
    list.iter()
        .map(|(name, quantity)| (name.clone(), normalize_quantity(name, quantity)))
        .collect()
}

/// Rewrite a single quantity according to the class of `name`.
pub fn normalize_quantity(name: &str, quantity: &Quantity) -> Quantity {
    let Some(magnitude) = quantity.magnitude() else {
        trace!(resource = name, quantity = %quantity, "Passing through opaque quantity");
        return quantity.clone();
    };

    let compact = match ResourceClass::of(name) {
        ResourceClass::Cpu => compact_cpu(magnitude),
        ResourceClass::Memory => compact_binary(magnitude),
        ResourceClass::Other => None,
    };

    match compact {
        Some(display) => Quantity::with_magnitude(display, magnitude),
        None => {
            trace!(resource = name, quantity = %quantity, "Quantity has no exact compact form");
            quantity.clone()
        }
    }
}

/// Whole bytes divided by 1024 for as long as the result stays exact.
fn compact_binary(magnitude: Magnitude) -> Option<String> {
    let mut value = magnitude.to_integer()?;
    let mut unit = "";

    for suffix in BINARY_SUFFIXES {
        if value == 0 || value % 1024 != 0 {
            break;
        }
        value /= 1024;
        unit = suffix;
    }

    Some(format!("{value}{unit}"))
}

/// Whole cores when exact, milli-cores otherwise.
fn compact_cpu(magnitude: Magnitude) -> Option<String> {
    let millis = magnitude.scaled_by_ten(3)?.to_integer()?;

    if millis % 1000 == 0 {
        Some(format!("{}", millis / 1000))
    } else {
        Some(format!("{millis}m"))
    }
}
