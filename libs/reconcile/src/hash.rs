//! Content hash of the desired state.
//!
//! Stamped on the workload as an annotation so that a configuration change
//! rolls the pods, while a mere respelling of a quantity does not.

use redop_redis_config::RenderedArtifact;
use redop_resources::{normalize, ResourceList, ResourceSpec};
use sha2::{Digest, Sha256};

/// Annotation carrying the [`SpecHash`] on the workload's pod template.
pub const SPEC_HASH_ANNOTATION: &str = "redop.io/spec-hash";

/// A spec hash for deterministic comparison.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpecHash(String);

impl SpecHash {
    /// Hash a rendered artifact together with the resources it runs with.
    ///
    /// Resources are normalized first, so `4096Mi` and `4Gi` hash the same.
    pub fn compute(artifact: &RenderedArtifact, resources: &ResourceSpec) -> Self {
        let resources = normalize(resources);

        let mut object = serde_json::Map::new();
        object.insert("artifact_key".to_string(), artifact.key().into());
        object.insert("content".to_string(), artifact.content().into());
        let limits = resource_list_json(&resources.limits);
        object.insert("limits".to_string(), limits);
        let requests = resource_list_json(&resources.requests);
        object.insert("requests".to_string(), requests);

        Self::from_json(&serde_json::Value::Object(object))
    }

    /// Compute a spec hash from canonical JSON.
    pub fn from_json(json: &serde_json::Value) -> Self {
        let canonical = canonical_json(json);
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let result = hasher.finalize();
        Self(format!("sha256:{}", hex::encode(&result[..16])))
    }

    /// Get the hash string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SpecHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn resource_list_json(list: &ResourceList) -> serde_json::Value {
    serde_json::Value::Object(
        list.iter()
            .map(|(name, quantity)| (name.clone(), quantity.as_str().into()))
            .collect(),
    )
}

/// Produce canonical JSON (sorted keys, no extra whitespace).
fn canonical_json(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Object(map) => {
            let mut pairs: Vec<_> = map.iter().collect();
            pairs.sort_by_key(|(k, _)| *k);
            let inner: Vec<String> = pairs
                .iter()
                .map(|(k, v)| format!("{}:{}", json_string(k), canonical_json(v)))
                .collect();
            format!("{{{}}}", inner.join(","))
        }
        serde_json::Value::Array(arr) => {
            let inner: Vec<String> = arr.iter().map(canonical_json).collect();
            format!("[{}]", inner.join(","))
        }
        serde_json::Value::String(s) => json_string(s),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null => "null".to_string(),
    }
}

/// Quote a string the way serde_json does.
fn json_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}
