//! Desired and observed state documents.
//!
//! Documents are TOML unless the file name ends in `.json`:
//!
//! ```toml
//! [metadata.labels]
//! app = "redis"
//!
//! [config]
//! maxmemory = "2gb"
//! save = "60 1000"
//!
//! [resources.limits]
//! memory = "4096Mi"
//! cpu = "1000m"
//! ```
//!
//! Observed documents carry `data` (the store object's key/text entries)
//! instead of `config`.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::Result;
use redop_reconcile::{DesiredState, ObservedState};
use redop_redis_config::{check_directive, ConfigError};
use redop_resources::ResourceSpec;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::CliError;

/// Object metadata.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Metadata {
    #[serde(default)]
    pub labels: Option<BTreeMap<String, String>>,

    #[serde(default)]
    pub annotations: Option<BTreeMap<String, String>>,
}

/// Desired state document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DesiredDocument {
    #[serde(default)]
    pub metadata: Metadata,

    /// redis.conf directives.
    #[serde(default)]
    pub config: Option<HashMap<String, String>>,

    #[serde(default)]
    pub resources: ResourceSpec,
}

impl From<DesiredDocument> for DesiredState {
    fn from(doc: DesiredDocument) -> Self {
        Self {
            labels: doc.metadata.labels,
            annotations: doc.metadata.annotations,
            config: doc.config,
            resources: doc.resources,
        }
    }
}

impl DesiredDocument {
    /// Check that every directive renders as a single line.
    pub fn check_directives(&self) -> Result<(), ConfigError> {
        self.config
            .iter()
            .flatten()
            .try_for_each(|(key, value)| check_directive(key, value))
    }
}

/// Observed state document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObservedDocument {
    #[serde(default)]
    pub metadata: Metadata,

    /// Key/text entries of the configuration store object.
    #[serde(default)]
    pub data: Option<BTreeMap<String, String>>,

    #[serde(default)]
    pub resources: ResourceSpec,
}

impl From<ObservedDocument> for ObservedState {
    fn from(doc: ObservedDocument) -> Self {
        Self {
            labels: doc.metadata.labels,
            annotations: doc.metadata.annotations,
            data: doc.data,
            resources: doc.resources,
        }
    }
}

/// Serialization of a document file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Toml,
    Json,
}

impl DocumentFormat {
    /// Pick the format from the file extension.
    pub fn of(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

/// Parse a document from a string.
pub fn parse_document<T: DeserializeOwned>(
    contents: &str,
    format: DocumentFormat,
    path: &Path,
) -> Result<T> {
    let parsed = match format {
        DocumentFormat::Toml => toml::from_str(contents).map_err(|e| e.to_string()),
        DocumentFormat::Json => serde_json::from_str(contents).map_err(|e| e.to_string()),
    };

    parsed.map_err(|message| {
        CliError::InvalidDocument {
            path: path.to_path_buf(),
            message,
        }
        .into()
    })
}

/// Read and parse a document file.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path).map_err(|source| CliError::UnreadableDocument {
        path: path.to_path_buf(),
        source,
    })?;

    let format = DocumentFormat::of(path);
    debug!(path = %path.display(), format = ?format, "Loading document");
    parse_document(&contents, format, path)
}

/// Read a desired state document and check its directives.
pub fn load_desired(path: &Path) -> Result<DesiredDocument> {
    let doc: DesiredDocument = load_document(path)?;
    doc.check_directives().map_err(|e| CliError::InvalidDocument {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use redop_resources::{RESOURCE_CPU, RESOURCE_MEMORY};

    const DESIRED: &str = r#"
[metadata.labels]
app = "redis"

[config]
save = "60 1000"
maxmemory = "2gb"
timeout = "0"

[resources.limits]
memory = "4096Mi"
cpu = "1000m"
"#;

    #[test]
    fn test_parse_desired_toml() {
        let doc: DesiredDocument =
            parse_document(DESIRED, DocumentFormat::Toml, Path::new("redis.toml")).unwrap();
        let state = DesiredState::from(doc);

        assert_eq!(state.labels.unwrap()["app"], "redis");
        assert_eq!(state.config.as_ref().map(HashMap::len), Some(3));
        assert_eq!(state.resources.limits[RESOURCE_MEMORY].as_str(), "4096Mi");
        assert_eq!(state.resources.limits[RESOURCE_CPU].as_str(), "1000m");
        assert!(state.resources.requests.is_empty());
    }

    #[test]
    fn test_parse_observed_json() {
        let json = r#"{
            "metadata": {"labels": {"app": "redis", "pod-template-hash": "abc"}},
            "data": {"redis.conf": "timeout 0\nreplicaof 10.0.0.1 6379\n"},
            "resources": {"requests": {"memory": "4Gi"}}
        }"#;

        let doc: ObservedDocument =
            parse_document(json, DocumentFormat::Json, Path::new("observed.json")).unwrap();
        let state = ObservedState::from(doc);

        assert_eq!(state.labels.map(|l| l.len()), Some(2));
        assert!(state.data.unwrap().contains_key("redis.conf"));
        assert_eq!(state.resources.requests[RESOURCE_MEMORY].as_str(), "4Gi");
    }

    #[test]
    fn test_empty_document_is_default() {
        let doc: DesiredDocument =
            parse_document("", DocumentFormat::Toml, Path::new("empty.toml")).unwrap();
        assert!(doc.config.is_none());
        assert!(doc.metadata.labels.is_none());
        assert!(doc.resources.is_empty());
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let err = parse_document::<DesiredDocument>(
            "[spec]\nreplicas = 3\n",
            DocumentFormat::Toml,
            Path::new("bad.toml"),
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::InvalidDocument { .. })
        ));
    }

    #[test]
    fn test_check_directives() {
        let doc: DesiredDocument =
            parse_document(DESIRED, DocumentFormat::Toml, Path::new("redis.toml")).unwrap();
        assert_eq!(doc.check_directives(), Ok(()));

        let injected = "[config]\nsave = \"60 1000\\nreplicaof 1.2.3.4 1\"\n";
        let doc: DesiredDocument =
            parse_document(injected, DocumentFormat::Toml, Path::new("bad.toml")).unwrap();
        assert!(matches!(
            doc.check_directives(),
            Err(ConfigError::InvalidDirective { .. })
        ));
    }

    #[test]
    fn test_load_desired_rejects_multiline_directive() {
        let name = format!("redopctl-{}-desired.json", std::process::id());
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, r#"{"config": {"save": "60 1000\nreplicaof 1.2.3.4 1"}}"#).unwrap();

        let err = load_desired(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::InvalidDocument { .. })
        ));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::of(Path::new("a.json")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::of(Path::new("a.JSON")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::of(Path::new("a.toml")), DocumentFormat::Toml);
        assert_eq!(DocumentFormat::of(Path::new("a")), DocumentFormat::Toml);
    }

    #[test]
    fn test_missing_file() {
        let err = load_document::<DesiredDocument>(Path::new("/nonexistent/redis.toml"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::UnreadableDocument { .. })
        ));
    }
}
