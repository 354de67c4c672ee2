//! Drift assessment for a single Redis resource.
//!
//! Computes the desired artifact and normalized resources once, compares them
//! with what was observed, and reports which aspects need a write.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use redop_redis_config::{Address, ConfigRenderer, RenderedArtifact};
use redop_resources::{normalize, ResourceSpec};
use tracing::debug;

use crate::hash::SpecHash;
use crate::maps::is_subset;

/// The state the user asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredState {
    /// Labels that must be present on the managed objects.
    pub labels: Option<BTreeMap<String, String>>,

    /// Annotations that must be present on the managed objects.
    pub annotations: Option<BTreeMap<String, String>>,

    /// redis.conf directives.
    pub config: Option<HashMap<String, String>>,

    /// Container resources.
    pub resources: ResourceSpec,
}

/// The state read back from the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedState {
    /// Labels on the object, including ones added by other actors.
    pub labels: Option<BTreeMap<String, String>>,

    /// Annotations on the object, including ones added by other actors.
    pub annotations: Option<BTreeMap<String, String>>,

    /// Data of the configuration store object, if it exists.
    pub data: Option<BTreeMap<String, String>>,

    /// Container resources.
    pub resources: ResourceSpec,
}

/// An aspect of a resource that can drift independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DriftAspect {
    /// Desired labels missing or different.
    Labels,

    /// Desired annotations missing or different.
    Annotations,

    /// Rendered configuration missing or not byte-identical.
    Config,

    /// Normalized resources differ.
    Resources,
}

impl DriftAspect {
    /// All aspects in report order.
    pub const ALL: [DriftAspect; 4] = [
        DriftAspect::Labels,
        DriftAspect::Annotations,
        DriftAspect::Config,
        DriftAspect::Resources,
    ];

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Labels => "labels",
            Self::Annotations => "annotations",
            Self::Config => "config",
            Self::Resources => "resources",
        }
    }
}

impl fmt::Display for DriftAspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which aspects drifted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriftReport {
    drifted: Vec<DriftAspect>,
}

impl DriftReport {
    /// Returns true if any aspect drifted.
    pub fn needs_update(&self) -> bool {
        !self.drifted.is_empty()
    }

    /// Returns true if `aspect` drifted.
    pub fn is_drifted(&self, aspect: DriftAspect) -> bool {
        self.drifted.contains(&aspect)
    }

    /// Drifted aspects in [`DriftAspect::ALL`] order.
    pub fn drifted(&self) -> &[DriftAspect] {
        &self.drifted
    }
}

/// Desired artifacts for one pass plus the drift against observed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    /// The configuration to write when [`DriftAspect::Config`] drifted.
    pub artifact: RenderedArtifact,

    /// The normalized resources to write when [`DriftAspect::Resources`] drifted.
    pub resources: ResourceSpec,

    /// Hash of the desired artifact and resources.
    pub spec_hash: SpecHash,

    /// What drifted.
    pub drift: DriftReport,
}

impl Assessment {
    /// Returns true if the reconciler has to write anything.
    pub fn needs_update(&self) -> bool {
        self.drift.needs_update()
    }
}

/// Compare desired against observed state.
///
/// Observed metadata may carry extra keys; only missing or changed desired keys
/// count as drift. Config and resources are compared exactly, after rendering
/// and normalizing.
pub fn assess(
    renderer: &ConfigRenderer,
    desired: &DesiredState,
    address: &Address,
    observed: &ObservedState,
) -> Assessment {
    let artifact = renderer.render(desired.config.iter().flatten(), address);
    let resources = normalize(&desired.resources);
    let spec_hash = SpecHash::compute(&artifact, &resources);

    let observed_artifact = observed
        .data
        .as_ref()
        .and_then(|data| RenderedArtifact::from_data(artifact.key(), data));

    let mut drifted = Vec::new();
    for aspect in DriftAspect::ALL {
        let is_drifted = match aspect {
            DriftAspect::Labels => {
                !is_subset(observed.labels.as_ref(), desired.labels.as_ref())
            }
            DriftAspect::Annotations => {
                !is_subset(observed.annotations.as_ref(), desired.annotations.as_ref())
            }
            DriftAspect::Config => !observed_artifact
                .as_ref()
                .is_some_and(|observed| observed.matches(&artifact)),
            DriftAspect::Resources => {
                !normalize(&observed.resources).is_identical(&resources)
            }
        };

        if is_drifted {
            debug!(aspect = %aspect, spec_hash = %spec_hash, "Drift detected");
            drifted.push(aspect);
        }
    }

    Assessment {
        artifact,
        resources,
        spec_hash,
        drift: DriftReport { drifted },
    }
}
