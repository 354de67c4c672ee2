//! Drift detection primitives for the Redis reconciler.
//!
//! The reconciler reads observed state, computes desired state, compares the
//! two and writes only when something actually differs. This library holds the
//! comparison side:
//!
//! - **Map comparison** ([`maps_equal`], [`is_subset`]): labels, annotations and
//!   other key/value metadata. Absent maps equal empty maps.
//! - **Drift assessment** ([`assess`]): renders the desired `redis.conf`,
//!   normalizes resources, and reports which aspects drifted.
//! - **Spec hash** ([`SpecHash`]): a stable hash of the desired artifact and
//!   resources for a pod template annotation.
//!
//! # Invariants
//!
//! - Every operation is a pure function of its inputs
//! - Results never depend on map iteration order
//! - A converged resource assesses as converged on every later pass

mod drift;
mod hash;
mod maps;

pub use drift::{assess, Assessment, DesiredState, DriftAspect, DriftReport, ObservedState};
pub use hash::{SpecHash, SPEC_HASH_ANNOTATION};
pub use maps::{is_subset, maps_equal, KeyValues};
