//! Data transfer objects mirroring the service's JSON schema.
//!
//! Required fields are plain values, nullable ones are `Option` and skipped
//! when absent. Unknown fields are ignored on decode so newer server versions
//! keep decoding. Schema invariants are enforced by the service, not here.

mod common;
mod environments;
mod flags;
mod patch;
mod projects;
mod segments;

pub use common::{ClientSideAvailability, Link, Links};
pub use environments::{Environment, EnvironmentPost};
pub use flags::{
    Clause, Defaults, FeatureFlag, FeatureFlagBody, FeatureFlagConfig, FeatureFlags, Prerequisite, Rollout,
    Rule, Target, Variation, VariationOrRollout, WeightedVariation,
};
pub use patch::{PatchOp, PatchOperation, PatchWithComment};
pub use projects::{Project, ProjectPost, Projects};
pub use segments::{SegmentBody, UserSegment, UserSegmentRule, UserSegments};
