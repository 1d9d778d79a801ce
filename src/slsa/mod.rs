//! # SLSA Build Provenance
//!
//! This module produces SLSA v0.2 build provenance for a Go binary compiled
//! by the reusable builder workflow, and drives it through signing and
//! transparency-log upload.
//!
//! ## Key Components
//!
//! - [`generators`] - validation of untrusted inputs and construction of the
//!   unsigned provenance statement
//! - [`cli`] - the end-to-end pipeline: identity, signing, upload
//! - [`ProvenancePredicate`] and friends - the predicate data model
//!
//! The provenance records exactly one build step: one attestation corresponds
//! to one compiler invocation.

use crate::in_toto::{DigestSet, Statement};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod cli;
pub mod generators;

/// SLSA v0.2 build provenance predicate type URI.
///
/// ```
/// use slsa_go_builder::slsa::PROVENANCE_PREDICATE_TYPE_V02;
///
/// assert_eq!(PROVENANCE_PREDICATE_TYPE_V02, "https://slsa.dev/provenance/v0.2");
/// ```
pub const PROVENANCE_PREDICATE_TYPE_V02: &str = "https://slsa.dev/provenance/v0.2";

/// Identifies a build performed by the Go builder workflow.
pub const GO_BUILDER_BUILD_TYPE: &str = "https://github.com/slsa-framework/slsa-github-generator-go@v1";

/// Version of the `invocation.parameters` layout.
pub const PARAMETERS_VERSION: i64 = 1;

/// Version of the `buildConfig` layout.
pub const BUILD_CONFIG_VERSION: i64 = 1;

pub type ProvenanceStatement = Statement<ProvenancePredicate>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenancePredicate {
    pub builder: Builder,
    #[serde(rename = "buildType")]
    pub build_type: String,
    pub invocation: Invocation,
    #[serde(rename = "buildConfig")]
    pub build_config: ProvenanceBuildConfig,
    pub materials: Vec<Material>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Builder {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    #[serde(rename = "configSource")]
    pub config_source: ConfigSource,
    pub parameters: Parameters,
    pub environment: Environment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSource {
    pub uri: String,
    pub digest: DigestSet,
    #[serde(rename = "entryPoint")]
    pub entry_point: String,
}

/// Parameters coming from the trigger event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub version: i64,
    pub event_name: String,
    pub event_payload: Value,
    pub ref_type: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub base_ref: String,
    pub head_ref: String,
    pub actor: String,
    pub sha1: String,
}

/// Facts about the runner that the caller cannot influence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub arch: String,
    pub github_event_name: String,
    pub github_run_attempt: String,
    pub github_run_id: String,
    pub github_run_number: String,
    pub os: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceBuildConfig {
    pub version: i64,
    pub steps: Vec<ProvenanceStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceStep {
    pub command: Vec<String>,
    pub env: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub uri: String,
    pub digest: DigestSet,
}
