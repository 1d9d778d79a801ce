//! # SLSA Go Builder
//!
//! Build Go binaries inside a GitHub Actions reusable workflow and produce
//! signed SLSA v0.2 provenance for them.
//!
//! The tool runs in two steps of the same workflow:
//!
//! 1. `build` reads a `.slsa-goreleaser.yml` build configuration, resolves the
//!    compiler invocation and either runs it or (with `--dry`) publishes the
//!    resolved command and environment as workflow outputs;
//! 2. `provenance` turns the binary name, its SHA-256 digest and the resolved
//!    invocation into an in-toto statement, signs it with a short-lived
//!    certificate bound to the workflow identity, records it in a
//!    transparency log and writes `<binary>.intoto.jsonl`.
//!
//! ## Quick Start
//!
//! ```bash
//! slsa-builder-go build .slsa-goreleaser.yml "VERSION_LDFLAGS:-X main.v=1" --dry
//! slsa-builder-go provenance \
//!     --binary-name=app \
//!     --digest=$(sha256sum app | cut -d' ' -f1) \
//!     --command=$GO_COMMAND \
//!     --env=$GO_ENV
//! ```

#![doc(html_root_url = "https://docs.rs/slsa-go-builder/0.1.0")]

pub mod build;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod hash;
pub mod identity;
pub mod in_toto;
pub mod signing;
pub mod slsa;
#[cfg(test)]
mod tests;
pub mod transparency;
pub mod utils;

// Re-export error types
pub use error::{Error, Result};

pub const DEFAULT_FULCIO_URL: &str = "https://v1.fulcio.sigstore.dev";
pub const DEFAULT_REKOR_URL: &str = "https://rekor.sigstore.dev";
/// Audience of the token exchanged for a signing certificate.
pub const DEFAULT_OIDC_CLIENT_ID: &str = "sigstore";
/// Audience of the token carrying the builder's `job_workflow_ref`.
pub const DEFAULT_BUILDER_AUDIENCE: &str = "slsa-framework/slsa-github-generator-go/builder";

/// Provenance signing configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Certificate authority base URL
    pub fulcio_url: String,
    /// Transparency log base URL
    pub rekor_url: String,
    pub oidc_client_id: String,
    pub builder_audience: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fulcio_url: DEFAULT_FULCIO_URL.to_string(),
            rekor_url: DEFAULT_REKOR_URL.to_string(),
            oidc_client_id: DEFAULT_OIDC_CLIENT_ID.to_string(),
            builder_audience: DEFAULT_BUILDER_AUDIENCE.to_string(),
        }
    }
}

/// Initialize logging for the CLI
///
/// # Examples
///
/// ```
/// use slsa_go_builder::init_logging;
///
/// // Might fail if a logger is already installed
/// let result = init_logging();
/// assert!(result.is_ok() || result.is_err());
/// ```
pub fn init_logging() -> Result<()> {
    env_logger::try_init().map_err(|e| Error::InitializationError(e.to_string()))
}

// Re-export commonly used types and traits
pub use transparency::TransparencyLog;
