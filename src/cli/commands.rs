use crate::{
    DEFAULT_BUILDER_AUDIENCE, DEFAULT_FULCIO_URL, DEFAULT_OIDC_CLIENT_ID, DEFAULT_REKOR_URL,
};
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Debug, Subcommand)]
pub enum BuilderCommands {
    /// Build a Go binary from a build configuration file
    Build {
        /// Path to the build configuration (e.g. .slsa-goreleaser.yml)
        config: PathBuf,

        /// Extra environment values, comma-separated NAME:VALUE pairs
        #[arg(default_value = "")]
        env_args: String,

        /// Only print the resolved command and environment
        #[arg(long = "dry")]
        dry: bool,
    },
    /// Generate, sign and upload provenance for a built binary
    Provenance {
        /// Name of the built binary
        #[arg(long = "binary-name")]
        binary_name: String,

        /// Hex-encoded SHA-256 digest of the binary
        #[arg(long = "digest")]
        digest: String,

        /// base64-encoded JSON array of the build command
        #[arg(long = "command", default_value = "")]
        command: String,

        /// base64-encoded JSON array of the build environment
        #[arg(long = "env", default_value = "")]
        env: String,

        /// Certificate authority URL
        #[arg(long = "fulcio-url", env = "FULCIO_URL", default_value = DEFAULT_FULCIO_URL)]
        fulcio_url: String,

        /// Transparency log URL
        #[arg(long = "rekor-url", env = "REKOR_URL", default_value = DEFAULT_REKOR_URL)]
        rekor_url: String,

        /// Audience of the token exchanged for a signing certificate
        #[arg(long = "oidc-client-id", default_value = DEFAULT_OIDC_CLIENT_ID)]
        oidc_client_id: String,

        /// Audience of the token naming the builder workflow
        #[arg(long = "builder-audience", default_value = DEFAULT_BUILDER_AUDIENCE)]
        builder_audience: String,
    },
}
