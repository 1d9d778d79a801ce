use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Build configuration
    #[error("unsupported build config version: {}", .0.map(|v| v.to_string()).unwrap_or_else(|| "missing".to_string()))]
    UnsupportedVersion(Option<i64>),

    #[error("invalid environment variable: {0}")]
    InvalidEnvironmentVariable(String),

    #[error("invalid directory: {} is not under the working directory", .0.display())]
    InvalidDirectory(PathBuf),

    // Untrusted provenance inputs
    #[error("sha256 digest is not valid: {0}")]
    InvalidDigest(String),

    #[error("invalid binary name: {0}")]
    InvalidName(String),

    #[error("decode error: {0}")]
    Decode(String),

    // Identity exchange
    #[error("identity error: {0}")]
    Identity(String),

    #[error("invalid jwt token: {0}")]
    InvalidToken(String),

    #[error("job_workflow_ref is empty")]
    EmptyWorkflowRef,

    #[error("signing error: {0}")]
    Signing(String),

    #[error("transparency log upload error: {0}")]
    Upload(String),

    #[error("build subprocess failed: {0}")]
    Subprocess(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("initialization error: {0}")]
    InitializationError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// True for the configuration family of errors.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedVersion(_)
                | Error::InvalidEnvironmentVariable(_)
                | Error::InvalidDirectory(_)
        )
    }

    /// True for the identity family of errors.
    pub fn is_identity_error(&self) -> bool {
        matches!(
            self,
            Error::Identity(_) | Error::InvalidToken(_) | Error::EmptyWorkflowRef
        )
    }
}
