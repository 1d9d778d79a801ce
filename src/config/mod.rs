//! # Build Configuration
//!
//! The build configuration is a small YAML document checked into the
//! repository being built. It declares the schema version and a single
//! build step:
//!
//! ```yaml
//! version: 1
//! steps:
//!   - command: ["go", "build", "-mod=vendor", "-trimpath"]
//!     env: ["CGO_ENABLED=0", "GOOS"]
//!     dir: ./cmd/app
//! ```
//!
//! Each `env` entry is either a literal `NAME=VALUE` or a bare `NAME` that is
//! resolved later by the build executor. Every entry is checked against an
//! allow-list before anything else looks at it.

use crate::error::{Error, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Component, Path, PathBuf};

/// The only build configuration schema version understood by this builder.
pub const BUILD_CONFIG_VERSION: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub command: Vec<String>,
    #[serde(default)]
    pub env: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildConfig {
    pub version: i64,
    pub steps: Vec<Step>,
}

// Steps stay untyped until the version has been accepted, so a config with
// an unknown version is reported as such whatever its steps look like.
#[derive(Deserialize)]
struct RawBuildConfig {
    version: Option<serde_yaml::Value>,
    #[serde(default)]
    steps: Option<serde_yaml::Value>,
}

impl BuildConfig {
    /// Load and validate a build configuration from a YAML file.
    ///
    /// The file itself must live under the current working directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        is_under_wd(path)?;

        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a build configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let raw: RawBuildConfig = serde_yaml::from_str(content)?;

        match raw.version.as_ref().and_then(serde_yaml::Value::as_i64) {
            Some(BUILD_CONFIG_VERSION) => {}
            other => return Err(Error::UnsupportedVersion(other)),
        }

        let steps = match raw.steps {
            Some(steps) => serde_yaml::from_value::<Vec<Step>>(steps)?,
            None => Vec::new(),
        };

        let config = BuildConfig {
            version: BUILD_CONFIG_VERSION,
            steps,
        };
        config.validate()?;

        debug!("loaded build config with {} step(s)", config.steps.len());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for step in &self.steps {
            for entry in &step.env {
                validate_env_entry(entry)?;
            }

            if let Some(dir) = &step.dir {
                is_under_wd(dir)?;
            }
        }

        Ok(())
    }

    /// The single step this builder knows how to attest.
    pub fn single_step(&self) -> Result<&Step> {
        match self.steps.as_slice() {
            [step] => Ok(step),
            steps => Err(Error::Validation(format!(
                "build config must declare exactly one step, found {}",
                steps.len()
            ))),
        }
    }
}

/// Environment variable names: ASCII alphanumerics and underscore.
pub fn is_valid_env_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Environment variable values: no whitespace, quotes or shell metacharacters.
pub fn is_valid_env_value(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "_-./:,=+@".contains(c))
}

/// Check a single `Step.env` entry, either `NAME=VALUE` or a bare `NAME`.
pub fn validate_env_entry(entry: &str) -> Result<()> {
    let valid = match entry.split_once('=') {
        Some((name, value)) => is_valid_env_name(name) && is_valid_env_value(value),
        None => is_valid_env_name(entry),
    };

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidEnvironmentVariable(entry.to_string()))
    }
}

/// Verify that `path` resolves to a descendant of the current working directory.
///
/// Resolution is lexical: `.` and `..` segments are folded against the working
/// directory without touching the filesystem, so paths that do not exist yet
/// can be checked too.
pub fn is_under_wd<P: AsRef<Path>>(path: P) -> Result<()> {
    let wd = env::current_dir()?;
    is_under_dir(&wd, path.as_ref())
}

pub(crate) fn is_under_dir(root: &Path, path: &Path) -> Result<()> {
    let resolved = normalize(&root.join(path));
    let root = normalize(root);

    if resolved != root && resolved.starts_with(&root) {
        Ok(())
    } else {
        Err(Error::InvalidDirectory(path.to_path_buf()))
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
