//! # Build Executor
//!
//! Turns the declared build step into the exact compiler invocation that runs
//! on the builder: `go` is replaced by the absolute compiler path, and bare
//! environment names are resolved against the values passed on the command
//! line and the real process environment.
//!
//! In dry-run mode nothing is executed; the resolved command and environment
//! are emitted as base64-encoded JSON lists so the provenance job can record
//! exactly what the build job is about to run.

use crate::config::{BuildConfig, is_valid_env_name, is_valid_env_value, validate_env_entry};
use crate::error::{Error, Result};
use crate::utils::encode_list;
use log::{debug, info};
use std::collections::BTreeMap;
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::Command;

/// The compiler this builder wraps.
pub const COMPILER_NAME: &str = "go";

/// Locate the compiler on `PATH`.
pub fn find_compiler() -> Result<PathBuf> {
    which::which(COMPILER_NAME).map_err(|e| {
        Error::InitializationError(format!("{COMPILER_NAME}: not found in PATH: {e}"))
    })
}

/// Values passed on the command line never reach a shell, so only control
/// characters are refused.
pub fn is_valid_arg_env_value(value: &str) -> bool {
    !value.chars().any(char::is_control)
}

/// A build step with every reference resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStep {
    pub command: Vec<String>,
    /// `NAME=VALUE` entries in declaration order.
    pub env: Vec<String>,
    pub dir: Option<PathBuf>,
}

impl ResolvedStep {
    fn env_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.env.iter().filter_map(|e| e.split_once('='))
    }
}

pub struct GoBuild {
    compiler: PathBuf,
    config: BuildConfig,
    arg_env: BTreeMap<String, String>,
}

impl GoBuild {
    pub fn new(compiler: PathBuf, config: BuildConfig) -> Self {
        Self {
            compiler,
            config,
            arg_env: BTreeMap::new(),
        }
    }

    /// Record environment values passed as a command-line argument.
    ///
    /// The encoding is a comma-separated list of `NAME:VALUE` pairs, e.g.
    /// `VERSION_LDFLAGS:-X main.version=1.0, GOOS:linux`. The name ends at the
    /// first `:`. An empty string carries no values.
    pub fn set_arg_env_variables(&mut self, envs: &str) -> Result<()> {
        if envs.trim().is_empty() {
            return Ok(());
        }

        for pair in envs.split(',') {
            let pair = pair.trim();
            let (name, value) = match pair.split_once(':') {
                Some((name, value)) => (name.trim(), value.trim()),
                None => return Err(Error::InvalidEnvironmentVariable(pair.to_string())),
            };

            if !is_valid_env_name(name) || !is_valid_arg_env_value(value) {
                return Err(Error::InvalidEnvironmentVariable(pair.to_string()));
            }

            debug!("arg env: {name}");
            self.arg_env.insert(name.to_string(), value.to_string());
        }

        Ok(())
    }

    /// Resolve the step against the argument values and the process environment.
    pub fn resolve(&self) -> Result<ResolvedStep> {
        self.resolve_with(|name| env::var(name).ok())
    }

    /// Resolve the step, looking bare names up with `lookup` when they were
    /// not passed as arguments.
    pub fn resolve_with<F>(&self, lookup: F) -> Result<ResolvedStep>
    where
        F: Fn(&str) -> Option<String>,
    {
        let step = self.config.single_step()?;

        let command = match step.command.split_first() {
            Some((program, args)) if program == COMPILER_NAME => {
                let mut command = vec![self.compiler.to_string_lossy().into_owned()];
                command.extend(args.iter().cloned());
                command
            }
            Some((program, _)) => {
                return Err(Error::Validation(format!(
                    "unsupported compiler '{program}', expected '{COMPILER_NAME}'"
                )));
            }
            None => return Err(Error::Validation("build step has an empty command".to_string())),
        };

        let mut resolved_env = Vec::with_capacity(step.env.len());
        for entry in &step.env {
            validate_env_entry(entry)?;

            let resolved = match entry.split_once('=') {
                Some(_) => entry.clone(),
                None => {
                    // Argument values were checked on the way in; process
                    // values must pass the stricter allow-list.
                    let value = match self.arg_env.get(entry) {
                        Some(value) => value.clone(),
                        None => lookup(entry)
                            .filter(|value| is_valid_env_value(value))
                            .ok_or_else(|| {
                                Error::InvalidEnvironmentVariable(format!(
                                    "{entry}: not set or contains disallowed characters"
                                ))
                            })?,
                    };
                    format!("{entry}={value}")
                }
            };
            resolved_env.push(resolved);
        }

        Ok(ResolvedStep {
            command,
            env: resolved_env,
            dir: step.dir.clone(),
        })
    }

    /// Resolve and, unless `dry` is set, run the compiler.
    ///
    /// Dry-run output lines go to stdout.
    pub fn run(&self, dry: bool) -> Result<ResolvedStep> {
        self.run_with_output(dry, &mut io::stdout().lock())
    }

    /// Like [`GoBuild::run`], writing the dry-run output lines to `out`.
    pub fn run_with_output<W: Write>(&self, dry: bool, out: &mut W) -> Result<ResolvedStep> {
        let resolved = self.resolve()?;

        if dry {
            info!("dry run: resolved command {:?}", resolved.command);
            write_dry_run_outputs(&resolved, out)?;
            return Ok(resolved);
        }

        info!("running {:?}", resolved.command);
        let mut command = Command::new(&self.compiler);
        command.args(&resolved.command[1..]).envs(resolved.env_pairs());
        if let Some(dir) = &resolved.dir {
            command.current_dir(dir);
        }

        let status = command.status().map_err(|e| {
            Error::Subprocess(format!("failed to start {}: {e}", self.compiler.display()))
        })?;

        if !status.success() {
            return Err(Error::Subprocess(format!(
                "{} exited with {status}",
                self.compiler.display()
            )));
        }

        Ok(resolved)
    }
}

/// `::set-output` lines carrying base64(JSON) of the resolved command and env.
fn write_dry_run_outputs<W: Write>(resolved: &ResolvedStep, out: &mut W) -> Result<()> {
    writeln!(
        out,
        "::set-output name=go-command::{}",
        encode_list(&resolved.command)?
    )?;
    writeln!(out, "::set-output name=go-env::{}", encode_list(&resolved.env)?)?;
    Ok(())
}
