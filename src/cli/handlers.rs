use crate::error::{Error, Result};

use super::commands::BuilderCommands;
use crate::Config;
use crate::build::{GoBuild, find_compiler};
use crate::config::BuildConfig;
use crate::context::RunContext;
use crate::identity::GitHubTokenSource;
use crate::identity::fulcio::FulcioClient;
use crate::slsa::cli::{
    ProvenanceRequest, ProvenanceServices, generate_signed_provenance, validate_request,
    write_signed_provenance,
};
use crate::transparency::TransparencyLog;
use crate::transparency::rekor::RekorLog;

use log::info;
use std::env;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

/// Environment variable holding the JSON `github` context.
pub const GITHUB_CONTEXT_ENV_KEY: &str = "GITHUB_CONTEXT";

pub fn handle_builder_command(cmd: BuilderCommands) -> Result<()> {
    match cmd {
        BuilderCommands::Build {
            config,
            env_args,
            dry,
        } => handle_build(&config, &env_args, dry),
        BuilderCommands::Provenance {
            binary_name,
            digest,
            command,
            env,
            fulcio_url,
            rekor_url,
            oidc_client_id,
            builder_audience,
        } => {
            let config = Config {
                fulcio_url,
                rekor_url,
                oidc_client_id,
                builder_audience,
            };
            let request = ProvenanceRequest {
                binary_name,
                digest,
                command,
                env,
            };
            handle_provenance(&config, &request).map(|path| {
                println!("::set-output name=signed-provenance-name::{}", path.display());
            })
        }
    }
}

fn handle_build(config_path: &Path, env_args: &str, dry: bool) -> Result<()> {
    let compiler = find_compiler()?;
    let config = BuildConfig::from_file(config_path)?;

    let mut build = GoBuild::new(compiler, config);
    build.set_arg_env_variables(env_args)?;
    build.run(dry)?;

    if !dry {
        info!("build finished");
    }
    Ok(())
}

fn handle_provenance(config: &Config, request: &ProvenanceRequest) -> Result<PathBuf> {
    // Untrusted inputs are checked before the environment is consulted
    validate_request(request)?;

    let github_context = Zeroizing::new(env::var(GITHUB_CONTEXT_ENV_KEY).map_err(|_| {
        Error::Validation(format!("{GITHUB_CONTEXT_ENV_KEY} is not set"))
    })?);
    let ctx = RunContext::parse(&github_context)?;
    drop(github_context);

    let token_source = GitHubTokenSource::from_env()?;
    let issuer = FulcioClient::new(&config.fulcio_url);
    let log = RekorLog::new_with_url(&config.rekor_url);
    info!(
        "certificate authority {}, transparency log {}",
        config.fulcio_url,
        log.get_base_uri()
    );

    let services = ProvenanceServices {
        token_source: &token_source,
        issuer: &issuer,
        log: &log,
    };
    let signed = generate_signed_provenance(config, &services, &ctx, request)?;
    info!("provenance anchored as {}", signed.record);

    write_signed_provenance(&env::current_dir()?, &request.binary_name, &signed.envelope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provenance_inputs_checked_before_environment() {
        // Holds whether or not the CI environment variables are present
        let request = ProvenanceRequest {
            binary_name: "../app".to_string(),
            digest: "a".repeat(64),
            command: String::new(),
            env: String::new(),
        };
        assert!(matches!(
            handle_provenance(&Config::default(), &request),
            Err(Error::InvalidName(_))
        ));

        let request = ProvenanceRequest {
            binary_name: "app".to_string(),
            digest: "not-a-digest".to_string(),
            ..request
        };
        assert!(matches!(
            handle_provenance(&Config::default(), &request),
            Err(Error::InvalidDigest(_))
        ));
    }
}
