use crate::Config;
use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::hash;
use crate::identity::fulcio::{CertificateIssuer, obtain_signing_identity};
use crate::identity::{IdTokenSource, reusable_workflow_id};
use crate::in_toto;
use crate::in_toto::dsse::Envelope;
use crate::slsa::generators::{generate_provenance_statement, verify_digest, verify_name};
use crate::transparency::{TransparencyLog, TransparencyRecord};
use crate::utils::{decode_list, safe_create_file};

use log::info;
use std::io::Write;
use std::path::{Path, PathBuf};

/// The external services the provenance pipeline talks to.
pub struct ProvenanceServices<'a> {
    pub token_source: &'a dyn IdTokenSource,
    pub issuer: &'a dyn CertificateIssuer,
    pub log: &'a dyn TransparencyLog,
}

/// A signed statement and the log entry anchoring it.
#[derive(Debug)]
pub struct SignedProvenance {
    pub envelope: Envelope,
    pub record: TransparencyRecord,
}

/// Untrusted inputs handed over by the build job.
#[derive(Debug, Clone)]
pub struct ProvenanceRequest {
    pub binary_name: String,
    pub digest: String,
    /// base64(JSON array) of the resolved command
    pub command: String,
    /// base64(JSON array) of the resolved environment
    pub env: String,
}

/// Check the untrusted request fields and decode the command and env lists.
///
/// # Errors
///
/// - [`Error::InvalidName`] / [`Error::InvalidDigest`] for a bad binary name or digest
/// - [`Error::Decode`] when either list is not base64 of a JSON string array
pub fn validate_request(request: &ProvenanceRequest) -> Result<(Vec<String>, Vec<String>)> {
    verify_name(&request.binary_name)?;
    verify_digest(&request.digest)?;
    let command = decode_list(&request.command)?;
    let env = decode_list(&request.env)?;
    Ok((command, env))
}

/// Build, sign and publish the provenance for one binary.
///
/// Stages run in order and the first failure aborts the run: input
/// validation, builder identity, statement construction, certificate
/// issuance, signing, transparency log upload. Nothing is retried.
///
/// # Arguments
///
/// * `config` - Token audiences (service endpoints are already baked into `services`)
/// * `services` - Token source, certificate authority and transparency log
/// * `ctx` - The scrubbed workflow run context
/// * `request` - The untrusted inputs from the build job
///
/// # Returns
///
/// The signed envelope and the transparency log record anchoring it. The
/// caller persists the envelope only after this returns `Ok`.
///
/// # Errors
///
/// - input errors from [`validate_request`], raised before any service is called
/// - [`Error::Identity`], [`Error::InvalidToken`] or [`Error::EmptyWorkflowRef`]
///   from the token exchange and certificate issuance
/// - [`Error::Signing`] if signing fails or the signature does not verify
///   with the issued certificate
/// - [`Error::Upload`] if the transparency log does not accept the entry
pub fn generate_signed_provenance(
    config: &Config,
    services: &ProvenanceServices<'_>,
    ctx: &RunContext,
    request: &ProvenanceRequest,
) -> Result<SignedProvenance> {
    // Reject bad inputs before any network call
    let (command, env) = validate_request(request)?;

    let workflow_ref = reusable_workflow_id(services.token_source, &config.builder_audience)?;

    let statement = generate_provenance_statement(
        &request.binary_name,
        &request.digest,
        ctx,
        &workflow_ref,
        command,
        env,
    )?;
    let statement_bytes = statement.to_bytes()?;
    info!(
        "built provenance statement for {} ({} bytes)",
        request.binary_name,
        statement_bytes.len()
    );

    let identity = obtain_signing_identity(
        services.token_source,
        services.issuer,
        &config.oidc_client_id,
    )?;

    let envelope = in_toto::generate_signed_statement(&statement_bytes, &identity)?;
    if !envelope.verify(&identity.public_key()?)? {
        return Err(Error::Signing(
            "signature does not verify with the issued certificate".to_string(),
        ));
    }

    let record = services
        .log
        .upload(&envelope, identity.leaf_certificate())?;

    Ok(SignedProvenance { envelope, record })
}

/// `<binary-name>.intoto.jsonl`
pub fn provenance_filename(binary_name: &str) -> Result<String> {
    verify_name(binary_name)?;
    Ok(format!("{binary_name}.intoto.jsonl"))
}

/// Write the envelope as one JSON line into `dir`, returning the file path.
pub fn write_signed_provenance(dir: &Path, binary_name: &str, envelope: &Envelope) -> Result<PathBuf> {
    let path = dir.join(provenance_filename(binary_name)?);

    let mut line = envelope.to_json()?;
    line.push('\n');

    let mut file = safe_create_file(&path, true)?;
    file.write_all(line.as_bytes())?;

    info!(
        "wrote {} (sha256 {})",
        path.display(),
        hash::calculate_hash(line.as_bytes())
    );
    Ok(path)
}
