//! Short-lived signing certificates from a Fulcio certificate authority.
//!
//! The CA verifies the presented OIDC token, checks proof that the caller
//! holds the private key (a signature over the token subject), and returns a
//! certificate chain binding the public key to the token identity.

use crate::error::{Error, Result};
use crate::identity::{IdToken, IdTokenSource};
use crate::signing::{self, SecurePrivateKey, SigningIdentity};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::{debug, info};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

/// Issues a certificate chain (PEM, leaf first) for a key and identity token.
pub trait CertificateIssuer {
    fn issue_certificate(&self, token: &IdToken, key: &SecurePrivateKey) -> Result<Vec<String>>;
}

pub struct FulcioClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SigningCertRequest<'a> {
    credentials: Credentials<'a>,
    public_key_request: PublicKeyRequest,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Credentials<'a> {
    oidc_identity_token: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PublicKeyRequest {
    public_key: PublicKey,
    proof_of_possession: String,
}

#[derive(Serialize)]
struct PublicKey {
    algorithm: &'static str,
    content: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SigningCertResponse {
    signed_certificate_embedded_sct: Option<SignedCertificate>,
    signed_certificate_detached_sct: Option<SignedCertificate>,
}

#[derive(Deserialize)]
struct SignedCertificate {
    chain: CertificateChain,
}

#[derive(Deserialize)]
struct CertificateChain {
    certificates: Vec<String>,
}

impl SigningCertResponse {
    fn into_chain(self) -> Result<Vec<String>> {
        let signed = self
            .signed_certificate_embedded_sct
            .or(self.signed_certificate_detached_sct)
            .ok_or_else(|| Error::Identity("certificate response has no chain".to_string()))?;

        if signed.chain.certificates.is_empty() {
            return Err(Error::Identity("certificate chain is empty".to_string()));
        }
        Ok(signed.chain.certificates)
    }
}

impl FulcioClient {
    pub fn new(url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: url.trim_end_matches('/').to_string(),
        }
    }

    fn signing_cert_url(&self) -> String {
        format!("{}/api/v2/signingCert", self.base_url)
    }
}

/// Signature over the token subject, proving possession of the private key.
pub fn proof_of_possession(token: &IdToken, key: &SecurePrivateKey) -> Result<String> {
    let claims = token.unverified_claims()?;
    let subject = claims
        .subject()
        .ok_or_else(|| Error::Identity("identity token has no subject".to_string()))?;

    let signature = signing::sign_data(subject.as_bytes(), key)?;
    Ok(STANDARD.encode(signature))
}

impl CertificateIssuer for FulcioClient {
    fn issue_certificate(&self, token: &IdToken, key: &SecurePrivateKey) -> Result<Vec<String>> {
        let request = SigningCertRequest {
            credentials: Credentials {
                oidc_identity_token: token.as_str(),
            },
            public_key_request: PublicKeyRequest {
                public_key: PublicKey {
                    algorithm: "ECDSA",
                    content: key.public_key_pem()?,
                },
                proof_of_possession: proof_of_possession(token, key)?,
            },
        };

        debug!("requesting signing certificate from {}", self.base_url);
        let response = self
            .client
            .post(self.signing_cert_url())
            .json(&request)
            .send()
            .map_err(|e| Error::Identity(format!("certificate authority unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Identity(format!(
                "certificate authority rejected the token ({status}): {body}"
            )));
        }

        let parsed: SigningCertResponse = response
            .json()
            .map_err(|e| Error::Identity(format!("invalid certificate response: {e}")))?;
        parsed.into_chain()
    }
}

/// Generate an ephemeral key and bind it to the workflow identity.
///
/// # Arguments
///
/// * `source` - Where the OIDC identity token comes from
/// * `issuer` - The certificate authority
/// * `audience` - Scopes the token to the certificate authority
///
/// # Returns
///
/// A [`SigningIdentity`] whose leaf certificate certifies the fresh key.
/// The private key never leaves memory and is wiped when the identity is
/// dropped.
///
/// # Errors
///
/// - [`Error::Identity`] if the token cannot be fetched, has no subject, or
///   the certificate authority rejects it
/// - [`Error::Signing`] if key generation fails or the returned leaf
///   certificate is not for the generated key
///
/// # Examples
///
/// ```no_run
/// use slsa_go_builder::identity::GitHubTokenSource;
/// use slsa_go_builder::identity::fulcio::{FulcioClient, obtain_signing_identity};
///
/// let source = GitHubTokenSource::from_env()?;
/// let issuer = FulcioClient::new("https://v1.fulcio.sigstore.dev");
/// let identity = obtain_signing_identity(&source, &issuer, "sigstore")?;
/// println!("{}", identity.leaf_certificate());
/// # Ok::<(), slsa_go_builder::Error>(())
/// ```
pub fn obtain_signing_identity(
    source: &dyn IdTokenSource,
    issuer: &dyn CertificateIssuer,
    audience: &str,
) -> Result<SigningIdentity> {
    let token = source.id_token(audience)?;
    let key = signing::generate_ephemeral_key()?;

    let chain = issuer.issue_certificate(&token, &key)?;
    let identity = SigningIdentity::new(key, chain)?;

    info!(
        "obtained signing certificate chain of {} certificate(s)",
        identity.certificate_chain().len()
    );
    Ok(identity)
}
