//! # Workflow Identity
//!
//! GitHub Actions lets a job request OIDC identity tokens from an ambient
//! endpoint (`ACTIONS_ID_TOKEN_REQUEST_URL`, authorized with
//! `ACTIONS_ID_TOKEN_REQUEST_TOKEN`). Two tokens are requested per run:
//!
//! 1. one scoped to the builder audience, whose `job_workflow_ref` claim names
//!    the reusable workflow that is running; this becomes the builder id;
//! 2. one scoped to the signing backend audience, exchanged for a short-lived
//!    certificate (see [`fulcio`]).
//!
//! Only the shape of the first token is checked locally. Its signature is not
//! verified here: the same issuer's tokens are verified by the certificate
//! authority during the exchange.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use log::{debug, info};
use reqwest::Url;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::env;
use std::fmt;
use zeroize::Zeroizing;

pub mod fulcio;

pub const REQUEST_TOKEN_ENV_KEY: &str = "ACTIONS_ID_TOKEN_REQUEST_TOKEN";
pub const REQUEST_URL_ENV_KEY: &str = "ACTIONS_ID_TOKEN_REQUEST_URL";

/// A raw OIDC identity token. Wiped on drop, never printed.
pub struct IdToken(Zeroizing<String>);

impl IdToken {
    pub fn new(token: String) -> Self {
        Self(Zeroizing::new(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the claims segment without verifying the signature.
    ///
    /// The token must have exactly three dot-separated segments.
    pub fn unverified_claims(&self) -> Result<TokenClaims> {
        let parts: Vec<&str> = self.0.split('.').collect();
        if parts.len() != 3 {
            return Err(Error::InvalidToken(format!("found {} parts", parts.len())));
        }

        let payload = URL_SAFE_NO_PAD
            .decode(parts[1].trim_end_matches('='))
            .map_err(|e| Error::InvalidToken(format!("claims are not base64url: {e}")))?;

        serde_json::from_slice(&payload)
            .map_err(|e| Error::InvalidToken(format!("claims are not JSON: {e}")))
    }
}

impl fmt::Debug for IdToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IdToken(<redacted>)")
    }
}

/// The subset of token claims this builder looks at.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub job_workflow_ref: Option<String>,
}

impl TokenClaims {
    /// The identity a certificate is issued to: `email` if present, else `sub`.
    pub fn subject(&self) -> Option<&str> {
        self.email
            .as_deref()
            .or(self.sub.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// The reusable workflow reference taken from an identity token, e.g.
/// `slsa-framework/slsa-github-generator-go/.github/workflows/builder.yml@refs/heads/main`.
///
/// Outside this crate it can only be obtained through [`reusable_workflow_id`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderWorkflowRef(String);

impl BuilderWorkflowRef {
    pub(crate) fn new(workflow_ref: &str) -> Self {
        Self(workflow_ref.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The SLSA builder id for this workflow.
    pub fn builder_id(&self) -> String {
        format!("https://github.com/{}", self.0)
    }
}

/// A source of audience-scoped OIDC identity tokens.
pub trait IdTokenSource {
    fn id_token(&self, audience: &str) -> Result<IdToken>;
}

/// Requests tokens from the GitHub Actions ambient token endpoint.
pub struct GitHubTokenSource {
    client: Client,
    request_url: String,
    request_token: Zeroizing<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    value: String,
}

impl GitHubTokenSource {
    pub fn new(request_url: String, request_token: String) -> Self {
        Self {
            client: Client::new(),
            request_url,
            request_token: Zeroizing::new(request_token),
        }
    }

    /// Build a source from the ambient `ACTIONS_ID_TOKEN_REQUEST_*` variables.
    pub fn from_env() -> Result<Self> {
        let request_url = env::var(REQUEST_URL_ENV_KEY)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                Error::Identity(format!(
                    "no auth provider available: {REQUEST_URL_ENV_KEY} is not set"
                ))
            })?;
        let request_token = env::var(REQUEST_TOKEN_ENV_KEY).unwrap_or_default();

        Ok(Self::new(request_url, request_token))
    }

    fn audience_url(&self, audience: &str) -> Result<Url> {
        let mut url = Url::parse(&self.request_url)
            .map_err(|e| Error::Identity(format!("invalid token request URL: {e}")))?;
        url.query_pairs_mut().append_pair("audience", audience);
        Ok(url)
    }
}

impl IdTokenSource for GitHubTokenSource {
    fn id_token(&self, audience: &str) -> Result<IdToken> {
        let url = self.audience_url(audience)?;
        debug!("requesting identity token for audience {audience}");

        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("bearer {}", self.request_token.as_str()),
            )
            .send()
            .map_err(|e| Error::Identity(format!("token endpoint unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Identity(format!(
                "token endpoint returned {status}"
            )));
        }

        let payload: TokenResponse = response
            .json()
            .map_err(|e| Error::Identity(format!("token endpoint returned invalid JSON: {e}")))?;

        Ok(IdToken::new(payload.value))
    }
}

/// Extract the `job_workflow_ref` claim from a token.
pub fn workflow_ref_from_token(token: &IdToken) -> Result<BuilderWorkflowRef> {
    let claims = token.unverified_claims()?;

    match claims.job_workflow_ref {
        Some(workflow_ref) if !workflow_ref.is_empty() => Ok(BuilderWorkflowRef(workflow_ref)),
        _ => Err(Error::EmptyWorkflowRef),
    }
}

/// Ask the token source for a builder-audience token and read the reusable
/// workflow reference from it.
pub fn reusable_workflow_id(
    source: &dyn IdTokenSource,
    audience: &str,
) -> Result<BuilderWorkflowRef> {
    let token = source.id_token(audience)?;
    let workflow_ref = workflow_ref_from_token(&token)?;

    info!("builder workflow: {}", workflow_ref.as_str());
    Ok(workflow_ref)
}
