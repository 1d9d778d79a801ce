//! # in-toto Statements
//!
//! An in-toto statement names the artifacts it is about (`subject`) and
//! carries a typed `predicate`. Signed statements are wrapped in a Dead
//! Simple Signing Envelope (DSSE).
//!
//! Serialization is deterministic: struct fields are emitted in declaration
//! order and digest sets are ordered maps, so the same inputs always produce
//! the same bytes.
//!
//! ## Examples
//!
//! ```
//! use slsa_go_builder::in_toto::{Statement, make_minimal_subject};
//!
//! let subject = make_minimal_subject("app", "sha256", &"a".repeat(64));
//! let statement = Statement::new(vec![subject], "https://example.com/predicate", serde_json::json!({}));
//! let bytes = statement.to_bytes().unwrap();
//! assert!(bytes.starts_with(br#"{"_type":"https://in-toto.io/Statement/v0.1""#));
//! ```

use crate::error::Result;
use crate::signing::SigningIdentity;
use crate::signing::signable::Signable;

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod dsse;

use dsse::Envelope;

pub const DSSE_PAYLOAD_TYPE: &str = "application/vnd.in-toto+json";
pub const STATEMENT_TYPE_V01: &str = "https://in-toto.io/Statement/v0.1";

/// Algorithm name to hex digest.
pub type DigestSet = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    pub digest: DigestSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement<P> {
    #[serde(rename = "_type")]
    pub statement_type: String,
    #[serde(rename = "predicateType")]
    pub predicate_type: String,
    pub subject: Vec<Subject>,
    pub predicate: P,
}

impl<P: Serialize> Statement<P> {
    pub fn new(subject: Vec<Subject>, predicate_type: &str, predicate: P) -> Self {
        Self {
            statement_type: STATEMENT_TYPE_V01.to_string(),
            predicate_type: predicate_type.to_string(),
            subject,
            predicate,
        }
    }

    /// Canonical bytes of the statement: compact JSON.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Creates a subject with a single digest.
///
/// # Arguments
///
/// * `name` - The artifact name
/// * `alg` - The digest algorithm key, e.g. `sha256`
/// * `digest` - The hex-encoded digest
///
/// # Examples
///
/// ```
/// use slsa_go_builder::in_toto::make_minimal_subject;
///
/// let subject = make_minimal_subject("app", "sha256", "abc123");
/// assert_eq!(subject.digest["sha256"], "abc123");
/// ```
pub fn make_minimal_subject(name: &str, alg: &str, digest: &str) -> Subject {
    Subject {
        name: name.to_string(),
        digest: DigestSet::from([(alg.to_string(), digest.to_string())]),
    }
}

/// Signs already-serialized statement bytes into a DSSE envelope.
///
/// The bytes are signed as given, so the envelope payload is exactly what the
/// caller built.
///
/// # Errors
///
/// Returns a `Signing` error if the signing operation fails.
pub fn generate_signed_statement(statement: &[u8], identity: &SigningIdentity) -> Result<Envelope> {
    let mut envelope = Envelope::new(statement.to_vec(), DSSE_PAYLOAD_TYPE);
    envelope.sign(identity)?;

    debug!("signed {} byte statement", statement.len());
    Ok(envelope)
}
