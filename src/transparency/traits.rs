use crate::error::Result;
use crate::in_toto::dsse::Envelope;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to the log entry created for an envelope.
///
/// # Examples
///
/// ```
/// use slsa_go_builder::transparency::TransparencyRecord;
///
/// let record = TransparencyRecord {
///     uuid: "24296fb24b8ad77a".to_string(),
///     log_index: Some(42),
///     integrated_time: Some(1_650_000_000),
/// };
///
/// assert_eq!(record.to_string(), "24296fb24b8ad77a (index 42)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransparencyRecord {
    pub uuid: String,
    pub log_index: Option<u64>,
    pub integrated_time: Option<i64>,
}

impl fmt::Display for TransparencyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.log_index {
            Some(index) => write!(f, "{} (index {index})", self.uuid),
            None => write!(f, "{}", self.uuid),
        }
    }
}

pub trait TransparencyLog {
    fn get_base_uri(&self) -> String;

    /// Record a signed envelope together with the PEM certificate that
    /// verifies it.
    fn upload(&self, envelope: &Envelope, certificate_pem: &str) -> Result<TransparencyRecord>;
}
