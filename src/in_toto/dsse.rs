use crate::error::{Error, Result};
use crate::signing;
use crate::signing::SigningIdentity;
use crate::signing::signable::Signable;

use openssl::pkey::{PKey, Public};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub keyid: String,
    #[serde_as(as = "serde_with::base64::Base64")]
    pub sig: Vec<u8>,
    /// PEM certificate chain, leaf first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert: Option<String>,
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "payloadType")]
    payload_type: String,
    #[serde_as(as = "serde_with::base64::Base64")]
    payload: Vec<u8>,
    signatures: Vec<Signature>,
}

/// DSSE pre-authentication encoding of a payload.
///
/// `DSSEv1 <len(type)> <type> <len(payload)> <payload>`
pub fn pae(payload_type: &str, payload: &[u8]) -> Vec<u8> {
    let mut out = format!(
        "DSSEv1 {} {} {} ",
        payload_type.len(),
        payload_type,
        payload.len()
    )
    .into_bytes();
    out.extend_from_slice(payload);
    out
}

impl Envelope {
    pub fn new(payload: Vec<u8>, payload_type: &str) -> Self {
        Self {
            payload,
            payload_type: payload_type.to_string(),
            signatures: vec![],
        }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn payload_type(&self) -> &str {
        &self.payload_type
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    pub fn add_signature(&mut self, sig: Vec<u8>, keyid: String, cert: Option<String>) -> Result<()> {
        if sig.is_empty() {
            return Err(Error::Signing("DSSE signature cannot be empty".to_string()));
        }

        self.signatures.push(Signature { keyid, sig, cert });
        Ok(())
    }

    pub fn validate(&self) -> bool {
        if self.payload.is_empty() || self.payload_type.is_empty() || self.signatures.is_empty() {
            return false;
        }

        self.signatures.iter().all(|s| !s.sig.is_empty())
    }

    /// Check that at least one signature verifies under `public_key`.
    pub fn verify(&self, public_key: &PKey<Public>) -> Result<bool> {
        let message = pae(&self.payload_type, &self.payload);
        for signature in &self.signatures {
            if signing::verify_signature(&message, &signature.sig, public_key)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Error::Json)
    }
}

impl Signable for Envelope {
    fn sign(&mut self, identity: &SigningIdentity) -> Result<()> {
        let message = pae(&self.payload_type, &self.payload);
        let signature = signing::sign_data(&message, identity.key())?;

        let chain = identity.certificate_chain().concat();
        // keyid is optional; the certificate identifies the signer
        self.add_signature(signature, String::new(), Some(chain))
    }
}
