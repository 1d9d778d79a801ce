//! # Signing Keys and Identities
//!
//! Provenance is signed with an ephemeral ECDSA P-256 key that lives only for
//! the duration of the process. The key is bound to the workflow identity by a
//! short-lived certificate (see [`crate::identity::fulcio`]); the pair is a
//! [`SigningIdentity`].

use crate::error::{Error, Result};
use log::debug;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private, Public};
use openssl::sign::{Signer, Verifier};
use openssl::x509::X509;
use zeroize::{ZeroizeOnDrop, Zeroizing};

pub mod signable;

/// Secure wrapper for private key data that zeroizes on drop
#[derive(ZeroizeOnDrop)]
pub struct SecurePrivateKey {
    #[zeroize(skip)]
    pkey: PKey<Private>,
    // Keep the PEM bytes so they are wiped with the key
    _key_data: Zeroizing<Vec<u8>>,
}

impl SecurePrivateKey {
    /// Create a new SecurePrivateKey from raw PEM data
    pub fn from_pem(pem_data: Vec<u8>) -> Result<Self> {
        let zeroizing_pem = Zeroizing::new(pem_data);

        let pkey = PKey::private_key_from_pem(&zeroizing_pem)
            .map_err(|e| Error::Signing(format!("Failed to load private key: {e}")))?;

        Ok(Self {
            pkey,
            _key_data: zeroizing_pem,
        })
    }

    /// Get a reference to the inner PKey
    pub fn as_pkey(&self) -> &PKey<Private> {
        &self.pkey
    }

    /// PEM-encoded SubjectPublicKeyInfo of this key.
    pub fn public_key_pem(&self) -> Result<String> {
        let pem = self
            .pkey
            .public_key_to_pem()
            .map_err(|e| Error::Signing(format!("Failed to export public key: {e}")))?;
        String::from_utf8(pem).map_err(|e| Error::Signing(e.to_string()))
    }
}

pub fn pkey_to_secure(pkey: PKey<Private>) -> Result<SecurePrivateKey> {
    // Round-trip through PEM so the key bytes end up in zeroizing storage
    let pem_data = pkey
        .private_key_to_pem_pkcs8()
        .map_err(|e| Error::Signing(format!("Failed to export key to PEM: {e}")))?;

    SecurePrivateKey::from_pem(pem_data)
}

/// Generate a fresh ECDSA P-256 key pair. Never written to disk.
pub fn generate_ephemeral_key() -> Result<SecurePrivateKey> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1)
        .map_err(|e| Error::Signing(format!("Failed to load P-256 group: {e}")))?;
    let ec_key =
        EcKey::generate(&group).map_err(|e| Error::Signing(format!("Key generation failed: {e}")))?;
    let pkey = PKey::from_ec_key(ec_key).map_err(|e| Error::Signing(e.to_string()))?;

    debug!("generated ephemeral P-256 signing key");
    pkey_to_secure(pkey)
}

/// Sign data with SHA-256
///
/// # Arguments
///
/// * `data` - The bytes to sign
/// * `private_key` - The signing key
///
/// # Returns
///
/// A DER-encoded ECDSA signature.
pub fn sign_data(data: &[u8], private_key: &SecurePrivateKey) -> Result<Vec<u8>> {
    let mut signer = Signer::new(MessageDigest::sha256(), private_key.as_pkey())
        .map_err(|e| Error::Signing(format!("Failed to create signer: {e}")))?;

    signer
        .update(data)
        .map_err(|e| Error::Signing(format!("Failed to update signer: {e}")))?;

    let sig_len = signer
        .len()
        .map_err(|e| Error::Signing(format!("Failed to get signature length: {e}")))?;
    let mut signature = Zeroizing::new(vec![0u8; sig_len]);
    let len = signer
        .sign(&mut signature)
        .map_err(|e| Error::Signing(format!("Failed to sign data: {e}")))?;

    // ECDSA signatures are variable length; return only the used portion
    Ok(signature[..len].to_vec())
}

/// Verify a SHA-256 signature with a public key
pub fn verify_signature(data: &[u8], signature: &[u8], public_key: &PKey<Public>) -> Result<bool> {
    let mut verifier = Verifier::new(MessageDigest::sha256(), public_key)
        .map_err(|e| Error::Signing(e.to_string()))?;

    verifier
        .update(data)
        .map_err(|e| Error::Signing(e.to_string()))?;

    verifier
        .verify(signature)
        .map_err(|e| Error::Signing(e.to_string()))
}

/// An ephemeral key together with the certificate chain that binds it to a
/// verified workflow identity. Used for exactly one signing operation.
pub struct SigningIdentity {
    key: SecurePrivateKey,
    certificate_chain: Vec<String>,
}

impl SigningIdentity {
    /// Pair a key with its certificate chain, leaf first.
    ///
    /// Fails if the chain is empty or the leaf certificate does not certify
    /// this key.
    pub fn new(key: SecurePrivateKey, certificate_chain: Vec<String>) -> Result<Self> {
        let leaf = certificate_chain
            .first()
            .ok_or_else(|| Error::Signing("certificate chain is empty".to_string()))?;

        let cert = X509::from_pem(leaf.as_bytes())
            .map_err(|e| Error::Signing(format!("invalid leaf certificate: {e}")))?;
        let cert_key = cert
            .public_key()
            .map_err(|e| Error::Signing(format!("invalid leaf certificate key: {e}")))?;

        if !cert_key.public_eq(key.as_pkey()) {
            return Err(Error::Signing(
                "leaf certificate does not match the signing key".to_string(),
            ));
        }

        Ok(Self {
            key,
            certificate_chain,
        })
    }

    pub fn key(&self) -> &SecurePrivateKey {
        &self.key
    }

    /// The leaf certificate in PEM form.
    pub fn leaf_certificate(&self) -> &str {
        // Non-empty by construction
        &self.certificate_chain[0]
    }

    pub fn certificate_chain(&self) -> &[String] {
        &self.certificate_chain
    }

    /// Public key of the leaf certificate.
    pub fn public_key(&self) -> Result<PKey<Public>> {
        X509::from_pem(self.leaf_certificate().as_bytes())
            .and_then(|cert| cert.public_key())
            .map_err(|e| Error::Signing(e.to_string()))
    }
}


#[cfg(test)]
pub(crate) mod test_utils {
    use crate::error::{Error, Result};
    use crate::signing::{SecurePrivateKey, SigningIdentity, generate_ephemeral_key};
    use openssl::asn1::Asn1Time;
    use openssl::bn::BigNum;
    use openssl::hash::MessageDigest;
    use openssl::x509::{X509, X509NameBuilder};

    fn to_err(e: openssl::error::ErrorStack) -> Error {
        Error::Signing(e.to_string())
    }

    /// A self-signed certificate over `key`, in PEM form.
    pub fn self_signed_certificate(key: &SecurePrivateKey) -> Result<String> {
        let mut name = X509NameBuilder::new().map_err(to_err)?;
        name.append_entry_by_text("CN", "sigstore-test")
            .map_err(to_err)?;
        let name = name.build();

        let mut builder = X509::builder().map_err(to_err)?;
        builder.set_version(2).map_err(to_err)?;
        let serial = BigNum::from_u32(1)
            .and_then(|bn| bn.to_asn1_integer())
            .map_err(to_err)?;
        builder.set_serial_number(&serial).map_err(to_err)?;
        builder.set_subject_name(&name).map_err(to_err)?;
        builder.set_issuer_name(&name).map_err(to_err)?;
        builder.set_pubkey(key.as_pkey()).map_err(to_err)?;
        let not_before = Asn1Time::days_from_now(0).map_err(to_err)?;
        let not_after = Asn1Time::days_from_now(1).map_err(to_err)?;
        builder.set_not_before(&not_before).map_err(to_err)?;
        builder.set_not_after(&not_after).map_err(to_err)?;
        builder
            .sign(key.as_pkey(), MessageDigest::sha256())
            .map_err(to_err)?;

        let pem = builder.build().to_pem().map_err(to_err)?;
        String::from_utf8(pem).map_err(|e| Error::Signing(e.to_string()))
    }

    pub fn self_signed_identity() -> Result<SigningIdentity> {
        let key = generate_ephemeral_key()?;
        let cert = self_signed_certificate(&key)?;
        SigningIdentity::new(key, vec![cert])
    }
}
