//! # Signable Trait
//!
//! Common interface for data structures that carry their own signatures. The
//! signer supplies a [`SigningIdentity`]: an ephemeral key plus the
//! certificate chain that binds it to the workflow that ran.
//!
//! ## Examples
//!
//! ```no_run
//! use slsa_go_builder::in_toto::dsse::Envelope;
//! use slsa_go_builder::signing::SigningIdentity;
//! use slsa_go_builder::signing::signable::Signable;
//!
//! # fn identity() -> SigningIdentity { unimplemented!() }
//! let mut envelope = Envelope::new(b"payload".to_vec(), "application/vnd.in-toto+json");
//! envelope.sign(&identity()).unwrap();
//! assert!(envelope.validate());
//! ```

use crate::error::Result;
use crate::signing::SigningIdentity;

/// A trait for types that can be cryptographically signed.
///
/// Implementations decide what bytes are covered by the signature and where
/// the signature and certificate are attached. They should fail rather than
/// leave the value partially signed.
pub trait Signable {
    /// Sign `self` with the given identity.
    ///
    /// ## Errors
    ///
    /// - the value cannot be serialized into the bytes to sign
    /// - the signing operation itself fails
    fn sign(&mut self, identity: &SigningIdentity) -> Result<()>;
}
