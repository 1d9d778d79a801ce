//! SHA-256 helpers.
//!
//! ```
//! use slsa_go_builder::hash::calculate_hash;
//!
//! let hash = calculate_hash(b"Hello, World!");
//! assert_eq!(hash.len(), 64);
//! ```

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of `data`.
pub fn calculate_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
