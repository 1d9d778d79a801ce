//! # Transparency Log
//!
//! A signed provenance statement is only published once it is recorded in an
//! append-only public log. Uploads are not retried: a failed upload fails the
//! run, and nothing is written locally.

pub mod rekor;
pub mod traits;

pub use traits::{TransparencyLog, TransparencyRecord};
