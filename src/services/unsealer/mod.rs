//! Credential unsealing.
//!
//! Opens owner-supplied sealed credentials with the bridge holder key and returns the
//! secret together with the scope claims it was sealed with. The claims are returned as
//! data only; checking them against a real repository is the dispatcher's job.

mod error;
mod holder_key;
mod payload;
mod sealed_box;

pub use error::UnsealError;
pub use holder_key::{parse_public_key, HolderKey, KEY_SIZE};
pub use payload::{format_credential_payload, parse_credential_payload};
pub use sealed_box::{seal, unseal};
