//! Scope-bound dispatching.
//!
//! - `error`: run stages and fatal run errors
//! - `scope`: the scope check and the grant it produces
//! - `request`: dispatch requests, built only from a grant
//! - `signer`: optional HMAC signing of dispatch inputs
//! - `service`: the per-event state machine

mod error;
mod request;
mod scope;
mod service;
mod signer;

pub use error::{BridgeError, ScopeMismatch, Stage};
pub use request::DispatchRequest;
pub use scope::{is_within_scope, validate_scope, ScopeGrant};
pub use service::ScopeBoundDispatcher;
pub use signer::{InputSigner, SIGNATURE_INPUT};
