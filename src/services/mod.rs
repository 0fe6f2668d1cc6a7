//! Core services implementing the bridge.
//!
//! - `resolver`: Mention parsing
//! - `unsealer`: Sealed credential opening
//! - `github`: GitHub REST access and request authentication
//! - `dispatcher`: Scope validation and the per-event state machine

pub mod dispatcher;
pub mod github;
pub mod resolver;
pub mod unsealer;
