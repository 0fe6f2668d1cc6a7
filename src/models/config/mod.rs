//! Configuration loading and validation.
//!
//! - `bridge_config`: process configuration read from the environment
//! - `agent_config`: per-owner configuration file carrying the sealed credential

#![allow(clippy::result_large_err)]

mod agent_config;
mod bridge_config;
mod error;

pub use agent_config::{parse_config, SEALED_CREDENTIAL_FIELD};
pub use bridge_config::{AuthMode, BridgeConfig};
pub use error::ConfigError;
