//! Domain models and data structures for the bridge.
//!
//! - `config`: Bridge and owner configuration
//! - `core`: Events, credentials, repositories and dispatch outcomes
//! - `security`: Secrets and security errors

mod config;
mod core;
mod security;

pub use config::{parse_config, AuthMode, BridgeConfig, ConfigError, SEALED_CREDENTIAL_FIELD};

pub use core::{
	ActualRepository, DispatchOutcome, RepositoryRef, SealedCredentialRecord, SourceFormat,
	TargetIdentifier, TriggerEvent, UnsealedCredential, WorkflowDispatch, AUTH_TOKEN_INPUT,
};

pub use security::{SecretString, SecurityError, SecurityResult};
