//! Key material errors raised at startup.
//!
//! The bridge refuses to start when the holder key or the GitHub App key cannot be used.
//! Each variant records the environment variable it came from in its metadata; the key
//! itself never appears in the message or in the wrapped source.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Result type alias for key loading
pub type SecurityResult<T> = Result<T, Box<SecurityError>>;

const HOLDER_KEY_VARIABLE: &str = "X25519_PRIVATE_KEY";
const APP_KEY_VARIABLE: &str = "APP_PRIVATE_KEY";

/// Key material the bridge cannot start with
#[derive(ThisError, Debug)]
pub enum SecurityError {
	/// The holder key does not decode to a usable X25519 scalar
	#[error("Invalid holder key: {0}")]
	InvalidHolderKey(ErrorContext),

	/// The GitHub App key is not an RSA private key in PEM form
	#[error("Invalid app key: {0}")]
	InvalidAppKey(ErrorContext),

	/// Other errors that don't fit into the categories above
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

fn variable(name: &str) -> Option<HashMap<String, String>> {
	Some(HashMap::from([("variable".to_string(), name.to_string())]))
}

impl SecurityError {
	pub fn invalid_holder_key(
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
	) -> Self {
		Self::InvalidHolderKey(ErrorContext::new_with_log(
			"Holder key is unusable",
			source,
			variable(HOLDER_KEY_VARIABLE),
		))
	}

	pub fn invalid_app_key(
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
	) -> Self {
		Self::InvalidAppKey(ErrorContext::new_with_log(
			"GitHub App key is not a valid RSA private key",
			source,
			variable(APP_KEY_VARIABLE),
		))
	}

	/// Environment variable holding the rejected key, if known
	pub fn variable(&self) -> Option<&str> {
		match self {
			Self::InvalidHolderKey(ctx) | Self::InvalidAppKey(ctx) => ctx
				.metadata
				.as_ref()
				.and_then(|m| m.get("variable"))
				.map(String::as_str),
			Self::Other(_) => None,
		}
	}
}

impl TraceableError for SecurityError {
	fn trace_id(&self) -> String {
		match self {
			Self::InvalidHolderKey(ctx) => ctx.trace_id.clone(),
			Self::InvalidAppKey(ctx) => ctx.trace_id.clone(),
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}
