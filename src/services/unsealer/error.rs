//! Unsealing error types.
//!
//! Every variant is distinguishable by kind alone. None of them ever carries key
//! material, ciphertext or recovered plaintext, and [`UnsealError::AuthenticationFailed`]
//! deliberately says nothing about why the box could not be opened.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

const UNSEAL_STAGE: &str = "unseal";

/// Represents errors that can occur while opening a sealed credential
#[derive(ThisError, Debug)]
pub enum UnsealError {
	/// The holder key is not a usable X25519 scalar
	#[error("Invalid key: {0}")]
	InvalidKey(ErrorContext),

	/// There is nothing to open
	#[error("Empty ciphertext: {0}")]
	EmptyCiphertext(ErrorContext),

	/// The sealed box did not authenticate under the holder key
	#[error("Authentication failed: {0}")]
	AuthenticationFailed(ErrorContext),

	/// The box opened but its content is not `<secret>:<org id>[:<repo id>]`
	#[error("Invalid credential payload: {0}")]
	InvalidCredentialPayload(ErrorContext),

	/// Other errors that don't fit into the categories above
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

fn stage_metadata(metadata: Option<HashMap<String, String>>) -> HashMap<String, String> {
	let mut metadata = metadata.unwrap_or_default();
	metadata.insert("stage".to_string(), UNSEAL_STAGE.to_string());
	metadata
}

impl UnsealError {
	// Invalid key
	pub fn invalid_key(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::InvalidKey(ErrorContext::new(
			msg,
			source,
			Some(stage_metadata(metadata)),
		))
	}

	// Empty ciphertext
	pub fn empty_ciphertext() -> Self {
		Self::EmptyCiphertext(ErrorContext::new(
			"Sealed credential is empty",
			None,
			Some(stage_metadata(None)),
		))
	}

	// Authentication failure; intentionally detail-free
	pub fn authentication_failed() -> Self {
		Self::AuthenticationFailed(ErrorContext::new(
			"Sealed credential could not be opened",
			None,
			Some(stage_metadata(None)),
		))
	}

	// Invalid payload
	pub fn invalid_credential_payload(msg: impl Into<String>) -> Self {
		Self::InvalidCredentialPayload(ErrorContext::new(
			msg,
			None,
			Some(stage_metadata(None)),
		))
	}
}

impl TraceableError for UnsealError {
	fn trace_id(&self) -> String {
		match self {
			Self::InvalidKey(ctx) => ctx.trace_id.clone(),
			Self::EmptyCiphertext(ctx) => ctx.trace_id.clone(),
			Self::AuthenticationFailed(ctx) => ctx.trace_id.clone(),
			Self::InvalidCredentialPayload(ctx) => ctx.trace_id.clone(),
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}
