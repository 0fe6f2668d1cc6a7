//! Bridge run error types.
//!
//! Each fatal terminal of a run is its own variant so callers branch on kind, never on
//! message text. Every error records the stage it happened in. Secrets, ciphertext and
//! keys never reach these errors; scope violations do carry the mismatched ids.

use crate::{
	services::unsealer::UnsealError,
	utils::logging::error::{ErrorContext, TraceableError},
};
use std::{collections::HashMap, fmt};
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Steps of a bridge run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
	ResolveTarget,
	FetchConfig,
	Unseal,
	Authenticate,
	ResolveRepository,
	ValidateScope,
	Dispatch,
}

impl Stage {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::ResolveTarget => "resolve_target",
			Self::FetchConfig => "fetch_config",
			Self::Unseal => "unseal",
			Self::Authenticate => "authenticate",
			Self::ResolveRepository => "resolve_repository",
			Self::ValidateScope => "validate_scope",
			Self::Dispatch => "dispatch",
		}
	}
}

impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Ids involved in a rejected scope check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeMismatch {
	pub allowed_organization_id: u64,
	pub allowed_repository_id: Option<u64>,
	pub actual_organization_id: u64,
	pub actual_repository_id: u64,
	pub repository_name: String,
}

/// Fatal outcomes of a bridge run
#[derive(ThisError, Debug)]
pub enum BridgeError {
	/// The text addresses an agent but no handle could be read
	#[error("Malformed trigger: {0}")]
	MalformedTrigger(ErrorContext),

	/// The holder key is unusable
	#[error("Invalid key: {0}")]
	InvalidKey(ErrorContext),

	/// The owner's sealed credential is empty
	#[error("Empty ciphertext: {0}")]
	EmptyCiphertext(ErrorContext),

	/// The sealed credential did not open under the holder key
	#[error("Authentication failed: {0}")]
	AuthenticationFailed(ErrorContext),

	/// The credential opened but is not well formed
	#[error("Invalid credential payload: {0}")]
	InvalidCredentialPayload(ErrorContext),

	/// The agent repository does not exist or is not visible with the credential
	#[error("Target repository not found: {0}")]
	TargetRepositoryNotFound(ErrorContext),

	/// The credential's scope does not cover the agent repository
	#[error("Scope violation: {context}")]
	ScopeViolation {
		mismatch: ScopeMismatch,
		context: ErrorContext,
	},

	/// A network stage failed or timed out
	#[error("Dispatch transport error: {context}")]
	DispatchTransportError { stage: Stage, context: ErrorContext },

	/// The run was abandoned on shutdown before dispatching
	#[error("Cancelled: {context}")]
	Cancelled { stage: Stage, context: ErrorContext },

	/// Other errors that don't fit into the categories above
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

fn with_stage(stage: Stage, metadata: Option<HashMap<String, String>>) -> Option<HashMap<String, String>> {
	let mut metadata = metadata.unwrap_or_default();
	metadata.insert("stage".to_string(), stage.as_str().to_string());
	Some(metadata)
}

impl BridgeError {
	// Malformed trigger
	pub fn malformed_trigger(
		msg: impl Into<String>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::MalformedTrigger(ErrorContext::new_with_log(
			msg,
			None,
			with_stage(Stage::ResolveTarget, metadata),
		))
	}

	// Target repository not found
	pub fn target_repository_not_found(
		stage: Stage,
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::TargetRepositoryNotFound(ErrorContext::new_with_log(
			msg,
			source,
			with_stage(stage, metadata),
		))
	}

	// Scope violation
	pub fn scope_violation(mismatch: ScopeMismatch) -> Self {
		let metadata = HashMap::from([
			(
				"allowed_organization_id".to_string(),
				mismatch.allowed_organization_id.to_string(),
			),
			(
				"allowed_repository_id".to_string(),
				mismatch
					.allowed_repository_id
					.map_or_else(|| "any".to_string(), |id| id.to_string()),
			),
			(
				"actual_organization_id".to_string(),
				mismatch.actual_organization_id.to_string(),
			),
			(
				"actual_repository_id".to_string(),
				mismatch.actual_repository_id.to_string(),
			),
			("repository".to_string(), mismatch.repository_name.clone()),
		]);
		let context = ErrorContext::new_with_log(
			format!(
				"Credential does not allow running on {}",
				mismatch.repository_name
			),
			None,
			with_stage(Stage::ValidateScope, Some(metadata)),
		);
		Self::ScopeViolation { mismatch, context }
	}

	// Transport error
	pub fn dispatch_transport_error(
		stage: Stage,
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::DispatchTransportError {
			stage,
			context: ErrorContext::new_with_log(msg, source, with_stage(stage, metadata)),
		}
	}

	// Cancellation; reported by the caller
	pub fn cancelled(stage: Stage) -> Self {
		Self::Cancelled {
			stage,
			context: ErrorContext::new(
				"Run cancelled before dispatch",
				None,
				with_stage(stage, None),
			),
		}
	}

	fn context(&self) -> Option<&ErrorContext> {
		match self {
			Self::MalformedTrigger(ctx)
			| Self::InvalidKey(ctx)
			| Self::EmptyCiphertext(ctx)
			| Self::AuthenticationFailed(ctx)
			| Self::InvalidCredentialPayload(ctx)
			| Self::TargetRepositoryNotFound(ctx) => Some(ctx),
			Self::ScopeViolation { context, .. }
			| Self::DispatchTransportError { context, .. }
			| Self::Cancelled { context, .. } => Some(context),
			Self::Other(_) => None,
		}
	}

	/// Stage the run failed in, as recorded in the error metadata
	pub fn stage(&self) -> Option<&str> {
		self.context().and_then(ErrorContext::stage)
	}
}

impl From<UnsealError> for BridgeError {
	fn from(err: UnsealError) -> Self {
		let metadata = with_stage(Stage::Unseal, None);
		match err {
			UnsealError::InvalidKey(_) => Self::InvalidKey(ErrorContext::new_with_log(
				"Holder key is invalid",
				Some(Box::new(err)),
				metadata,
			)),
			UnsealError::EmptyCiphertext(_) => Self::EmptyCiphertext(ErrorContext::new_with_log(
				"Sealed credential is empty",
				Some(Box::new(err)),
				metadata,
			)),
			UnsealError::AuthenticationFailed(_) => {
				Self::AuthenticationFailed(ErrorContext::new_with_log(
					"Sealed credential could not be opened",
					Some(Box::new(err)),
					metadata,
				))
			}
			UnsealError::InvalidCredentialPayload(_) => {
				Self::InvalidCredentialPayload(ErrorContext::new_with_log(
					"Sealed credential has an invalid payload",
					Some(Box::new(err)),
					metadata,
				))
			}
			UnsealError::Other(e) => Self::Other(e),
		}
	}
}

impl TraceableError for BridgeError {
	fn trace_id(&self) -> String {
		match self.context() {
			Some(ctx) => ctx.trace_id.clone(),
			None => Uuid::new_v4().to_string(),
		}
	}
}
