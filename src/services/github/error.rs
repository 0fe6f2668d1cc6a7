//! GitHub API error types.
//!
//! Status-derived variants let callers tell "this repository does not exist for you"
//! apart from transport trouble without looking at message text.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Represents errors that can occur while talking to the GitHub REST API
#[derive(ThisError, Debug)]
pub enum GitHubError {
	/// The resource does not exist (404)
	#[error("Not found: {0}")]
	NotFound(ErrorContext),

	/// The credential was rejected or lacks access (401, 403)
	#[error("Access denied: {0}")]
	AccessDenied(ErrorContext),

	/// The request could not be completed or returned an unexpected status
	#[error("Request error: {0}")]
	RequestError(ErrorContext),

	/// The response body could not be understood
	#[error("Response error: {0}")]
	ResponseError(ErrorContext),

	/// Request authentication could not be prepared (e.g. JWT minting)
	#[error("Authentication error: {0}")]
	AuthenticationError(ErrorContext),

	/// Other errors that don't fit into the categories above
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl GitHubError {
	// Not found
	pub fn not_found(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::NotFound(ErrorContext::new(msg, source, metadata))
	}

	// Access denied
	pub fn access_denied(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::AccessDenied(ErrorContext::new(msg, source, metadata))
	}

	// Request error
	pub fn request_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::RequestError(ErrorContext::new(msg, source, metadata))
	}

	// Response error
	pub fn response_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ResponseError(ErrorContext::new(msg, source, metadata))
	}

	// Authentication error
	pub fn authentication_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::AuthenticationError(ErrorContext::new(msg, source, metadata))
	}

	/// Whether the remote side said the resource is missing or off limits
	pub fn is_not_found_or_denied(&self) -> bool {
		matches!(self, Self::NotFound(_) | Self::AccessDenied(_))
	}
}

impl TraceableError for GitHubError {
	fn trace_id(&self) -> String {
		match self {
			Self::NotFound(ctx) => ctx.trace_id.clone(),
			Self::AccessDenied(ctx) => ctx.trace_id.clone(),
			Self::RequestError(ctx) => ctx.trace_id.clone(),
			Self::ResponseError(ctx) => ctx.trace_id.clone(),
			Self::AuthenticationError(ctx) => ctx.trace_id.clone(),
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}
