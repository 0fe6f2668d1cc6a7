//! Trigger event model.
//!
//! A [`TriggerEvent`] is the immutable input of one bridge run: the raw comment text, who
//! posted it and where, plus the pass-through data forwarded verbatim to the remote job.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::normalize_string;

/// Repository identity as `owner/name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
	pub owner: String,
	pub name: String,
}

impl RepositoryRef {
	pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			owner: owner.into(),
			name: name.into(),
		}
	}
}

impl fmt::Display for RepositoryRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.owner, self.name)
	}
}

/// Account handle extracted from a mention.
///
/// Only letters, digits, `-` and `_` are accepted. Handles compare case-insensitively, so
/// the value is stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetIdentifier(String);

impl TargetIdentifier {
	/// Validates a handle; `None` if it is empty or has characters outside `[a-z0-9-_]`.
	pub fn parse(value: &str) -> Option<Self> {
		if value.is_empty()
			|| !value
				.chars()
				.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
		{
			return None;
		}
		Some(Self(normalize_string(value)))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl TryFrom<String> for TargetIdentifier {
	type Error = String;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::parse(&value).ok_or_else(|| format!("invalid target identifier '{}'", value))
	}
}

impl From<TargetIdentifier> for String {
	fn from(value: TargetIdentifier) -> Self {
		value.0
	}
}

impl fmt::Display for TargetIdentifier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// One triggering event, processed exactly once
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerEvent {
	/// Comment body as posted
	pub raw_text: String,
	/// Login of the comment author
	pub source_owner: String,
	/// Repository the comment was posted in
	pub source_repository: RepositoryRef,
	/// Event name, e.g. `issue_comment.created`
	pub event_name: String,
	/// Full webhook payload, forwarded to the remote job
	pub event_payload: serde_json::Value,
	/// Bridge settings, forwarded to the remote job
	pub settings: serde_json::Value,
}

#[derive(Deserialize)]
struct IssueCommentPayload {
	comment: CommentPayload,
	repository: RepositoryPayload,
}

#[derive(Deserialize)]
struct CommentPayload {
	body: Option<String>,
	user: AccountPayload,
}

#[derive(Deserialize)]
struct RepositoryPayload {
	name: String,
	owner: AccountPayload,
}

#[derive(Deserialize)]
struct AccountPayload {
	login: String,
}

impl TriggerEvent {
	/// Builds an event from an `issue_comment` webhook payload.
	///
	/// A missing (`null`) comment body is treated as empty text.
	pub fn from_issue_comment(
		event_name: impl Into<String>,
		payload: serde_json::Value,
		settings: serde_json::Value,
	) -> Result<Self, serde_json::Error> {
		let parsed: IssueCommentPayload = serde_json::from_value(payload.clone())?;

		Ok(Self {
			raw_text: parsed.comment.body.unwrap_or_default(),
			source_owner: parsed.comment.user.login,
			source_repository: RepositoryRef::new(
				parsed.repository.owner.login,
				parsed.repository.name,
			),
			event_name: event_name.into(),
			event_payload: payload,
			settings,
		})
	}
}
