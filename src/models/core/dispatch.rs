//! Dispatch outcome and wire models.

use serde::Serialize;
use std::{collections::BTreeMap, fmt};

use crate::models::TargetIdentifier;

/// Successful terminal states of a bridge run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
	/// The event did not address any agent
	Ignored,
	/// The mentioned owner has not opted in, or their configuration is unusable
	NotBridgeable {
		target: TargetIdentifier,
		reason: String,
	},
	/// The remote workflow was triggered
	Dispatched {
		target: TargetIdentifier,
		state_id: uuid::Uuid,
	},
}

/// Request body of `POST /repos/{owner}/{repo}/actions/workflows/{id}/dispatches`.
///
/// All inputs are flat strings. `authToken` carries a credential, so `Debug` redacts it.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowDispatch {
	#[serde(rename = "ref")]
	pub git_ref: String,
	pub inputs: BTreeMap<String, String>,
}

/// Input key carrying the credential forwarded to the remote job
pub const AUTH_TOKEN_INPUT: &str = "authToken";

impl fmt::Debug for WorkflowDispatch {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let inputs: BTreeMap<&str, &str> = self
			.inputs
			.iter()
			.map(|(key, value)| {
				if key == AUTH_TOKEN_INPUT {
					(key.as_str(), "<redacted>")
				} else {
					(key.as_str(), value.as_str())
				}
			})
			.collect();

		f.debug_struct("WorkflowDispatch")
			.field("ref", &self.git_ref)
			.field("inputs", &inputs)
			.finish()
	}
}
