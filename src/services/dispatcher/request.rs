//! Dispatch request construction.

use std::{collections::BTreeMap, fmt};
use uuid::Uuid;

use crate::{
	models::{SecretString, TriggerEvent, WorkflowDispatch, AUTH_TOKEN_INPUT},
	services::dispatcher::{
		scope::ScopeGrant,
		signer::{InputSigner, SIGNATURE_INPUT},
	},
};

/// Value of the `command` input; the remote job parses the comment itself
const NULL_COMMAND: &str = "null";

/// A fully authorized dispatch.
///
/// Only constructible from a [`ScopeGrant`]. Each request gets a fresh `state_id` so the
/// remote job instance can be told apart.
#[derive(Clone)]
pub struct DispatchRequest {
	target_organization_id: u64,
	target_repository_id: u64,
	target_repository_name: String,
	default_ref: String,
	state_id: Uuid,
	event_name: String,
	event_payload_json: String,
	settings_json: String,
	auth_token: SecretString,
}

impl DispatchRequest {
	pub fn new(grant: ScopeGrant, event: &TriggerEvent) -> Self {
		let (credential, repository) = grant.into_parts();

		Self {
			target_organization_id: repository.organization_id,
			target_repository_id: repository.repository_id,
			target_repository_name: repository.repository_name,
			default_ref: repository.default_branch,
			state_id: Uuid::new_v4(),
			event_name: event.event_name.clone(),
			event_payload_json: event.event_payload.to_string(),
			settings_json: event.settings.to_string(),
			auth_token: credential.secret().clone(),
		}
	}

	pub fn target_organization_id(&self) -> u64 {
		self.target_organization_id
	}

	pub fn target_repository_id(&self) -> u64 {
		self.target_repository_id
	}

	pub fn target_repository_name(&self) -> &str {
		&self.target_repository_name
	}

	pub fn default_ref(&self) -> &str {
		&self.default_ref
	}

	pub fn state_id(&self) -> Uuid {
		self.state_id
	}

	/// Body of the workflow dispatch call, signed with `signer`
	pub fn to_workflow_dispatch(&self, signer: &InputSigner) -> WorkflowDispatch {
		let mut inputs = BTreeMap::from([
			("stateId".to_string(), self.state_id.to_string()),
			("eventName".to_string(), self.event_name.clone()),
			("eventPayload".to_string(), self.event_payload_json.clone()),
			("settings".to_string(), self.settings_json.clone()),
			(
				AUTH_TOKEN_INPUT.to_string(),
				self.auth_token.as_str().to_string(),
			),
			("command".to_string(), NULL_COMMAND.to_string()),
			("ref".to_string(), self.default_ref.clone()),
		]);
		let signature = signer.sign(&inputs);
		inputs.insert(SIGNATURE_INPUT.to_string(), signature);

		WorkflowDispatch {
			git_ref: self.default_ref.clone(),
			inputs,
		}
	}
}

impl fmt::Debug for DispatchRequest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DispatchRequest")
			.field("target_organization_id", &self.target_organization_id)
			.field("target_repository_id", &self.target_repository_id)
			.field("target_repository_name", &self.target_repository_name)
			.field("default_ref", &self.default_ref)
			.field("state_id", &self.state_id)
			.field("event_name", &self.event_name)
			.field("auth_token", &"<redacted>")
			.finish_non_exhaustive()
	}
}
