//! Test helper utilities for trigger events
//!
//! - `TriggerEventBuilder`: Builder for creating test TriggerEvent instances

use serde_json::json;

use crate::{models::TriggerEvent, utils::constants::SUPPORTED_EVENT_NAME};

/// Builder for creating test TriggerEvent instances
pub struct TriggerEventBuilder {
	body: Option<String>,
	author: String,
	owner: String,
	repository: String,
	event_name: String,
	settings: serde_json::Value,
}

impl Default for TriggerEventBuilder {
	fn default() -> Self {
		Self {
			body: Some("@alice run report".to_string()),
			author: "carol".to_string(),
			owner: "acme".to_string(),
			repository: "app".to_string(),
			event_name: SUPPORTED_EVENT_NAME.to_string(),
			settings: json!({}),
		}
	}
}

impl TriggerEventBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn body(mut self, body: &str) -> Self {
		self.body = Some(body.to_string());
		self
	}

	pub fn null_body(mut self) -> Self {
		self.body = None;
		self
	}

	pub fn author(mut self, author: &str) -> Self {
		self.author = author.to_string();
		self
	}

	pub fn repository(mut self, owner: &str, name: &str) -> Self {
		self.owner = owner.to_string();
		self.repository = name.to_string();
		self
	}

	pub fn event_name(mut self, event_name: &str) -> Self {
		self.event_name = event_name.to_string();
		self
	}

	pub fn settings(mut self, settings: serde_json::Value) -> Self {
		self.settings = settings;
		self
	}

	/// Webhook payload the event is built from
	pub fn payload(&self) -> serde_json::Value {
		json!({
			"action": "created",
			"comment": {
				"id": 1,
				"body": self.body,
				"user": { "login": self.author }
			},
			"issue": { "number": 1 },
			"repository": {
				"name": self.repository,
				"owner": { "login": self.owner }
			}
		})
	}

	pub fn build(self) -> TriggerEvent {
		TriggerEvent::from_issue_comment(self.event_name.clone(), self.payload(), self.settings)
			.expect("builder payload is a valid issue comment")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_event() {
		let event = TriggerEventBuilder::new().build();
		assert_eq!(event.raw_text, "@alice run report");
		assert_eq!(event.source_owner, "carol");
		assert_eq!(event.source_repository.to_string(), "acme/app");
		assert_eq!(event.event_name, "issue_comment.created");
	}

	#[test]
	fn test_custom_event() {
		let event = TriggerEventBuilder::new()
			.body("hello everyone")
			.author("dave")
			.repository("org", "repo")
			.event_name("issues.opened")
			.settings(json!({ "a": 1 }))
			.build();
		assert_eq!(event.raw_text, "hello everyone");
		assert_eq!(event.source_owner, "dave");
		assert_eq!(event.event_name, "issues.opened");
		assert_eq!(event.settings, json!({ "a": 1 }));

		assert_eq!(TriggerEventBuilder::new().null_body().build().raw_text, "");
	}
}
