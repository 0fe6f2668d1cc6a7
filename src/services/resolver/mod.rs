//! Target resolution.
//!
//! Decides whether a comment addresses a personal agent and, if so, whose. Only a
//! mention at the very start of the (trimmed) text counts; everything after it is the
//! command text and is not interpreted here.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::TargetIdentifier;

lazy_static! {
	// ASCII classes only; `(?i)` would fold the Kelvin sign and long s into `[a-z]`
	static ref LEADING_MENTION: Regex =
		Regex::new(r"^@([A-Za-z0-9_-]+)").expect("mention pattern is a valid regex");
}

/// Classification of a trigger text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetResolution {
	/// The text does not start with a mention
	Irrelevant,
	/// The text starts with `@` but no handle follows it
	Malformed,
	/// The text addresses `target`; `command` is the remaining text, trimmed
	Target {
		target: TargetIdentifier,
		command: String,
	},
}

/// Extracts the mentioned owner from a trigger text.
pub fn resolve_target(raw_text: &str) -> TargetResolution {
	let text = raw_text.trim();
	if !text.starts_with('@') {
		return TargetResolution::Irrelevant;
	}

	let Some(captures) = LEADING_MENTION.captures(text) else {
		return TargetResolution::Malformed;
	};

	let (Some(whole), Some(handle)) = (captures.get(0), captures.get(1)) else {
		return TargetResolution::Malformed;
	};
	match TargetIdentifier::parse(handle.as_str()) {
		Some(target) => TargetResolution::Target {
			target,
			command: text[whole.end()..].trim().to_string(),
		},
		None => TargetResolution::Malformed,
	}
}
