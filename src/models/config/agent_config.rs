//! Owner agent configuration.
//!
//! Owners opt in by committing `.github/personal-agent.config.yml` to their
//! `personal-agent` repository. The only field the bridge reads is
//! `GITHUB_PAT_ENCRYPTED`, the base64url sealed box of their credential.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use std::collections::HashMap;

use crate::models::{ConfigError, SealedCredentialRecord};

/// Name of the ciphertext field in the owner configuration file
pub const SEALED_CREDENTIAL_FIELD: &str = "GITHUB_PAT_ENCRYPTED";

#[derive(Debug, Deserialize)]
struct AgentConfigFile {
	#[serde(rename = "GITHUB_PAT_ENCRYPTED")]
	github_pat_encrypted: String,
}

fn field_metadata() -> Option<HashMap<String, String>> {
	Some(HashMap::from([(
		"field".to_string(),
		SEALED_CREDENTIAL_FIELD.to_string(),
	)]))
}

/// Parses owner configuration bytes into a sealed credential record.
///
/// Validation is structural: well-formed YAML mapping, required field present and a
/// string holding base64url without padding. Unknown fields are ignored. An empty value
/// is accepted here and rejected when unsealing.
pub fn parse_config(raw: &[u8]) -> Result<SealedCredentialRecord, ConfigError> {
	let text = std::str::from_utf8(raw).map_err(|e| {
		ConfigError::parse_error("Configuration is not valid UTF-8", Some(Box::new(e)), None)
	})?;

	let document: serde_yaml::Value = serde_yaml::from_str(text)?;
	if document.is_null() {
		return Err(ConfigError::validation_error(
			"Configuration file is empty",
			None,
			None,
		));
	}
	if !document.is_mapping() {
		return Err(ConfigError::validation_error(
			"Configuration must be a mapping",
			None,
			None,
		));
	}

	let config: AgentConfigFile = serde_yaml::from_value(document).map_err(|e| {
		ConfigError::validation_error(
			format!("Missing or mistyped {}", SEALED_CREDENTIAL_FIELD),
			Some(Box::new(e)),
			field_metadata(),
		)
	})?;

	let encoded = config.github_pat_encrypted.trim();
	let ciphertext = URL_SAFE_NO_PAD.decode(encoded).map_err(|e| {
		ConfigError::validation_error(
			format!("{} is not base64url without padding", SEALED_CREDENTIAL_FIELD),
			Some(Box::new(e)),
			field_metadata(),
		)
	})?;

	Ok(SealedCredentialRecord::new(ciphertext))
}
