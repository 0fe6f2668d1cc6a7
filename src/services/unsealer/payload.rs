//! Plaintext layout of a sealed credential: `<secret>:<organization id>[:<repository id>]`.

use zeroize::Zeroizing;

use crate::{
	models::{SecretString, UnsealedCredential},
	services::unsealer::error::UnsealError,
	utils::parsing::parse_positive_id,
};

const FIELD_SEPARATOR: char = ':';

/// Parses an opened plaintext into a credential and its scope claims.
///
/// Pure and total: any input yields either a credential or `InvalidCredentialPayload`.
/// Error messages describe the shape of the problem, never the content.
pub fn parse_credential_payload(plaintext: &[u8]) -> Result<UnsealedCredential, UnsealError> {
	let text = std::str::from_utf8(plaintext)
		.map_err(|_| UnsealError::invalid_credential_payload("Credential is not valid UTF-8"))?;

	let fields: Vec<&str> = text.split(FIELD_SEPARATOR).collect();
	let (secret, organization_id, repository_id) = match fields.as_slice() {
		[secret, organization_id] => (*secret, *organization_id, None),
		[secret, organization_id, repository_id] => {
			(*secret, *organization_id, Some(*repository_id))
		}
		_ => {
			return Err(UnsealError::invalid_credential_payload(format!(
				"Credential must have 2 or 3 fields, found {}",
				fields.len()
			)))
		}
	};

	if secret.is_empty() {
		return Err(UnsealError::invalid_credential_payload(
			"Credential secret is empty",
		));
	}

	let allowed_organization_id = parse_positive_id(organization_id).ok_or_else(|| {
		UnsealError::invalid_credential_payload("Organization id must be a positive integer")
	})?;

	let allowed_repository_id = match repository_id {
		Some(id) => Some(parse_positive_id(id).ok_or_else(|| {
			UnsealError::invalid_credential_payload("Repository id must be a positive integer")
		})?),
		None => None,
	};

	Ok(UnsealedCredential::new(
		SecretString::new(secret.to_string()),
		allowed_organization_id,
		allowed_repository_id,
	))
}

/// Serializes a credential into the plaintext layout.
///
/// Rejects credentials that would not parse back identically.
pub fn format_credential_payload(
	credential: &UnsealedCredential,
) -> Result<Zeroizing<String>, UnsealError> {
	let secret = credential.secret().as_str();
	if secret.is_empty() || secret.contains(FIELD_SEPARATOR) {
		return Err(UnsealError::invalid_credential_payload(
			"Credential secret must be non-empty and must not contain ':'",
		));
	}
	if credential.allowed_organization_id() == 0 || credential.allowed_repository_id() == Some(0)
	{
		return Err(UnsealError::invalid_credential_payload(
			"Scope ids must be positive integers",
		));
	}

	let mut payload = Zeroizing::new(format!(
		"{}{}{}",
		secret,
		FIELD_SEPARATOR,
		credential.allowed_organization_id()
	));
	if let Some(repository_id) = credential.allowed_repository_id() {
		payload.push(FIELD_SEPARATOR);
		payload.push_str(&repository_id.to_string());
	}
	Ok(payload)
}
