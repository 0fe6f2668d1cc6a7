//! Credential models.
//!
//! [`SealedCredentialRecord`] is what an owner publishes in their agent configuration;
//! [`UnsealedCredential`] is what the bridge recovers from it with the holder key. The
//! latter only ever lives in memory and its secret is zeroized on drop.

use std::fmt;

use crate::models::SecretString;

/// Encryption scheme of a sealed credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
	/// Anonymous X25519 + XSalsa20-Poly1305 sealed box
	SealedBox,
}

/// Ciphertext published by an owner for the bridge
#[derive(Clone, PartialEq, Eq)]
pub struct SealedCredentialRecord {
	ciphertext: Vec<u8>,
	source_format: SourceFormat,
}

impl SealedCredentialRecord {
	pub fn new(ciphertext: Vec<u8>) -> Self {
		Self {
			ciphertext,
			source_format: SourceFormat::SealedBox,
		}
	}

	pub fn ciphertext(&self) -> &[u8] {
		&self.ciphertext
	}

	pub fn source_format(&self) -> SourceFormat {
		self.source_format
	}
}

impl fmt::Debug for SealedCredentialRecord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SealedCredentialRecord")
			.field("ciphertext_len", &self.ciphertext.len())
			.field("source_format", &self.source_format)
			.finish()
	}
}

/// An opened credential together with the scope its owner granted it
#[derive(Clone, PartialEq, Eq)]
pub struct UnsealedCredential {
	secret: SecretString,
	allowed_organization_id: u64,
	allowed_repository_id: Option<u64>,
}

impl UnsealedCredential {
	pub fn new(
		secret: SecretString,
		allowed_organization_id: u64,
		allowed_repository_id: Option<u64>,
	) -> Self {
		Self {
			secret,
			allowed_organization_id,
			allowed_repository_id,
		}
	}

	pub fn secret(&self) -> &SecretString {
		&self.secret
	}

	pub fn allowed_organization_id(&self) -> u64 {
		self.allowed_organization_id
	}

	pub fn allowed_repository_id(&self) -> Option<u64> {
		self.allowed_repository_id
	}
}

impl fmt::Debug for UnsealedCredential {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("UnsealedCredential")
			.field("secret", &"<redacted>")
			.field("allowed_organization_id", &self.allowed_organization_id)
			.field("allowed_repository_id", &self.allowed_repository_id)
			.finish()
	}
}
