//! Test helper utilities for sealed credentials
//!
//! - `CredentialBuilder`: Builder for credentials and the owner configuration sealing them

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

use crate::{
	models::{SecretString, UnsealedCredential},
	services::unsealer::{seal, HolderKey},
};

/// Fixed holder scalar used across tests
pub const TEST_HOLDER_SCALAR: [u8; 32] = [
	0x1f, 0x8a, 0x3c, 0x55, 0x90, 0x21, 0x7e, 0x4d, 0xb2, 0x06, 0xe9, 0x13, 0x6a, 0xc4, 0x38,
	0x71, 0x0d, 0x9f, 0x52, 0xa7, 0x2b, 0xe0, 0x64, 0x17, 0xcd, 0x85, 0x3e, 0xf2, 0x49, 0x1a,
	0xb6, 0x70,
];

/// The holder key built from [`TEST_HOLDER_SCALAR`]
pub fn test_holder_key() -> HolderKey {
	HolderKey::from_bytes(&TEST_HOLDER_SCALAR).expect("test scalar is a valid key")
}

/// [`TEST_HOLDER_SCALAR`] as it appears in `X25519_PRIVATE_KEY`
pub fn test_holder_key_base64url() -> String {
	URL_SAFE_NO_PAD.encode(TEST_HOLDER_SCALAR)
}

/// Builder for creating test credentials and sealed configurations
pub struct CredentialBuilder {
	secret: String,
	organization_id: u64,
	repository_id: Option<u64>,
}

impl Default for CredentialBuilder {
	fn default() -> Self {
		Self {
			secret: "ghp_test_owner_token".to_string(),
			organization_id: 42,
			repository_id: None,
		}
	}
}

impl CredentialBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn secret(mut self, secret: &str) -> Self {
		self.secret = secret.to_string();
		self
	}

	pub fn organization_id(mut self, id: u64) -> Self {
		self.organization_id = id;
		self
	}

	pub fn repository_id(mut self, id: u64) -> Self {
		self.repository_id = Some(id);
		self
	}

	pub fn build(&self) -> UnsealedCredential {
		UnsealedCredential::new(
			SecretString::new(self.secret.clone()),
			self.organization_id,
			self.repository_id,
		)
	}

	/// Sealed box of the credential for `holder`
	pub fn sealed_for(&self, holder: &HolderKey) -> Vec<u8> {
		seal(&self.build(), holder.public_key()).expect("test credential seals")
	}

	/// Owner configuration file content carrying the sealed credential
	pub fn config_yaml_for(&self, holder: &HolderKey) -> Vec<u8> {
		format!(
			"# personal agent configuration\nGITHUB_PAT_ENCRYPTED: {}\n",
			URL_SAFE_NO_PAD.encode(self.sealed_for(holder))
		)
		.into_bytes()
	}
}
