//! The bridge's X25519 holder key.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use crypto_box::{PublicKey, SecretKey};
use std::fmt;

use crate::{models::SecretString, services::unsealer::error::UnsealError};

/// Size of an X25519 scalar or point in bytes
pub const KEY_SIZE: usize = 32;

/// Private X25519 scalar that owners seal their credentials for.
///
/// Created once at startup and shared read-only between runs.
#[derive(Clone)]
pub struct HolderKey {
	secret: SecretKey,
	public: PublicKey,
}

impl HolderKey {
	/// Builds a key from its raw 32-byte scalar.
	pub fn from_bytes(bytes: &[u8]) -> Result<Self, UnsealError> {
		let scalar: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| {
			UnsealError::invalid_key(
				format!(
					"Holder key must be {} bytes, got {}",
					KEY_SIZE,
					bytes.len()
				),
				None,
				None,
			)
		})?;
		if scalar.iter().all(|b| *b == 0) {
			return Err(UnsealError::invalid_key(
				"Holder key must not be the zero scalar",
				None,
				None,
			));
		}

		let secret = SecretKey::from(scalar);
		let public = secret.public_key();
		Ok(Self { secret, public })
	}

	/// Builds a key from base64url without padding, as stored in `X25519_PRIVATE_KEY`.
	pub fn from_base64url(encoded: &str) -> Result<Self, UnsealError> {
		let bytes = zeroize::Zeroizing::new(URL_SAFE_NO_PAD.decode(encoded.trim()).map_err(
			|_| UnsealError::invalid_key("Holder key is not base64url without padding", None, None),
		)?);
		Self::from_bytes(&bytes)
	}

	pub fn from_secret(secret: &SecretString) -> Result<Self, UnsealError> {
		Self::from_base64url(secret.as_str())
	}

	pub(crate) fn secret_key(&self) -> &SecretKey {
		&self.secret
	}

	pub fn public_key(&self) -> &PublicKey {
		&self.public
	}

	/// Public key owners must seal against, base64url without padding.
	pub fn public_key_base64url(&self) -> String {
		URL_SAFE_NO_PAD.encode(self.public.as_bytes())
	}
}

impl fmt::Debug for HolderKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HolderKey")
			.field("public_key", &self.public_key_base64url())
			.finish_non_exhaustive()
	}
}

/// Parses a recipient public key in base64url without padding.
pub fn parse_public_key(encoded: &str) -> Result<PublicKey, UnsealError> {
	let bytes = URL_SAFE_NO_PAD.decode(encoded.trim()).map_err(|_| {
		UnsealError::invalid_key("Public key is not base64url without padding", None, None)
	})?;
	let bytes: [u8; KEY_SIZE] = bytes.as_slice().try_into().map_err(|_| {
		UnsealError::invalid_key(
			format!("Public key must be {} bytes, got {}", KEY_SIZE, bytes.len()),
			None,
			None,
		)
	})?;
	Ok(PublicKey::from(bytes))
}
