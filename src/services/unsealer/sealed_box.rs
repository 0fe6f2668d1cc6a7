//! Anonymous sealed boxes, compatible with libsodium's `crypto_box_seal`.
//!
//! The box is `ephemeral_pk || XSalsa20-Poly1305(plaintext)` with the nonce derived as
//! `BLAKE2b(ephemeral_pk || recipient_pk)`. Owners produce it with any libsodium binding
//! (or the `seal` subcommand) against the bridge's published public key.

use crypto_box::{aead::OsRng, PublicKey};
use zeroize::Zeroizing;

use crate::{
	models::UnsealedCredential,
	services::unsealer::{
		error::UnsealError,
		holder_key::HolderKey,
		payload::{format_credential_payload, parse_credential_payload},
	},
};

/// Opens a sealed credential with the holder key.
///
/// Fails with `EmptyCiphertext` before attempting decryption, with
/// `AuthenticationFailed` for every opening failure (wrong key, tampering, truncation),
/// and with `InvalidCredentialPayload` when the box opens but its content does not parse.
pub fn unseal(ciphertext: &[u8], holder_key: &HolderKey) -> Result<UnsealedCredential, UnsealError> {
	if ciphertext.is_empty() {
		return Err(UnsealError::empty_ciphertext());
	}

	let plaintext = Zeroizing::new(
		holder_key
			.secret_key()
			.unseal(ciphertext)
			.map_err(|_| UnsealError::authentication_failed())?,
	);

	parse_credential_payload(&plaintext)
}

/// Seals a credential for `recipient` with a fresh ephemeral key.
pub fn seal(credential: &UnsealedCredential, recipient: &PublicKey) -> Result<Vec<u8>, UnsealError> {
	let payload = format_credential_payload(credential)?;
	recipient
		.seal(&mut OsRng, payload.as_bytes())
		.map_err(|_| UnsealError::Other(anyhow::anyhow!("Failed to seal credential")))
}
