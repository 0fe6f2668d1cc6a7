//! Dispatch input signing.
//!
//! The remote job may verify that its inputs came from this bridge. With a signing
//! secret configured, the `signature` input is an HMAC-SHA256 over the canonical JSON of
//! all other inputs; without one it is the literal `no-signature`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::BTreeMap;

use crate::{models::SecretString, utils::constants::NO_SIGNATURE};

type HmacSha256 = Hmac<Sha256>;

/// Input key holding the signature
pub const SIGNATURE_INPUT: &str = "signature";

/// Signs workflow dispatch inputs
#[derive(Clone, Default)]
pub struct InputSigner {
	mac: Option<HmacSha256>,
}

impl InputSigner {
	/// Creates a signer; `None` or an empty secret disables signing.
	pub fn new(secret: Option<&SecretString>) -> Self {
		let mac = secret
			.filter(|secret| !secret.is_empty())
			.and_then(|secret| HmacSha256::new_from_slice(secret.as_str().as_bytes()).ok());
		Self { mac }
	}

	pub fn is_enabled(&self) -> bool {
		self.mac.is_some()
	}

	fn canonical_message(inputs: &BTreeMap<String, String>) -> Vec<u8> {
		let unsigned: BTreeMap<&str, &str> = inputs
			.iter()
			.filter(|(key, _)| key.as_str() != SIGNATURE_INPUT)
			.map(|(key, value)| (key.as_str(), value.as_str()))
			.collect();
		// A map of strings always serializes
		serde_json::to_vec(&unsigned).unwrap_or_default()
	}

	/// Signature for `inputs`, ignoring any existing `signature` entry
	pub fn sign(&self, inputs: &BTreeMap<String, String>) -> String {
		match &self.mac {
			Some(mac) => {
				let mut mac = mac.clone();
				mac.update(&Self::canonical_message(inputs));
				hex::encode(mac.finalize().into_bytes())
			}
			None => NO_SIGNATURE.to_string(),
		}
	}

	/// Verifies the `signature` entry of `inputs`
	pub fn verify(&self, inputs: &BTreeMap<String, String>) -> bool {
		let Some(signature) = inputs.get(SIGNATURE_INPUT) else {
			return false;
		};
		match &self.mac {
			Some(mac) => {
				let Ok(expected) = hex::decode(signature) else {
					return false;
				};
				let mut mac = mac.clone();
				mac.update(&Self::canonical_message(inputs));
				mac.verify_slice(&expected).is_ok()
			}
			None => signature == NO_SIGNATURE,
		}
	}
}
