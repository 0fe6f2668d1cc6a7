//! Bootstrap module for initializing the bridge.
//!
//! Wires the validated [`BridgeConfig`] into a ready dispatcher and loads trigger events
//! from webhook payload files:
//!
//! - Holder key decoding
//! - GitHub HTTP client with transport retries
//! - Authenticator selection (`AUTH_MODE`)
//! - Input signer

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use std::{error::Error, fs, path::Path, sync::Arc};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
	models::{
		AuthMode, BridgeConfig, ConfigError, DispatchOutcome, SecretString, SecurityError,
		SecurityResult, TriggerEvent, UnsealedCredential, SEALED_CREDENTIAL_FIELD,
	},
	services::{
		dispatcher::{BridgeError, InputSigner, ScopeBoundDispatcher},
		github::{AppInstallationAuthenticator, Authenticator, GitHubClient, TokenAuthenticator},
		unsealer::{parse_public_key, seal, HolderKey},
	},
	utils::{constants::SUPPORTED_EVENT_NAME, create_github_http_client},
};

/// Type alias for handling bootstrap results
pub type Result<T> = std::result::Result<T, Box<dyn Error>>;

/// Dispatcher backed by the GitHub adapters
pub type BridgeDispatcher =
	ScopeBoundDispatcher<Arc<GitHubClient>, Arc<GitHubClient>, Arc<dyn Authenticator>>;

/// Decodes the holder key configured in `X25519_PRIVATE_KEY`.
pub fn load_holder_key(secret: &SecretString) -> SecurityResult<HolderKey> {
	HolderKey::from_secret(secret)
		.map_err(|e| Box::new(SecurityError::invalid_holder_key(Some(Box::new(e)))))
}

/// Builds the dispatcher described by `config`.
///
/// Fails if the holder key or the GitHub App key is unusable, so misconfiguration
/// surfaces at startup rather than on the first event.
pub fn initialize_dispatcher(config: &BridgeConfig) -> Result<BridgeDispatcher> {
	let holder_key = Arc::new(load_holder_key(&config.holder_private_key)?);

	let http_client = Arc::new(create_github_http_client(
		&config.retry,
		config.stage_timeout,
	)?);
	let github = Arc::new(GitHubClient::new(
		http_client,
		&config.github_api_url,
		config.github_token.clone(),
	));

	let authenticator: Arc<dyn Authenticator> = match &config.auth_mode {
		AuthMode::Token => Arc::new(TokenAuthenticator),
		AuthMode::App {
			app_id,
			private_key,
		} => Arc::new(AppInstallationAuthenticator::new(
			*app_id,
			private_key,
			(*github).clone(),
		)?),
	};

	let signer = InputSigner::new(config.signing_secret.as_ref());
	info!(
		auth_mode = ?config.auth_mode,
		signing = signer.is_enabled(),
		holder_public_key = %holder_key.public_key_base64url(),
		"Bridge initialized"
	);

	Ok(ScopeBoundDispatcher::new(
		github.clone(),
		github,
		authenticator,
		holder_key,
		signer,
		config.stage_timeout,
	))
}

/// Determines the event name of a webhook delivery.
///
/// An explicit name wins. Otherwise it is `<platform event>.<payload action>`, the way
/// GitHub Actions exposes `issue_comment` deliveries.
pub fn resolve_event_name(
	explicit: Option<&str>,
	platform_event: Option<&str>,
	payload: &serde_json::Value,
) -> Option<String> {
	if let Some(name) = explicit.filter(|name| !name.trim().is_empty()) {
		return Some(name.trim().to_string());
	}
	let platform_event = platform_event.filter(|name| !name.trim().is_empty())?;
	match payload.get("action").and_then(|action| action.as_str()) {
		Some(action) => Some(format!("{}.{}", platform_event.trim(), action)),
		None => Some(platform_event.trim().to_string()),
	}
}

fn read_json(path: &Path) -> std::result::Result<serde_json::Value, ConfigError> {
	let raw = fs::read_to_string(path).map_err(|e| {
		ConfigError::file_error(
			"Failed to read file",
			Some(Box::new(e)),
			Some([("path".to_string(), path.display().to_string())].into()),
		)
	})?;
	serde_json::from_str(&raw).map_err(|e| {
		ConfigError::parse_error(
			"File is not valid JSON",
			Some(Box::new(e)),
			Some([("path".to_string(), path.display().to_string())].into()),
		)
	})
}

/// Loads a trigger event from a webhook payload file.
///
/// Returns `Ok(None)` for events the bridge does not handle; those are logged and need
/// no further processing.
pub fn load_trigger_event(
	event_path: &Path,
	event_name: Option<&str>,
	platform_event: Option<&str>,
	settings_path: Option<&Path>,
) -> std::result::Result<Option<TriggerEvent>, ConfigError> {
	let payload = read_json(event_path)?;
	let settings = match settings_path {
		Some(path) => read_json(path)?,
		None => serde_json::json!({}),
	};

	let event_name = resolve_event_name(event_name, platform_event, &payload)
		.unwrap_or_else(|| SUPPORTED_EVENT_NAME.to_string());
	if event_name != SUPPORTED_EVENT_NAME {
		warn!(event_name = %event_name, "Unsupported event");
		return Ok(None);
	}

	TriggerEvent::from_issue_comment(event_name, payload, settings)
		.map(Some)
		.map_err(|e| {
			ConfigError::parse_error(
				"Payload is not an issue comment event",
				Some(Box::new(e)),
				Some([("path".to_string(), event_path.display().to_string())].into()),
			)
		})
}

/// Human readable summary of a run
pub fn describe_outcome(outcome: &DispatchOutcome) -> String {
	match outcome {
		DispatchOutcome::Ignored => "ignored: the event does not address a personal agent".to_string(),
		DispatchOutcome::NotBridgeable { target, reason } => {
			format!("not bridgeable: @{}: {}", target, reason)
		}
		DispatchOutcome::Dispatched { target, state_id } => {
			format!("dispatched: @{} (state id {})", target, state_id)
		}
	}
}

/// Processes one event and stops it early if `shutdown_rx` fires before dispatch.
pub async fn process_event(
	dispatcher: &BridgeDispatcher,
	event: &TriggerEvent,
	shutdown_rx: watch::Receiver<bool>,
) -> std::result::Result<DispatchOutcome, BridgeError> {
	let outcome = dispatcher.run_with_shutdown(event, shutdown_rx).await?;
	info!(outcome = %describe_outcome(&outcome), "Run finished");
	Ok(outcome)
}

/// Seals an owner credential for the bridge holder and renders the configuration line the
/// owner commits to their agent repository.
///
/// The recipient is `public_key` when given, otherwise derived from `holder_private_key`.
pub fn seal_owner_credential(
	secret: SecretString,
	organization_id: u64,
	repository_id: Option<u64>,
	public_key: Option<&str>,
	holder_private_key: Option<&SecretString>,
) -> Result<String> {
	let recipient = match (public_key, holder_private_key) {
		(Some(encoded), _) => parse_public_key(encoded)?,
		(None, Some(private_key)) => load_holder_key(private_key)?.public_key().clone(),
		(None, None) => {
			return Err("either --public-key or X25519_PRIVATE_KEY is required to seal".into())
		}
	};

	let credential = UnsealedCredential::new(secret, organization_id, repository_id);
	let ciphertext = seal(&credential, &recipient)?;
	Ok(format!(
		"{}: {}",
		SEALED_CREDENTIAL_FIELD,
		URL_SAFE_NO_PAD.encode(ciphertext)
	))
}
