//! Bridge process configuration.
//!
//! Everything is read from the environment once at startup. `.env` files are applied by
//! the binary before this runs, and CLI flags are written back into the environment, so
//! the environment is the single source here.

use std::{collections::HashMap, env, fmt, str::FromStr, time::Duration};
use url::Url;

use crate::{
	models::{ConfigError, SecretString},
	utils::{
		constants::{DEFAULT_GITHUB_API_URL, DEFAULT_STAGE_TIMEOUT_SECS},
		parsing::parse_positive_id,
		RetryConfig,
	},
};

/// How the bridge authenticates its own GitHub API calls
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMode {
	/// Use the owner's unsealed credential as bearer token
	Token,
	/// Mint an installation token for the owner's agent repository
	App {
		app_id: u64,
		private_key: SecretString,
	},
}

impl fmt::Debug for AuthMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Token => f.write_str("Token"),
			Self::App { app_id, .. } => f
				.debug_struct("App")
				.field("app_id", app_id)
				.field("private_key", &"<redacted>")
				.finish(),
		}
	}
}

/// Validated bridge configuration
#[derive(Debug, Clone)]
pub struct BridgeConfig {
	/// Base64url holder private key; decoded into a key when the bridge starts
	pub holder_private_key: SecretString,
	pub auth_mode: AuthMode,
	pub github_api_url: Url,
	/// Optional token used to read owner configuration files
	pub github_token: Option<SecretString>,
	/// Optional HMAC key for dispatch input signatures
	pub signing_secret: Option<SecretString>,
	/// Upper bound of every network stage of a run
	pub stage_timeout: Duration,
	pub retry: RetryConfig,
}

fn variable_metadata(name: &str) -> Option<HashMap<String, String>> {
	Some(HashMap::from([("variable".to_string(), name.to_string())]))
}

fn missing(name: &str) -> ConfigError {
	ConfigError::validation_error(
		format!("{} must be set", name),
		None,
		variable_metadata(name),
	)
}

fn invalid(name: &str, expected: &str) -> ConfigError {
	ConfigError::validation_error(
		format!("{} must be {}", name, expected),
		None,
		variable_metadata(name),
	)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthModeKind {
	Token,
	App,
}

impl FromStr for AuthModeKind {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_lowercase().as_str() {
			"token" => Ok(Self::Token),
			"app" => Ok(Self::App),
			_ => Err(invalid("AUTH_MODE", "'token' or 'app'")),
		}
	}
}

impl BridgeConfig {
	/// Loads the configuration from process environment variables.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	/// Loads the configuration through an arbitrary variable lookup.
	///
	/// Empty values count as unset. Errors name the variable, never the value.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

		let holder_private_key = get("X25519_PRIVATE_KEY")
			.map(SecretString::new)
			.ok_or_else(|| missing("X25519_PRIVATE_KEY"))?;

		let kind = match get("AUTH_MODE") {
			Some(mode) => mode.parse::<AuthModeKind>()?,
			None => AuthModeKind::Token,
		};
		let auth_mode = match kind {
			AuthModeKind::Token => AuthMode::Token,
			AuthModeKind::App => {
				let app_id = get("APP_ID").ok_or_else(|| missing("APP_ID"))?;
				let app_id = parse_positive_id(app_id.trim())
					.ok_or_else(|| invalid("APP_ID", "a positive integer"))?;
				let private_key = get("APP_PRIVATE_KEY")
					.ok_or_else(|| missing("APP_PRIVATE_KEY"))?
					.replace("\\n", "\n");
				AuthMode::App {
					app_id,
					private_key: SecretString::new(private_key),
				}
			}
		};

		let github_api_url = get("GITHUB_API_URL")
			.unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string());
		let github_api_url = Url::parse(github_api_url.trim())
			.ok()
			.filter(|url| matches!(url.scheme(), "http" | "https"))
			.ok_or_else(|| invalid("GITHUB_API_URL", "an http(s) URL"))?;

		let stage_timeout = match get("STAGE_TIMEOUT_SECS") {
			Some(value) => value
				.trim()
				.parse::<u64>()
				.ok()
				.filter(|secs| *secs > 0)
				.map(Duration::from_secs)
				.ok_or_else(|| invalid("STAGE_TIMEOUT_SECS", "a positive number of seconds"))?,
			None => Duration::from_secs(DEFAULT_STAGE_TIMEOUT_SECS),
		};

		let mut retry = RetryConfig::default();
		if let Some(value) = get("HTTP_MAX_RETRIES") {
			retry.max_retries = value
				.trim()
				.parse::<u32>()
				.map_err(|_| invalid("HTTP_MAX_RETRIES", "a non-negative integer"))?;
		}

		Ok(Self {
			holder_private_key,
			auth_mode,
			github_api_url,
			github_token: get("GITHUB_TOKEN").map(SecretString::new),
			signing_secret: get("DISPATCH_SIGNING_SECRET").map(SecretString::new),
			stage_timeout,
			retry,
		})
	}
}
