//! Request authentication for the agent repository.
//!
//! The dispatcher asks an [`Authenticator`] for the bearer token to use against the
//! mentioned owner's agent repository. Which variant is active is a deployment choice
//! (`AUTH_MODE`); the scope check happens regardless of it.

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use std::sync::Arc;

use crate::{
	models::{RepositoryRef, SecretString, SecurityError, SecurityResult, UnsealedCredential},
	services::github::{client::GitHubClient, error::GitHubError},
};

/// Clock skew allowance for the app JWT issue time
const JWT_BACKDATE_SECS: i64 = 60;
/// GitHub rejects app JWTs valid for more than ten minutes
const JWT_LIFETIME_SECS: i64 = 540;

/// Supplies the bearer token for calls against an agent repository
#[async_trait]
pub trait Authenticator: Send + Sync {
	async fn bearer_token(
		&self,
		repository: &RepositoryRef,
		credential: &UnsealedCredential,
	) -> Result<SecretString, GitHubError>;
}

#[async_trait]
impl<T: Authenticator + ?Sized> Authenticator for Arc<T> {
	async fn bearer_token(
		&self,
		repository: &RepositoryRef,
		credential: &UnsealedCredential,
	) -> Result<SecretString, GitHubError> {
		(**self).bearer_token(repository, credential).await
	}
}

/// Uses the owner's unsealed credential itself as bearer token
#[derive(Debug, Clone, Default)]
pub struct TokenAuthenticator;

#[async_trait]
impl Authenticator for TokenAuthenticator {
	async fn bearer_token(
		&self,
		_repository: &RepositoryRef,
		credential: &UnsealedCredential,
	) -> Result<SecretString, GitHubError> {
		Ok(credential.secret().clone())
	}
}

#[derive(Serialize)]
struct AppClaims {
	iat: i64,
	exp: i64,
	iss: String,
}

/// Authenticates as a GitHub App installation on the agent repository.
///
/// Mints an app JWT, finds the installation covering the repository and exchanges the JWT
/// for an installation token restricted to that repository.
pub struct AppInstallationAuthenticator {
	app_id: u64,
	signing_key: EncodingKey,
	client: GitHubClient,
}

impl AppInstallationAuthenticator {
	pub fn new(
		app_id: u64,
		private_key: &SecretString,
		client: GitHubClient,
	) -> SecurityResult<Self> {
		let signing_key = EncodingKey::from_rsa_pem(private_key.as_str().as_bytes())
			.map_err(|e| Box::new(SecurityError::invalid_app_key(Some(Box::new(e)))))?;

		Ok(Self {
			app_id,
			signing_key,
			client,
		})
	}

	fn app_jwt(&self) -> Result<SecretString, GitHubError> {
		let now = Utc::now().timestamp();
		let claims = AppClaims {
			iat: now - JWT_BACKDATE_SECS,
			exp: now + JWT_LIFETIME_SECS,
			iss: self.app_id.to_string(),
		};

		encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
			.map(SecretString::new)
			.map_err(|e| {
				GitHubError::authentication_error(
					"Failed to sign app JWT",
					Some(Box::new(e)),
					None,
				)
			})
	}
}

#[async_trait]
impl Authenticator for AppInstallationAuthenticator {
	async fn bearer_token(
		&self,
		repository: &RepositoryRef,
		_credential: &UnsealedCredential,
	) -> Result<SecretString, GitHubError> {
		let jwt = self.app_jwt()?;
		let installation_id = self
			.client
			.get_repository_installation(repository, &jwt)
			.await?;
		self.client
			.create_installation_token(installation_id, repository, &jwt)
			.await
	}
}
