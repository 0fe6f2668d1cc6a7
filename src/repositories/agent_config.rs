//! Owner agent configuration repository.
//!
//! Reads `.github/personal-agent.config.yml` from the mentioned owner's
//! `personal-agent` repository and turns it into a [`SealedCredentialRecord`]. The
//! repository is always derived from the mention, never from where the comment was
//! posted.

#![allow(clippy::result_large_err)]

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
	models::{parse_config, ConfigError, RepositoryRef, SealedCredentialRecord, TargetIdentifier},
	repositories::error::RepositoryError,
	utils::constants::{AGENT_CONFIG_PATH, AGENT_REPOSITORY_NAME},
};

/// Store holding owner configuration files
///
/// Implementations return `Ok(None)` when the file or the repository does not exist, and
/// an error for anything else (denied access, transport failure, unexpected status).
#[async_trait]
pub trait ConfigStore: Send + Sync {
	async fn get_file(
		&self,
		repository: &RepositoryRef,
		path: &str,
	) -> Result<Option<Vec<u8>>, RepositoryError>;
}

#[async_trait]
impl<T: ConfigStore + ?Sized> ConfigStore for Arc<T> {
	async fn get_file(
		&self,
		repository: &RepositoryRef,
		path: &str,
	) -> Result<Option<Vec<u8>>, RepositoryError> {
		(**self).get_file(repository, path).await
	}
}

/// Result of looking up an owner's configuration
#[derive(Debug)]
pub enum ConfigLookup {
	/// No readable configuration; the owner has not opted in
	Absent,
	/// A configuration exists but is unusable
	Malformed(ConfigError),
	/// A well-formed sealed credential
	Found(SealedCredentialRecord),
}

/// Repository for owner agent configurations
#[derive(Clone)]
pub struct AgentConfigRepository<S: ConfigStore> {
	store: S,
}

/// Repository holding the owner configuration of `target`
pub fn agent_repository_of(target: &TargetIdentifier) -> RepositoryRef {
	RepositoryRef::new(target.as_str(), AGENT_REPOSITORY_NAME)
}

impl<S: ConfigStore> AgentConfigRepository<S> {
	pub fn new(store: S) -> Self {
		Self { store }
	}

	/// Fetches the raw configuration bytes of `target`.
	///
	/// Every failure is folded into `None`. Failures other than a missing file are
	/// logged at warn level for operators.
	pub async fn fetch_config(&self, target: &TargetIdentifier) -> Option<Vec<u8>> {
		let repository = agent_repository_of(target);
		match self.store.get_file(&repository, AGENT_CONFIG_PATH).await {
			Ok(Some(bytes)) => Some(bytes),
			Ok(None) => {
				debug!(
					repository = %repository,
					"No agent configuration found"
				);
				None
			}
			Err(e) => {
				warn!(
					repository = %repository,
					error = %e,
					"Failed to read agent configuration, treating target as not opted in"
				);
				None
			}
		}
	}

	/// Fetches and parses the configuration of `target`.
	pub async fn load(&self, target: &TargetIdentifier) -> ConfigLookup {
		let Some(raw) = self.fetch_config(target).await else {
			return ConfigLookup::Absent;
		};

		match parse_config(&raw) {
			Ok(record) => ConfigLookup::Found(record),
			Err(e) => {
				warn!(
					repository = %agent_repository_of(target),
					error = %e,
					"Agent configuration is malformed"
				);
				ConfigLookup::Malformed(e)
			}
		}
	}
}
