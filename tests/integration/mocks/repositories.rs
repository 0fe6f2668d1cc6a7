//! Mock implementations of repository traits.
//!
//! - [`MockAgentConfigStore`] - Mock implementation of the owner configuration store

use async_trait::async_trait;
use mockall::mock;
use personal_agent_bridge::{
	models::RepositoryRef,
	repositories::{ConfigStore, RepositoryError},
};

mock! {
	/// Mock implementation of the configuration store.
	///
	/// Simulates reading files from agent repositories without any network access.
	pub AgentConfigStore {}

	#[async_trait]
	impl ConfigStore for AgentConfigStore {
		async fn get_file(
			&self,
			repository: &RepositoryRef,
			path: &str,
		) -> Result<Option<Vec<u8>>, RepositoryError>;
	}
}
