//! Repository implementations.
//!
//! - `agent_config`: owner opt-in configuration files, read through a [`ConfigStore`]

mod agent_config;
mod error;

pub use agent_config::{agent_repository_of, AgentConfigRepository, ConfigLookup, ConfigStore};
pub use error::RepositoryError;
