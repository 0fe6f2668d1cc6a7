//! Repository as reported by the remote platform.

use serde::{Deserialize, Serialize};

/// The actual agent repository the mention resolves to.
///
/// These ids are authoritative; they are what an owner's scope claims are checked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActualRepository {
	pub organization_id: u64,
	pub organization_login: String,
	pub repository_id: u64,
	pub repository_name: String,
	pub default_branch: String,
}
