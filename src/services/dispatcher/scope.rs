//! Scope validation.
//!
//! [`ScopeGrant`] can only be obtained from [`validate_scope`], and a dispatch request
//! can only be built from a grant. There is no path that places a credential into a
//! request without the check.

use crate::{
	models::{ActualRepository, UnsealedCredential},
	services::dispatcher::error::{BridgeError, ScopeMismatch},
};

/// Proof that a credential's scope covers a concrete repository
#[derive(Debug)]
pub struct ScopeGrant {
	credential: UnsealedCredential,
	repository: ActualRepository,
}

impl ScopeGrant {
	pub fn credential(&self) -> &UnsealedCredential {
		&self.credential
	}

	pub fn repository(&self) -> &ActualRepository {
		&self.repository
	}

	pub(crate) fn into_parts(self) -> (UnsealedCredential, ActualRepository) {
		(self.credential, self.repository)
	}
}

/// Whether `credential` may act on `actual`
pub fn is_within_scope(credential: &UnsealedCredential, actual: &ActualRepository) -> bool {
	credential.allowed_organization_id() == actual.organization_id
		&& credential
			.allowed_repository_id()
			.is_none_or(|id| id == actual.repository_id)
}

/// Checks the credential's claims against the repository the platform reported.
///
/// The organization must match; when a repository claim is present it must match too.
pub fn validate_scope(
	credential: UnsealedCredential,
	actual: ActualRepository,
) -> Result<ScopeGrant, BridgeError> {
	if !is_within_scope(&credential, &actual) {
		return Err(BridgeError::scope_violation(ScopeMismatch {
			allowed_organization_id: credential.allowed_organization_id(),
			allowed_repository_id: credential.allowed_repository_id(),
			actual_organization_id: actual.organization_id,
			actual_repository_id: actual.repository_id,
			repository_name: format!("{}/{}", actual.organization_login, actual.repository_name),
		}));
	}

	Ok(ScopeGrant {
		credential,
		repository: actual,
	})
}
