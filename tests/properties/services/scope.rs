use crate::properties::strategies::{credential_strategy, repository_strategy};

use personal_agent_bridge::services::dispatcher::{is_within_scope, validate_scope, BridgeError};
use proptest::{prelude::*, test_runner::Config};

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		..Config::default()
	})]

	// A grant exists exactly when the organization matches and any repository claim matches
	#[test]
	fn test_scope_rule(
		credential in credential_strategy(),
		actual in repository_strategy(),
	) {
		let expected = credential.allowed_organization_id() == actual.organization_id
			&& credential
				.allowed_repository_id()
				.map_or(true, |id| id == actual.repository_id);
		prop_assert_eq!(is_within_scope(&credential, &actual), expected);

		match validate_scope(credential.clone(), actual.clone()) {
			Ok(grant) => {
				prop_assert!(expected);
				prop_assert_eq!(grant.credential(), &credential);
				prop_assert_eq!(grant.repository(), &actual);
			}
			Err(BridgeError::ScopeViolation { mismatch, .. }) => {
				prop_assert!(!expected);
				prop_assert_eq!(mismatch.allowed_organization_id, credential.allowed_organization_id());
				prop_assert_eq!(mismatch.actual_repository_id, actual.repository_id);
			}
			Err(other) => prop_assert!(false, "unexpected error {:?}", other),
		}
	}
}
