//! Integration tests for the scope bound dispatcher.
//!
//! Runs complete events through the dispatcher with mocked configuration store,
//! authenticator and repository API.

use crate::integration::mocks::{MockAgentConfigStore, MockBearerAuthenticator, MockGitHubApi};
use personal_agent_bridge::{
	models::{DispatchOutcome, RepositoryRef, SecretString, WorkflowDispatch},
	repositories::RepositoryError,
	services::{
		dispatcher::{BridgeError, InputSigner, ScopeBoundDispatcher, Stage},
		github::GitHubError,
		unsealer::HolderKey,
	},
	utils::{
		constants::{AGENT_CONFIG_PATH, AGENT_WORKFLOW_ID},
		tests::{test_holder_key, ActualRepositoryBuilder, CredentialBuilder, TriggerEventBuilder},
	},
};
use serde_json::json;
use std::{
	sync::{Arc, Mutex},
	time::Duration,
};

const SIGNING_SECRET: &str = "bridge-signing-secret";

type TestDispatcher = ScopeBoundDispatcher<MockAgentConfigStore, MockGitHubApi, MockBearerAuthenticator>;

fn create_dispatcher(
	store: MockAgentConfigStore,
	api: MockGitHubApi,
	authenticator: MockBearerAuthenticator,
) -> TestDispatcher {
	ScopeBoundDispatcher::new(
		store,
		api,
		authenticator,
		Arc::new(test_holder_key()),
		InputSigner::new(Some(&SecretString::from(SIGNING_SECRET))),
		Duration::from_secs(5),
	)
}

fn store_returning(config: Option<Vec<u8>>) -> MockAgentConfigStore {
	let mut store = MockAgentConfigStore::new();
	store
		.expect_get_file()
		.times(1)
		.returning(move |_, _| Ok(config.clone()));
	store
}

fn passthrough_authenticator() -> MockBearerAuthenticator {
	let mut authenticator = MockBearerAuthenticator::new();
	authenticator
		.expect_bearer_token()
		.returning(|_, credential| Ok(credential.secret().clone()));
	authenticator
}

fn unused_authenticator() -> MockBearerAuthenticator {
	let mut authenticator = MockBearerAuthenticator::new();
	authenticator.expect_bearer_token().never();
	authenticator
}

fn unused_api() -> MockGitHubApi {
	let mut api = MockGitHubApi::new();
	api.expect_get_repository().never();
	api.expect_create_workflow_dispatch().never();
	api
}

#[tokio::test]
async fn test_owner_mention_dispatches_agent_workflow() {
	let holder = test_holder_key();
	let mut store = MockAgentConfigStore::new();
	store
		.expect_get_file()
		.withf(|repository, path| {
			*repository == RepositoryRef::new("alice", "personal-agent") && path == AGENT_CONFIG_PATH
		})
		.times(1)
		.returning(move |_, _| Ok(Some(CredentialBuilder::new().config_yaml_for(&holder))));

	let captured: Arc<Mutex<Option<WorkflowDispatch>>> = Arc::new(Mutex::new(None));
	let captured_clone = captured.clone();
	let mut api = MockGitHubApi::new();
	api.expect_get_repository()
		.withf(|repository, token| {
			*repository == RepositoryRef::new("alice", "personal-agent")
				&& token.as_str() == "ghp_test_owner_token"
		})
		.times(1)
		.returning(|_, _| Ok(ActualRepositoryBuilder::new().build()));
	api.expect_create_workflow_dispatch()
		.withf(|repository, workflow_id, _, token| {
			*repository == RepositoryRef::new("alice", "personal-agent")
				&& workflow_id == AGENT_WORKFLOW_ID
				&& token.as_str() == "ghp_test_owner_token"
		})
		.times(1)
		.returning(move |_, _, dispatch, _| {
			*captured_clone.lock().unwrap() = Some(dispatch.clone());
			Ok(())
		});

	let dispatcher = create_dispatcher(store, api, passthrough_authenticator());
	let event = TriggerEventBuilder::new()
		.settings(json!({ "model": "small" }))
		.build();

	let outcome = dispatcher.run(&event).await.unwrap();
	let state_id = match outcome {
		DispatchOutcome::Dispatched { target, state_id } => {
			assert_eq!(target.as_str(), "alice");
			state_id
		}
		other => panic!("expected dispatch, got {:?}", other),
	};

	let dispatch = captured.lock().unwrap().take().unwrap();
	assert_eq!(dispatch.git_ref, "main");
	let inputs = &dispatch.inputs;
	assert_eq!(inputs["stateId"], state_id.to_string());
	assert_eq!(inputs["eventName"], "issue_comment.created");
	assert_eq!(inputs["authToken"], "ghp_test_owner_token");
	assert_eq!(inputs["command"], "null");
	assert_eq!(inputs["ref"], "main");
	assert_eq!(
		serde_json::from_str::<serde_json::Value>(&inputs["settings"]).unwrap(),
		json!({ "model": "small" })
	);
	let payload: serde_json::Value = serde_json::from_str(&inputs["eventPayload"]).unwrap();
	assert_eq!(payload["comment"]["body"], "@alice run report");
	assert!(InputSigner::new(Some(&SecretString::from(SIGNING_SECRET))).verify(inputs));
}

#[tokio::test]
async fn test_repository_claim_must_match() {
	let holder = test_holder_key();
	let config = CredentialBuilder::new()
		.repository_id(1001)
		.config_yaml_for(&holder);

	let mut api = MockGitHubApi::new();
	api.expect_get_repository()
		.times(1)
		.returning(|_, _| Ok(ActualRepositoryBuilder::new().repository_id(1001).build()));
	api.expect_create_workflow_dispatch()
		.times(1)
		.returning(|_, _, _, _| Ok(()));
	let dispatcher = create_dispatcher(
		store_returning(Some(config.clone())),
		api,
		passthrough_authenticator(),
	);
	let outcome = dispatcher.run(&TriggerEventBuilder::new().build()).await.unwrap();
	assert!(matches!(outcome, DispatchOutcome::Dispatched { .. }));

	let mut api = MockGitHubApi::new();
	api.expect_get_repository()
		.times(1)
		.returning(|_, _| Ok(ActualRepositoryBuilder::new().repository_id(2002).build()));
	api.expect_create_workflow_dispatch().never();
	let dispatcher = create_dispatcher(store_returning(Some(config)), api, passthrough_authenticator());

	match dispatcher.run(&TriggerEventBuilder::new().build()).await {
		Err(BridgeError::ScopeViolation { mismatch, .. }) => {
			assert_eq!(mismatch.allowed_repository_id, Some(1001));
			assert_eq!(mismatch.actual_repository_id, 2002);
		}
		other => panic!("expected scope violation, got {:?}", other),
	}
}

#[tokio::test]
async fn test_foreign_organization_is_a_scope_violation() {
	let holder = test_holder_key();
	let config = CredentialBuilder::new()
		.organization_id(42)
		.config_yaml_for(&holder);

	let mut api = MockGitHubApi::new();
	api.expect_get_repository()
		.times(1)
		.returning(|_, _| Ok(ActualRepositoryBuilder::new().organization(99, "alice").build()));
	api.expect_create_workflow_dispatch().never();

	let dispatcher = create_dispatcher(store_returning(Some(config)), api, passthrough_authenticator());
	let result = dispatcher.run(&TriggerEventBuilder::new().build()).await;

	match result {
		Err(BridgeError::ScopeViolation { mismatch, context }) => {
			assert_eq!(mismatch.allowed_organization_id, 42);
			assert_eq!(mismatch.actual_organization_id, 99);
			assert_eq!(mismatch.repository_name, "alice/personal-agent");
			assert!(!context.to_string().contains("ghp_test_owner_token"));
		}
		other => panic!("expected scope violation, got {:?}", other),
	}
}

#[tokio::test]
async fn test_comment_without_mention_is_ignored() {
	let mut store = MockAgentConfigStore::new();
	store.expect_get_file().never();
	let dispatcher = create_dispatcher(store, unused_api(), unused_authenticator());

	for body in ["hello everyone", "thanks @alice", ""] {
		let event = TriggerEventBuilder::new().body(body).build();
		assert_eq!(dispatcher.run(&event).await.unwrap(), DispatchOutcome::Ignored);
	}

	let event = TriggerEventBuilder::new().null_body().build();
	assert_eq!(dispatcher.run(&event).await.unwrap(), DispatchOutcome::Ignored);
}

#[tokio::test]
async fn test_unsupported_event_is_ignored() {
	let mut store = MockAgentConfigStore::new();
	store.expect_get_file().never();
	let dispatcher = create_dispatcher(store, unused_api(), unused_authenticator());

	let event = TriggerEventBuilder::new()
		.event_name("issue_comment.edited")
		.build();
	assert_eq!(dispatcher.run(&event).await.unwrap(), DispatchOutcome::Ignored);
}

#[tokio::test]
async fn test_owner_without_config_is_not_bridgeable() {
	let mut store = MockAgentConfigStore::new();
	store
		.expect_get_file()
		.withf(|repository, _| *repository == RepositoryRef::new("bob", "personal-agent"))
		.times(1)
		.returning(|_, _| Ok(None));
	let dispatcher = create_dispatcher(store, unused_api(), unused_authenticator());

	let event = TriggerEventBuilder::new().body("@Bob summarize").build();
	match dispatcher.run(&event).await.unwrap() {
		DispatchOutcome::NotBridgeable { target, reason } => {
			assert_eq!(target.as_str(), "bob");
			assert!(reason.contains("bob/personal-agent"));
		}
		other => panic!("expected not bridgeable, got {:?}", other),
	}
}

#[tokio::test]
async fn test_unreadable_or_malformed_config_is_not_bridgeable() {
	let dispatcher = create_dispatcher(
		store_returning(Some(b"GITHUB_PAT_ENCRYPTED: 12".to_vec())),
		unused_api(),
		unused_authenticator(),
	);
	let outcome = dispatcher.run(&TriggerEventBuilder::new().build()).await.unwrap();
	assert!(matches!(outcome, DispatchOutcome::NotBridgeable { .. }));

	let dispatcher = create_dispatcher(
		store_returning(Some(b"other_key: value".to_vec())),
		unused_api(),
		unused_authenticator(),
	);
	let outcome = dispatcher.run(&TriggerEventBuilder::new().build()).await.unwrap();
	assert!(matches!(outcome, DispatchOutcome::NotBridgeable { .. }));

	let mut store = MockAgentConfigStore::new();
	store
		.expect_get_file()
		.times(1)
		.returning(|_, _| Err(RepositoryError::load_error("status 500", None, None)));
	let dispatcher = create_dispatcher(store, unused_api(), unused_authenticator());
	let outcome = dispatcher.run(&TriggerEventBuilder::new().build()).await.unwrap();
	assert!(matches!(outcome, DispatchOutcome::NotBridgeable { .. }));
}

#[tokio::test]
async fn test_bare_at_sign_is_malformed() {
	let mut store = MockAgentConfigStore::new();
	store.expect_get_file().never();
	let dispatcher = create_dispatcher(store, unused_api(), unused_authenticator());

	let event = TriggerEventBuilder::new().body("@ hi").build();
	let result = dispatcher.run(&event).await;
	assert!(matches!(result, Err(BridgeError::MalformedTrigger(_))));
}

#[tokio::test]
async fn test_runs_get_distinct_state_ids() {
	let holder = test_holder_key();
	let mut store = MockAgentConfigStore::new();
	store
		.expect_get_file()
		.times(2)
		.returning(move |_, _| Ok(Some(CredentialBuilder::new().config_yaml_for(&holder))));
	let mut api = MockGitHubApi::new();
	api.expect_get_repository()
		.times(2)
		.returning(|_, _| Ok(ActualRepositoryBuilder::new().build()));
	api.expect_create_workflow_dispatch()
		.times(2)
		.returning(|_, _, _, _| Ok(()));
	let dispatcher = create_dispatcher(store, api, passthrough_authenticator());

	let event = TriggerEventBuilder::new().build();
	let first = dispatcher.run(&event).await.unwrap();
	let second = dispatcher.run(&event).await.unwrap();

	match (first, second) {
		(
			DispatchOutcome::Dispatched { state_id: a, .. },
			DispatchOutcome::Dispatched { state_id: b, .. },
		) => assert_ne!(a, b),
		other => panic!("expected two dispatches, got {:?}", other),
	}
}

#[tokio::test]
async fn test_credential_sealed_for_another_holder() {
	let other_holder = HolderKey::from_bytes(&[7u8; 32]).unwrap();
	let config = CredentialBuilder::new().config_yaml_for(&other_holder);
	let dispatcher = create_dispatcher(
		store_returning(Some(config)),
		unused_api(),
		unused_authenticator(),
	);

	let result = dispatcher.run(&TriggerEventBuilder::new().build()).await;
	match result {
		Err(e @ BridgeError::AuthenticationFailed(_)) => {
			assert_eq!(e.stage(), Some("unseal"));
		}
		other => panic!("expected authentication failure, got {:?}", other),
	}
}

#[tokio::test]
async fn test_empty_sealed_credential() {
	let dispatcher = create_dispatcher(
		store_returning(Some(b"GITHUB_PAT_ENCRYPTED: ''".to_vec())),
		unused_api(),
		unused_authenticator(),
	);

	let result = dispatcher.run(&TriggerEventBuilder::new().build()).await;
	assert!(matches!(result, Err(BridgeError::EmptyCiphertext(_))));
}

#[tokio::test]
async fn test_inaccessible_agent_repository() {
	let holder = test_holder_key();
	let config = CredentialBuilder::new().config_yaml_for(&holder);

	let mut api = MockGitHubApi::new();
	api.expect_get_repository()
		.times(1)
		.returning(|_, _| Err(GitHubError::not_found("Not Found", None, None)));
	api.expect_create_workflow_dispatch().never();
	let dispatcher = create_dispatcher(
		store_returning(Some(config.clone())),
		api,
		passthrough_authenticator(),
	);
	let result = dispatcher.run(&TriggerEventBuilder::new().build()).await;
	assert!(matches!(result, Err(BridgeError::TargetRepositoryNotFound(_))));

	let mut authenticator = MockBearerAuthenticator::new();
	authenticator
		.expect_bearer_token()
		.times(1)
		.returning(|_, _| Err(GitHubError::access_denied("Forbidden", None, None)));
	let dispatcher = create_dispatcher(store_returning(Some(config)), unused_api(), authenticator);
	let result = dispatcher.run(&TriggerEventBuilder::new().build()).await;
	match result {
		Err(e @ BridgeError::TargetRepositoryNotFound(_)) => {
			assert_eq!(e.stage(), Some("authenticate"));
		}
		other => panic!("expected repository not found, got {:?}", other),
	}
}

#[tokio::test]
async fn test_transport_failures_carry_their_stage() {
	let holder = test_holder_key();
	let config = CredentialBuilder::new().config_yaml_for(&holder);

	let mut api = MockGitHubApi::new();
	api.expect_get_repository()
		.times(1)
		.returning(|_, _| Err(GitHubError::request_error("status 502", None, None)));
	api.expect_create_workflow_dispatch().never();
	let dispatcher = create_dispatcher(
		store_returning(Some(config.clone())),
		api,
		passthrough_authenticator(),
	);
	let result = dispatcher.run(&TriggerEventBuilder::new().build()).await;
	assert!(matches!(
		result,
		Err(BridgeError::DispatchTransportError {
			stage: Stage::ResolveRepository,
			..
		})
	));

	let mut api = MockGitHubApi::new();
	api.expect_get_repository()
		.times(1)
		.returning(|_, _| Ok(ActualRepositoryBuilder::new().build()));
	api.expect_create_workflow_dispatch()
		.times(1)
		.returning(|_, _, _, _| Err(GitHubError::request_error("status 422", None, None)));
	let dispatcher = create_dispatcher(store_returning(Some(config)), api, passthrough_authenticator());
	let result = dispatcher.run(&TriggerEventBuilder::new().build()).await;
	match result {
		Err(e @ BridgeError::DispatchTransportError { .. }) => {
			assert_eq!(e.stage(), Some("dispatch"));
			assert!(!e.to_string().contains("ghp_test_owner_token"));
		}
		other => panic!("expected transport error, got {:?}", other),
	}
}
