//! Integration tests for loading owner configurations over the GitHub contents API.

use personal_agent_bridge::{
	models::{ConfigError, TargetIdentifier},
	repositories::{AgentConfigRepository, ConfigLookup},
	services::{github::GitHubClient, unsealer::unseal},
	utils::tests::{create_test_github_http_client, test_holder_key, CredentialBuilder},
};
use url::Url;

const CONFIG_PATH: &str = "/repos/alice/personal-agent/contents/.github/personal-agent.config.yml";

fn create_repository(server: &mockito::ServerGuard) -> AgentConfigRepository<GitHubClient> {
	AgentConfigRepository::new(GitHubClient::new(
		create_test_github_http_client(),
		&Url::parse(&server.url()).unwrap(),
		None,
	))
}

fn alice() -> TargetIdentifier {
	TargetIdentifier::parse("Alice").unwrap()
}

#[tokio::test]
async fn test_load_sealed_credential() {
	let holder = test_holder_key();
	let config = CredentialBuilder::new()
		.organization_id(42)
		.repository_id(1001)
		.config_yaml_for(&holder);

	let mut server = mockito::Server::new_async().await;
	let mock = server
		.mock("GET", CONFIG_PATH)
		.with_status(200)
		.with_body(config)
		.create_async()
		.await;

	let repository = create_repository(&server);
	match repository.load(&alice()).await {
		ConfigLookup::Found(record) => {
			let credential = unseal(record.ciphertext(), &holder).unwrap();
			assert_eq!(credential.allowed_organization_id(), 42);
			assert_eq!(credential.allowed_repository_id(), Some(1001));
		}
		other => panic!("expected a sealed credential, got {:?}", other),
	}
	mock.assert_async().await;
}

#[tokio::test]
async fn test_missing_or_unreadable_config_is_absent() {
	let mut server = mockito::Server::new_async().await;
	let repository = create_repository(&server);

	for status in [404, 403, 500] {
		let mock = server
			.mock("GET", CONFIG_PATH)
			.with_status(status)
			.create_async()
			.await;

		assert!(matches!(repository.load(&alice()).await, ConfigLookup::Absent));
		assert_eq!(repository.fetch_config(&alice()).await, None);
		mock.remove_async().await;
	}
}

#[tokio::test]
async fn test_malformed_config() {
	let mut server = mockito::Server::new_async().await;
	let repository = create_repository(&server);

	for (body, expect_validation) in [
		("GITHUB_PAT_ENCRYPTED: \"not base64!\"", true),
		("- just\n- a list", true),
		("GITHUB_PAT_ENCRYPTED: [unterminated", false),
	] {
		let mock = server
			.mock("GET", CONFIG_PATH)
			.with_status(200)
			.with_body(body)
			.create_async()
			.await;

		match repository.load(&alice()).await {
			ConfigLookup::Malformed(ConfigError::ValidationError(_)) => assert!(expect_validation),
			ConfigLookup::Malformed(ConfigError::ParseError(_)) => assert!(!expect_validation),
			other => panic!("expected malformed config for {:?}, got {:?}", body, other),
		}
		mock.remove_async().await;
	}
}
