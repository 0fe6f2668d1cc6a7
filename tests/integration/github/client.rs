//! Integration tests for the GitHub REST client.
//!
//! Uses a local mockito server in place of the GitHub API.

use mockito::Matcher;
use personal_agent_bridge::{
	models::{RepositoryRef, SecretString, WorkflowDispatch},
	repositories::{ConfigStore, RepositoryError},
	services::github::{GitHubClient, GitHubError, RepositoryApi},
	utils::{
		constants::{AGENT_CONFIG_PATH, AGENT_WORKFLOW_ID},
		tests::{create_test_github_http_client, ActualRepositoryBuilder},
	},
};
use serde_json::json;
use std::collections::BTreeMap;
use url::Url;

fn create_client(server: &mockito::ServerGuard, reader_token: Option<&str>) -> GitHubClient {
	GitHubClient::new(
		create_test_github_http_client(),
		&Url::parse(&server.url()).unwrap(),
		reader_token.map(SecretString::from),
	)
}

fn agent_repository() -> RepositoryRef {
	RepositoryRef::new("alice", "personal-agent")
}

#[tokio::test]
async fn test_get_repository() {
	let mut server = mockito::Server::new_async().await;
	let expected = ActualRepositoryBuilder::new()
		.organization(42, "alice")
		.repository_id(1001)
		.default_branch("trunk");
	let mock = server
		.mock("GET", "/repos/alice/personal-agent")
		.match_header("authorization", "Bearer ghp_owner")
		.match_header("accept", "application/vnd.github+json")
		.match_header("x-github-api-version", "2022-11-28")
		.with_status(200)
		.with_header("content-type", "application/json")
		.with_body(expected.api_response().to_string())
		.create_async()
		.await;

	let client = create_client(&server, None);
	let actual = client
		.get_repository(&agent_repository(), &SecretString::from("ghp_owner"))
		.await
		.unwrap();

	assert_eq!(actual, expected.build());
	mock.assert_async().await;
}

#[tokio::test]
async fn test_get_repository_status_mapping() {
	let mut server = mockito::Server::new_async().await;
	let client = create_client(&server, None);
	let token = SecretString::from("ghp_owner");

	for (status, check) in [
		(404, (|e: &GitHubError| matches!(e, GitHubError::NotFound(_))) as fn(&GitHubError) -> bool),
		(401, |e: &GitHubError| matches!(e, GitHubError::AccessDenied(_))),
		(403, |e: &GitHubError| matches!(e, GitHubError::AccessDenied(_))),
		(422, |e: &GitHubError| matches!(e, GitHubError::RequestError(_))),
	] {
		let mock = server
			.mock("GET", "/repos/alice/personal-agent")
			.with_status(status)
			.create_async()
			.await;

		let err = client
			.get_repository(&agent_repository(), &token)
			.await
			.unwrap_err();
		assert!(check(&err), "unexpected error for status {}: {:?}", status, err);
		assert!(!err.to_string().contains("ghp_owner"));

		mock.remove_async().await;
	}
}

#[tokio::test]
async fn test_get_repository_invalid_body() {
	let mut server = mockito::Server::new_async().await;
	let mock = server
		.mock("GET", "/repos/alice/personal-agent")
		.with_status(200)
		.with_body("{\"id\": \"not a number\"}")
		.create_async()
		.await;

	let client = create_client(&server, None);
	let err = client
		.get_repository(&agent_repository(), &SecretString::from("ghp_owner"))
		.await
		.unwrap_err();

	assert!(matches!(err, GitHubError::ResponseError(_)));
	mock.assert_async().await;
}

#[tokio::test]
async fn test_create_workflow_dispatch() {
	let mut server = mockito::Server::new_async().await;
	let mock = server
		.mock(
			"POST",
			"/repos/alice/personal-agent/actions/workflows/compute.yml/dispatches",
		)
		.match_header("authorization", "Bearer ghp_owner")
		.match_body(Matcher::Json(json!({
			"ref": "main",
			"inputs": { "stateId": "abc", "command": "null" }
		})))
		.with_status(204)
		.create_async()
		.await;

	let dispatch = WorkflowDispatch {
		git_ref: "main".to_string(),
		inputs: BTreeMap::from([
			("stateId".to_string(), "abc".to_string()),
			("command".to_string(), "null".to_string()),
		]),
	};

	let client = create_client(&server, None);
	client
		.create_workflow_dispatch(
			&agent_repository(),
			AGENT_WORKFLOW_ID,
			&dispatch,
			&SecretString::from("ghp_owner"),
		)
		.await
		.unwrap();

	mock.assert_async().await;
}

#[tokio::test]
async fn test_create_workflow_dispatch_rejected() {
	let mut server = mockito::Server::new_async().await;
	let mock = server
		.mock(
			"POST",
			"/repos/alice/personal-agent/actions/workflows/compute.yml/dispatches",
		)
		.with_status(422)
		.with_body("{\"message\": \"Unexpected inputs provided\"}")
		.create_async()
		.await;

	let dispatch = WorkflowDispatch {
		git_ref: "main".to_string(),
		inputs: BTreeMap::new(),
	};
	let client = create_client(&server, None);
	let err = client
		.create_workflow_dispatch(
			&agent_repository(),
			AGENT_WORKFLOW_ID,
			&dispatch,
			&SecretString::from("ghp_owner"),
		)
		.await
		.unwrap_err();

	assert!(matches!(err, GitHubError::RequestError(_)));
	mock.assert_async().await;
}

#[tokio::test]
async fn test_get_file_returns_raw_content() {
	let mut server = mockito::Server::new_async().await;
	let mock = server
		.mock(
			"GET",
			"/repos/alice/personal-agent/contents/.github/personal-agent.config.yml",
		)
		.match_header("accept", "application/vnd.github.raw+json")
		.match_header("authorization", "Bearer ghs_reader")
		.with_status(200)
		.with_body("GITHUB_PAT_ENCRYPTED: abc\n")
		.create_async()
		.await;

	let client = create_client(&server, Some("ghs_reader"));
	let content = client
		.get_file(&agent_repository(), AGENT_CONFIG_PATH)
		.await
		.unwrap();

	assert_eq!(content, Some(b"GITHUB_PAT_ENCRYPTED: abc\n".to_vec()));
	mock.assert_async().await;
}

#[tokio::test]
async fn test_get_file_without_reader_token_is_anonymous() {
	let mut server = mockito::Server::new_async().await;
	let mock = server
		.mock(
			"GET",
			"/repos/alice/personal-agent/contents/.github/personal-agent.config.yml",
		)
		.match_header("authorization", Matcher::Missing)
		.with_status(404)
		.create_async()
		.await;

	let client = create_client(&server, None);
	let content = client
		.get_file(&agent_repository(), AGENT_CONFIG_PATH)
		.await
		.unwrap();

	assert_eq!(content, None);
	mock.assert_async().await;
}

#[tokio::test]
async fn test_get_file_errors() {
	let mut server = mockito::Server::new_async().await;
	let client = create_client(&server, None);

	let mock = server
		.mock(
			"GET",
			"/repos/alice/personal-agent/contents/.github/personal-agent.config.yml",
		)
		.with_status(403)
		.create_async()
		.await;
	let err = client
		.get_file(&agent_repository(), AGENT_CONFIG_PATH)
		.await
		.unwrap_err();
	assert!(matches!(err, RepositoryError::AccessDenied(_)));
	mock.remove_async().await;

	let mock = server
		.mock(
			"GET",
			"/repos/alice/personal-agent/contents/.github/personal-agent.config.yml",
		)
		.with_status(500)
		.create_async()
		.await;
	let err = client
		.get_file(&agent_repository(), AGENT_CONFIG_PATH)
		.await
		.unwrap_err();
	assert!(matches!(err, RepositoryError::LoadError(_)));
	assert!(err.to_string().contains("status=500"));
	mock.remove_async().await;
}

#[tokio::test]
async fn test_base_url_with_path_prefix() {
	let mut server = mockito::Server::new_async().await;
	let mock = server
		.mock("GET", "/api/v3/repos/alice/personal-agent")
		.with_status(200)
		.with_body(ActualRepositoryBuilder::new().api_response().to_string())
		.create_async()
		.await;

	let client = GitHubClient::new(
		create_test_github_http_client(),
		&Url::parse(&format!("{}/api/v3/", server.url())).unwrap(),
		None,
	);
	client
		.get_repository(&agent_repository(), &SecretString::from("ghp_owner"))
		.await
		.unwrap();

	mock.assert_async().await;
}
