//! GitHub REST client.
//!
//! One client serves three purposes: reading owner configuration files, resolving the
//! agent repository and creating workflow dispatches. Transport retries come from the
//! middleware client; status codes are mapped to typed errors here.

use async_trait::async_trait;
use reqwest::{
	header::{ACCEPT, AUTHORIZATION},
	Method, StatusCode,
};
use reqwest_middleware::{ClientWithMiddleware, RequestBuilder};
use serde::Deserialize;
use std::{collections::HashMap, sync::Arc};
use url::Url;

use crate::{
	models::{ActualRepository, RepositoryRef, SecretString, WorkflowDispatch},
	repositories::{ConfigStore, RepositoryError},
	services::github::error::GitHubError,
	utils::constants::GITHUB_API_VERSION,
};

const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw+json";

/// Repository operations the dispatcher needs
#[async_trait]
pub trait RepositoryApi: Send + Sync {
	/// Resolves `repository` as seen with `token`
	async fn get_repository(
		&self,
		repository: &RepositoryRef,
		token: &SecretString,
	) -> Result<ActualRepository, GitHubError>;

	/// Triggers `workflow_id` in `repository`
	async fn create_workflow_dispatch(
		&self,
		repository: &RepositoryRef,
		workflow_id: &str,
		dispatch: &WorkflowDispatch,
		token: &SecretString,
	) -> Result<(), GitHubError>;
}

#[async_trait]
impl<T: RepositoryApi + ?Sized> RepositoryApi for Arc<T> {
	async fn get_repository(
		&self,
		repository: &RepositoryRef,
		token: &SecretString,
	) -> Result<ActualRepository, GitHubError> {
		(**self).get_repository(repository, token).await
	}

	async fn create_workflow_dispatch(
		&self,
		repository: &RepositoryRef,
		workflow_id: &str,
		dispatch: &WorkflowDispatch,
		token: &SecretString,
	) -> Result<(), GitHubError> {
		(**self)
			.create_workflow_dispatch(repository, workflow_id, dispatch, token)
			.await
	}
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
	id: u64,
	login: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryResponse {
	id: u64,
	name: String,
	default_branch: String,
	owner: AccountResponse,
}

#[derive(Debug, Deserialize)]
struct InstallationResponse {
	id: u64,
}

#[derive(Deserialize)]
struct InstallationTokenResponse {
	token: String,
}

/// Client for the GitHub REST API
#[derive(Clone)]
pub struct GitHubClient {
	http: Arc<ClientWithMiddleware>,
	base_url: String,
	reader_token: Option<SecretString>,
}

fn status_metadata(repository: Option<&RepositoryRef>, status: StatusCode) -> HashMap<String, String> {
	let mut metadata = HashMap::from([("status".to_string(), status.as_u16().to_string())]);
	if let Some(repository) = repository {
		metadata.insert("repository".to_string(), repository.to_string());
	}
	metadata
}

fn error_for_status(
	action: &str,
	repository: Option<&RepositoryRef>,
	status: StatusCode,
) -> GitHubError {
	let metadata = Some(status_metadata(repository, status));
	match status {
		StatusCode::NOT_FOUND => GitHubError::not_found(format!("{}: not found", action), None, metadata),
		StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
			GitHubError::access_denied(format!("{}: access denied", action), None, metadata)
		}
		_ => GitHubError::request_error(
			format!("{}: unexpected status", action),
			None,
			metadata,
		),
	}
}

impl GitHubClient {
	/// Creates a client for the API rooted at `base_url`.
	///
	/// `reader_token` authenticates configuration reads only; other calls carry the
	/// token passed to them.
	pub fn new(
		http: Arc<ClientWithMiddleware>,
		base_url: &Url,
		reader_token: Option<SecretString>,
	) -> Self {
		Self {
			http,
			base_url: base_url.as_str().trim_end_matches('/').to_string(),
			reader_token,
		}
	}

	fn repository_url(&self, repository: &RepositoryRef) -> String {
		format!(
			"{}/repos/{}/{}",
			self.base_url,
			urlencoding::encode(&repository.owner),
			urlencoding::encode(&repository.name)
		)
	}

	fn request(
		&self,
		method: Method,
		url: &str,
		media_type: &str,
		token: Option<&SecretString>,
	) -> RequestBuilder {
		let builder = self
			.http
			.request(method, url)
			.header(ACCEPT, media_type)
			.header("X-GitHub-Api-Version", GITHUB_API_VERSION);
		match token {
			Some(token) => builder.header(AUTHORIZATION, format!("Bearer {}", token.as_str())),
			None => builder,
		}
	}

	async fn send(
		&self,
		action: &str,
		builder: RequestBuilder,
	) -> Result<reqwest::Response, GitHubError> {
		builder.send().await.map_err(|e| {
			GitHubError::request_error(format!("{}: request failed", action), Some(Box::new(e)), None)
		})
	}

	/// Looks up the app installation covering `repository`, authenticated as the app.
	pub async fn get_repository_installation(
		&self,
		repository: &RepositoryRef,
		app_jwt: &SecretString,
	) -> Result<u64, GitHubError> {
		const ACTION: &str = "Resolve app installation";
		let url = format!("{}/installation", self.repository_url(repository));
		let response = self
			.send(
				ACTION,
				self.request(Method::GET, &url, JSON_MEDIA_TYPE, Some(app_jwt)),
			)
			.await?;

		let status = response.status();
		if !status.is_success() {
			return Err(error_for_status(ACTION, Some(repository), status));
		}

		let installation: InstallationResponse = response.json().await.map_err(|e| {
			GitHubError::response_error(
				format!("{}: invalid response", ACTION),
				Some(Box::new(e)),
				None,
			)
		})?;
		Ok(installation.id)
	}

	/// Mints an installation token restricted to `repository`.
	pub async fn create_installation_token(
		&self,
		installation_id: u64,
		repository: &RepositoryRef,
		app_jwt: &SecretString,
	) -> Result<SecretString, GitHubError> {
		const ACTION: &str = "Create installation token";
		let url = format!(
			"{}/app/installations/{}/access_tokens",
			self.base_url, installation_id
		);
		let body = serde_json::json!({ "repositories": [repository.name] });
		let response = self
			.send(
				ACTION,
				self.request(Method::POST, &url, JSON_MEDIA_TYPE, Some(app_jwt))
					.json(&body),
			)
			.await?;

		let status = response.status();
		if !status.is_success() {
			return Err(error_for_status(ACTION, Some(repository), status));
		}

		let token: InstallationTokenResponse = response.json().await.map_err(|e| {
			GitHubError::response_error(
				format!("{}: invalid response", ACTION),
				Some(Box::new(e)),
				None,
			)
		})?;
		Ok(SecretString::new(token.token))
	}
}

#[async_trait]
impl RepositoryApi for GitHubClient {
	async fn get_repository(
		&self,
		repository: &RepositoryRef,
		token: &SecretString,
	) -> Result<ActualRepository, GitHubError> {
		const ACTION: &str = "Resolve repository";
		let url = self.repository_url(repository);
		let response = self
			.send(
				ACTION,
				self.request(Method::GET, &url, JSON_MEDIA_TYPE, Some(token)),
			)
			.await?;

		let status = response.status();
		if !status.is_success() {
			return Err(error_for_status(ACTION, Some(repository), status));
		}

		let body: RepositoryResponse = response.json().await.map_err(|e| {
			GitHubError::response_error(
				format!("{}: invalid response", ACTION),
				Some(Box::new(e)),
				Some(HashMap::from([(
					"repository".to_string(),
					repository.to_string(),
				)])),
			)
		})?;

		Ok(ActualRepository {
			organization_id: body.owner.id,
			organization_login: body.owner.login,
			repository_id: body.id,
			repository_name: body.name,
			default_branch: body.default_branch,
		})
	}

	async fn create_workflow_dispatch(
		&self,
		repository: &RepositoryRef,
		workflow_id: &str,
		dispatch: &WorkflowDispatch,
		token: &SecretString,
	) -> Result<(), GitHubError> {
		const ACTION: &str = "Create workflow dispatch";
		let url = format!(
			"{}/actions/workflows/{}/dispatches",
			self.repository_url(repository),
			urlencoding::encode(workflow_id)
		);
		let response = self
			.send(
				ACTION,
				self.request(Method::POST, &url, JSON_MEDIA_TYPE, Some(token))
					.json(dispatch),
			)
			.await?;

		let status = response.status();
		if !status.is_success() {
			return Err(error_for_status(ACTION, Some(repository), status));
		}
		Ok(())
	}
}

#[async_trait]
impl ConfigStore for GitHubClient {
	async fn get_file(
		&self,
		repository: &RepositoryRef,
		path: &str,
	) -> Result<Option<Vec<u8>>, RepositoryError> {
		let encoded_path = path
			.split('/')
			.map(|segment| urlencoding::encode(segment).into_owned())
			.collect::<Vec<_>>()
			.join("/");
		let url = format!("{}/contents/{}", self.repository_url(repository), encoded_path);
		let metadata = HashMap::from([
			("repository".to_string(), repository.to_string()),
			("path".to_string(), path.to_string()),
		]);

		let response = self
			.request(Method::GET, &url, RAW_MEDIA_TYPE, self.reader_token.as_ref())
			.send()
			.await
			.map_err(|e| {
				RepositoryError::load_error(
					"Failed to request configuration file",
					Some(Box::new(e)),
					Some(metadata.clone()),
				)
			})?;

		let status = response.status();
		match status {
			StatusCode::NOT_FOUND => Ok(None),
			StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
				Err(RepositoryError::access_denied(
					"Access to configuration file denied",
					None,
					Some(metadata),
				))
			}
			status if status.is_success() => {
				let bytes = response.bytes().await.map_err(|e| {
					RepositoryError::load_error(
						"Failed to read configuration file",
						Some(Box::new(e)),
						Some(metadata.clone()),
					)
				})?;
				Ok(Some(bytes.to_vec()))
			}
			status => {
				let mut metadata = metadata;
				metadata.insert("status".to_string(), status.as_u16().to_string());
				Err(RepositoryError::load_error(
					"Unexpected status reading configuration file",
					None,
					Some(metadata),
				))
			}
		}
	}
}
