//! Scope-bound dispatcher.
//!
//! Runs one event through the bridge: resolve the mentioned owner, read their
//! configuration, open their credential, resolve their agent repository, check the
//! credential's scope against it and dispatch the workflow. Stages run strictly in order
//! and never retry; retries belong to the HTTP transport.

use std::{future::Future, sync::Arc, time::Duration};
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

use crate::{
	models::{DispatchOutcome, TargetIdentifier, TriggerEvent},
	repositories::{agent_repository_of, AgentConfigRepository, ConfigLookup, ConfigStore},
	services::{
		dispatcher::{
			error::{BridgeError, Stage},
			request::DispatchRequest,
			scope::validate_scope,
			signer::InputSigner,
		},
		github::{Authenticator, GitHubError, RepositoryApi},
		resolver::{resolve_target, TargetResolution},
		unsealer::{unseal, HolderKey},
	},
	utils::constants::{AGENT_WORKFLOW_ID, SUPPORTED_EVENT_NAME},
};

/// Why a guarded stage did not produce a value
enum StageInterrupt {
	TimedOut,
	Cancelled,
}

/// Resolves when shutdown is requested; never if the sender is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
	if shutdown.wait_for(|stop| *stop).await.is_err() {
		std::future::pending::<()>().await;
	}
}

/// Drives bridge runs.
///
/// Holds no mutable state; one instance can serve concurrent runs.
pub struct ScopeBoundDispatcher<S: ConfigStore, R: RepositoryApi, A: Authenticator> {
	config_repository: AgentConfigRepository<S>,
	repository_api: R,
	authenticator: A,
	holder_key: Arc<HolderKey>,
	signer: InputSigner,
	stage_timeout: Duration,
}

impl<S: ConfigStore, R: RepositoryApi, A: Authenticator> ScopeBoundDispatcher<S, R, A> {
	pub fn new(
		config_store: S,
		repository_api: R,
		authenticator: A,
		holder_key: Arc<HolderKey>,
		signer: InputSigner,
		stage_timeout: Duration,
	) -> Self {
		Self {
			config_repository: AgentConfigRepository::new(config_store),
			repository_api,
			authenticator,
			holder_key,
			signer,
			stage_timeout,
		}
	}

	/// Processes one event without external cancellation.
	pub async fn run(&self, event: &TriggerEvent) -> Result<DispatchOutcome, BridgeError> {
		let (_shutdown_tx, shutdown_rx) = watch::channel(false);
		self.run_with_shutdown(event, shutdown_rx).await
	}

	/// Processes one event, abandoning it if shutdown is signalled before dispatch.
	pub async fn run_with_shutdown(
		&self,
		event: &TriggerEvent,
		mut shutdown: watch::Receiver<bool>,
	) -> Result<DispatchOutcome, BridgeError> {
		if event.event_name != SUPPORTED_EVENT_NAME {
			info!(event_name = %event.event_name, "Ignoring unsupported event");
			return Ok(DispatchOutcome::Ignored);
		}

		match resolve_target(&event.raw_text) {
			TargetResolution::Irrelevant => {
				info!(
					repository = %event.source_repository,
					"Ignoring comment without a leading mention"
				);
				Ok(DispatchOutcome::Ignored)
			}
			TargetResolution::Malformed => Err(BridgeError::malformed_trigger(
				"Comment starts with a mention but names no user",
				Some(
					[("repository".to_string(), event.source_repository.to_string())]
						.into_iter()
						.collect(),
				),
			)),
			TargetResolution::Target { target, .. } => {
				let result = self.process_target(event, target, &mut shutdown).await;
				if let Err(BridgeError::Cancelled { stage, .. }) = &result {
					warn!(stage = %stage, "Run cancelled by shutdown");
				}
				result
			}
		}
	}

	fn ensure_running(
		&self,
		shutdown: &watch::Receiver<bool>,
		stage: Stage,
	) -> Result<(), BridgeError> {
		if *shutdown.borrow() {
			return Err(BridgeError::cancelled(stage));
		}
		Ok(())
	}

	/// Bounds a non-final stage by the stage timeout and the shutdown signal.
	async fn guarded<F: Future>(
		&self,
		shutdown: &mut watch::Receiver<bool>,
		stage_future: F,
	) -> Result<F::Output, StageInterrupt> {
		tokio::select! {
			biased;
			_ = shutdown_requested(shutdown) => Err(StageInterrupt::Cancelled),
			result = tokio::time::timeout(self.stage_timeout, stage_future) => {
				result.map_err(|_| StageInterrupt::TimedOut)
			}
		}
	}

	fn remote_failure(&self, stage: Stage, target: &TargetIdentifier, err: GitHubError) -> BridgeError {
		let metadata = Some(
			[("target".to_string(), target.to_string())]
				.into_iter()
				.collect(),
		);
		if err.is_not_found_or_denied() {
			BridgeError::target_repository_not_found(
				stage,
				format!("Agent repository of {} is not accessible", target),
				Some(Box::new(err)),
				metadata,
			)
		} else {
			BridgeError::dispatch_transport_error(
				stage,
				format!("GitHub request failed during {}", stage),
				Some(Box::new(err)),
				metadata,
			)
		}
	}

	fn interrupted(&self, stage: Stage, interrupt: StageInterrupt) -> BridgeError {
		match interrupt {
			StageInterrupt::Cancelled => BridgeError::cancelled(stage),
			StageInterrupt::TimedOut => BridgeError::dispatch_transport_error(
				stage,
				format!("{} timed out after {:?}", stage, self.stage_timeout),
				None,
				None,
			),
		}
	}

	#[instrument(skip_all, fields(target = %target))]
	async fn process_target(
		&self,
		event: &TriggerEvent,
		target: TargetIdentifier,
		shutdown: &mut watch::Receiver<bool>,
	) -> Result<DispatchOutcome, BridgeError> {
		info!(
			source_owner = %event.source_owner,
			repository = %event.source_repository,
			"Comment addresses a personal agent"
		);
		let agent_repository = agent_repository_of(&target);

		self.ensure_running(shutdown, Stage::FetchConfig)?;
		let lookup = match self
			.guarded(shutdown, self.config_repository.load(&target))
			.await
		{
			Ok(lookup) => lookup,
			Err(StageInterrupt::TimedOut) => {
				warn!("Timed out reading agent configuration");
				ConfigLookup::Absent
			}
			Err(interrupt) => return Err(self.interrupted(Stage::FetchConfig, interrupt)),
		};
		let record = match lookup {
			ConfigLookup::Found(record) => record,
			ConfigLookup::Absent => {
				let reason = format!("No personal agent config found on {}", agent_repository);
				info!(reason = %reason, "Target is not bridgeable");
				return Ok(DispatchOutcome::NotBridgeable { target, reason });
			}
			ConfigLookup::Malformed(e) => {
				let reason = format!("Personal agent config on {} is malformed: {}", agent_repository, e);
				info!(reason = %reason, "Target is not bridgeable");
				return Ok(DispatchOutcome::NotBridgeable { target, reason });
			}
		};

		self.ensure_running(shutdown, Stage::Unseal)?;
		let credential = unseal(record.ciphertext(), &self.holder_key)?;

		self.ensure_running(shutdown, Stage::Authenticate)?;
		let bearer = match self
			.guarded(
				shutdown,
				self.authenticator.bearer_token(&agent_repository, &credential),
			)
			.await
		{
			Ok(Ok(token)) => token,
			Ok(Err(e)) => return Err(self.remote_failure(Stage::Authenticate, &target, e)),
			Err(interrupt) => return Err(self.interrupted(Stage::Authenticate, interrupt)),
		};

		self.ensure_running(shutdown, Stage::ResolveRepository)?;
		let actual = match self
			.guarded(
				shutdown,
				self.repository_api.get_repository(&agent_repository, &bearer),
			)
			.await
		{
			Ok(Ok(actual)) => actual,
			Ok(Err(e)) => return Err(self.remote_failure(Stage::ResolveRepository, &target, e)),
			Err(interrupt) => return Err(self.interrupted(Stage::ResolveRepository, interrupt)),
		};

		let grant = validate_scope(credential, actual).inspect_err(|_| {
			error!("Credential scope does not cover the agent repository");
		})?;
		let request = DispatchRequest::new(grant, event);
		let dispatch = request.to_workflow_dispatch(&self.signer);

		// Last point at which the run may be abandoned
		self.ensure_running(shutdown, Stage::Dispatch)?;
		match tokio::time::timeout(
			self.stage_timeout,
			self.repository_api.create_workflow_dispatch(
				&agent_repository,
				AGENT_WORKFLOW_ID,
				&dispatch,
				&bearer,
			),
		)
		.await
		{
			Ok(Ok(())) => {}
			Ok(Err(e)) => {
				return Err(BridgeError::dispatch_transport_error(
					Stage::Dispatch,
					format!("Failed to dispatch workflow on {}", agent_repository),
					Some(Box::new(e)),
					None,
				))
			}
			Err(_) => return Err(self.interrupted(Stage::Dispatch, StageInterrupt::TimedOut)),
		}

		info!(
			state_id = %request.state_id(),
			repository = %agent_repository,
			"Successfully sent the command to the personal agent"
		);
		Ok(DispatchOutcome::Dispatched {
			target,
			state_id: request.state_id(),
		})
	}
}
