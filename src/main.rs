//! Personal agent bridge entry point.
//!
//! Runs once per webhook delivery, typically as a GitHub Actions step:
//!
//! - `run`: processes the event at `--event` (defaults to `GITHUB_EVENT_PATH`) and dispatches
//!   the addressed owner's agent workflow if the owner opted in and the scope allows it
//! - `public-key`: prints the holder public key owners seal their credential to
//! - `seal`: seals a credential read from stdin into an agent configuration line
//!
//! # Flow
//! 1. Applies CLI options and `.env` to the environment
//! 2. Sets up logging
//! 3. Loads and validates the bridge configuration
//! 4. Executes the requested command; Ctrl+C abandons a run before it dispatches

pub mod bootstrap;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;

use crate::{
	bootstrap::{
		describe_outcome, initialize_dispatcher, load_holder_key, load_trigger_event,
		process_event, seal_owner_credential, Result,
	},
	models::{BridgeConfig, SecretString},
	utils::{logging::setup_logging, parse_string_to_bytes_size},
};

use clap::{Parser, Subcommand};
use dotenvy::dotenv_override;
use std::{
	env::{set_var, var},
	io::Read,
	path::PathBuf,
};
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Parser)]
#[command(
	name = "personal-agent-bridge",
	about = "Dispatches an owner's personal agent workflow from an @mention, using the credential the owner sealed for the bridge and only within the scope they declared.",
	version
)]
struct Cli {
	/// Write logs to file instead of stdout
	#[arg(long, global = true)]
	log_file: bool,

	/// Set log level (trace, debug, info, warn, error)
	#[arg(long, value_name = "LEVEL", global = true)]
	log_level: Option<String>,

	/// Path to store log files (default: logs/)
	#[arg(long, value_name = "PATH", global = true)]
	log_path: Option<String>,

	/// Maximum log file size before rolling (e.g., "1GB", "500MB", "1024KB")
	#[arg(long, value_name = "SIZE", value_parser = parse_string_to_bytes_size, global = true)]
	log_max_size: Option<u64>,

	/// Validate the bridge configuration without processing an event
	#[arg(long)]
	check: bool,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
	/// Process one webhook event
	Run {
		/// Path to the webhook payload
		#[arg(long, value_name = "PATH", env = "GITHUB_EVENT_PATH")]
		event: PathBuf,

		/// Event name such as `issue_comment.created` (default: derived from GITHUB_EVENT_NAME)
		#[arg(long, value_name = "NAME")]
		event_name: Option<String>,

		/// JSON file with settings forwarded to the agent workflow
		#[arg(long, value_name = "PATH")]
		settings: Option<PathBuf>,
	},
	/// Print the holder public key
	PublicKey,
	/// Seal a credential read from stdin for the holder
	Seal {
		/// Organization the credential may act in
		#[arg(long, value_name = "ID", value_parser = clap::value_parser!(u64).range(1..))]
		org_id: u64,

		/// Repository the credential is restricted to
		#[arg(long, value_name = "ID", value_parser = clap::value_parser!(u64).range(1..))]
		repo_id: Option<u64>,

		/// Holder public key (default: derived from X25519_PRIVATE_KEY)
		#[arg(long, value_name = "KEY")]
		public_key: Option<String>,
	},
}

impl Cli {
	/// Apply CLI options to environment variables, overriding any existing values
	fn apply_to_env(&self) {
		// Reload environment variables from .env file
		// Override any existing environment variables
		dotenv_override().ok();

		if self.log_file {
			set_var("LOG_MODE", "file");
		}

		// Set log level from RUST_LOG if it exists
		if let Ok(level) = var("RUST_LOG") {
			set_var("LOG_LEVEL", level);
		}

		if let Some(level) = &self.log_level {
			set_var("LOG_LEVEL", level);
			set_var("RUST_LOG", level);
		}

		if let Some(path) = &self.log_path {
			set_var("LOG_DATA_DIR", path);
		}

		if let Some(max_size) = &self.log_max_size {
			set_var("LOG_MAX_SIZE", max_size.to_string());
		}
	}
}

/// Main entry point for the bridge.
///
/// # Errors
/// Returns an error if configuration is invalid or the run fails; the process then exits
/// with a non-zero status.
#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	cli.apply_to_env();

	setup_logging().unwrap_or_else(|e| {
		error!("Failed to setup logging: {}", e);
	});

	if cli.check {
		return validate_configuration();
	}

	match cli.command {
		Some(Command::Run {
			event,
			event_name,
			settings,
		}) => run(event, event_name, settings).await,
		Some(Command::PublicKey) => print_public_key(),
		Some(Command::Seal {
			org_id,
			repo_id,
			public_key,
		}) => seal_from_stdin(org_id, repo_id, public_key),
		None => Err("no command given, see --help".into()),
	}
}

async fn run(
	event_path: PathBuf,
	event_name: Option<String>,
	settings_path: Option<PathBuf>,
) -> Result<()> {
	let config = BridgeConfig::from_env()?;
	let dispatcher = initialize_dispatcher(&config)?;

	let platform_event = var("GITHUB_EVENT_NAME").ok();
	let Some(event) = load_trigger_event(
		&event_path,
		event_name.as_deref(),
		platform_event.as_deref(),
		settings_path.as_deref(),
	)?
	else {
		println!("{}", describe_outcome(&models::DispatchOutcome::Ignored));
		return Ok(());
	};

	let (shutdown_tx, shutdown_rx) = watch::channel(false);
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			info!("Shutdown signal received, abandoning run...");
			let _ = shutdown_tx.send(true);
		}
	});

	let outcome = process_event(&dispatcher, &event, shutdown_rx).await?;
	println!("{}", describe_outcome(&outcome));
	Ok(())
}

fn print_public_key() -> Result<()> {
	let config = BridgeConfig::from_env()?;
	let holder_key = load_holder_key(&config.holder_private_key)?;
	println!("{}", holder_key.public_key_base64url());
	Ok(())
}

fn seal_from_stdin(org_id: u64, repo_id: Option<u64>, public_key: Option<String>) -> Result<()> {
	let mut input = String::new();
	std::io::stdin().read_to_string(&mut input)?;
	let secret = SecretString::new(input.trim().to_string());
	zeroize::Zeroize::zeroize(&mut input);
	if secret.is_empty() {
		return Err("no credential on stdin".into());
	}

	let holder_private_key = var("X25519_PRIVATE_KEY")
		.ok()
		.filter(|value| !value.trim().is_empty())
		.map(SecretString::new);
	let line = seal_owner_credential(
		secret,
		org_id,
		repo_id,
		public_key.as_deref(),
		holder_private_key.as_ref(),
	)?;
	println!("{}", line);
	Ok(())
}

/// Validates the bridge configuration and the keys it references
fn validate_configuration() -> Result<()> {
	info!("Validating bridge configuration...");

	let config = BridgeConfig::from_env().inspect_err(|e| {
		error!("{}", e);
	})?;
	info!("✓ Environment configuration is valid");

	initialize_dispatcher(&config).inspect_err(|e| {
		error!("{}", e);
	})?;
	info!("✓ Holder key and GitHub authentication are usable");

	info!("Configuration validation completed successfully!");
	Ok(())
}
