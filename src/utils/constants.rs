//! Constants shared across the bridge.

/// Name of the repository every owner keeps their personal agent in.
pub const AGENT_REPOSITORY_NAME: &str = "personal-agent";

/// Well-known path of the opt-in configuration file inside the agent repository.
pub const AGENT_CONFIG_PATH: &str = ".github/personal-agent.config.yml";

/// Workflow file started in the agent repository.
pub const AGENT_WORKFLOW_ID: &str = "compute.yml";

/// Only event the bridge reacts to.
pub const SUPPORTED_EVENT_NAME: &str = "issue_comment.created";

/// Default GitHub REST API base URL.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// GitHub REST API version header value.
pub const GITHUB_API_VERSION: &str = "2022-11-28";

/// User agent sent with every GitHub request.
pub const USER_AGENT: &str = concat!("personal-agent-bridge/", env!("CARGO_PKG_VERSION"));

/// Signature value forwarded when no signing secret is configured.
pub const NO_SIGNATURE: &str = "no-signature";

/// Default bound applied to each network stage of a run.
pub const DEFAULT_STAGE_TIMEOUT_SECS: u64 = 30;

/// Default log directory.
pub const DEFAULT_LOG_DIR: &str = "logs/";

/// Base name of the log file.
pub const DEFAULT_LOG_FILE_NAME: &str = "bridge.log";

/// Default maximum log file size (1GB).
pub const DEFAULT_LOG_MAX_SIZE: u64 = 1_073_741_824;
