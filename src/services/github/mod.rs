//! GitHub access.
//!
//! - `client`: REST client serving configuration reads, repository lookup and dispatch
//! - `auth`: bearer token selection for the agent repository
//! - `error`: status-derived error kinds

mod auth;
mod client;
mod error;

pub use auth::{AppInstallationAuthenticator, Authenticator, TokenAuthenticator};
pub use client::{GitHubClient, RepositoryApi};
pub use error::GitHubError;
