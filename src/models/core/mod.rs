//! Core domain models.
//!
//! - `event`: Trigger events and identifiers
//! - `credential`: Sealed and unsealed credentials
//! - `repository`: Remote repository identity
//! - `dispatch`: Dispatch outcome and request body

mod credential;
mod dispatch;
mod event;
mod repository;

pub use credential::{SealedCredentialRecord, SourceFormat, UnsealedCredential};
pub use dispatch::{DispatchOutcome, WorkflowDispatch, AUTH_TOKEN_INPUT};
pub use event::{RepositoryRef, TargetIdentifier, TriggerEvent};
pub use repository::ActualRepository;
