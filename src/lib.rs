//! Scoped credential bridge for personal agents.
//!
//! This library lets a comment of the form `@owner do something` start the workflow of
//! `owner`'s personal agent repository, acting with a credential the owner sealed for the
//! bridge. It includes:
//!
//! - Mention parsing to find the targeted owner
//! - Lookup of the owner's opt-in configuration file
//! - Sealed-box opening of the owner's credential with the bridge holder key
//! - Scope validation binding the credential to the owner's declared organization and
//!   repository before any workflow dispatch is issued
//!
//! # Module Structure
//!
//! - `bootstrap`: Wires configuration, HTTP clients and services together
//! - `models`: Events, credentials, configuration and security types
//! - `repositories`: Access to the owner configuration store
//! - `services`: Target resolution, unsealing, GitHub access and the dispatcher
//! - `utils`: Logging, HTTP and parsing helpers

pub mod bootstrap;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;
