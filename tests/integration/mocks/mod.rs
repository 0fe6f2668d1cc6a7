//! Mock implementations for testing purposes.
//!
//! This module contains mock implementations of the traits the dispatcher is generic
//! over. It includes mocks for:
//! - The owner configuration store
//! - The GitHub repository API and authenticators
//!
//! The mocks are implemented using the `mockall` crate.

mod repositories;
#[allow(unused_imports)]
pub use repositories::*;
#[allow(unused_imports)]
pub use services::*;
