//! Utility modules for common functionality.
//!
//! - constants: Constants for the application
//! - http: HTTP client utilities (retryable clients and retry policies)
//! - logging: Logging setup and structured error contexts
//! - parsing: Parsing utilities
//! - tests: Test utilities

pub mod constants;
pub mod http;
pub mod logging;
pub mod parsing;

pub use constants::*;
pub use http::*;
pub use parsing::*;
