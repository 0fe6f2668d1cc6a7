//! Security models
//!
//! - `error`: Error types for security operations
//! - `secret`: Zeroizing secret strings

mod error;
mod secret;

pub use error::{SecurityError, SecurityResult};
pub use secret::SecretString;
