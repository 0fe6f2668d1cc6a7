//! Parsing utilities
//!
//! This module provides utilities for parsing command line and configuration values.

use byte_unit::Byte;
use std::str::FromStr;

/// Parses a string argument into a `u64` value representing a file size.
///
/// Accepts human-readable formats like "1GB", "500MB", "1024KB", etc.
pub fn parse_string_to_bytes_size(s: &str) -> Result<u64, String> {
	match Byte::from_str(s) {
		Ok(byte) => Ok(byte.as_u64()),
		Err(e) => Err(format!("Invalid size format: '{}'. Error: {}", s, e)),
	}
}

/// Normalizes a string by trimming whitespace and converting to lowercase.
pub fn normalize_string(input: &str) -> String {
	input.trim().to_lowercase()
}

/// Parses a strictly positive numeric id as used by GitHub for accounts and repositories.
pub fn parse_positive_id(input: &str) -> Option<u64> {
	if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}
	input.parse::<u64>().ok().filter(|id| *id > 0)
}
