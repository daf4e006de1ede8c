//! Error types for settings loading.

use std::path::PathBuf;

use keystone_registry::CandidateError;
use thiserror::Error;

/// Errors that can occur when loading registry settings.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or shape.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// Error reading a settings file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// A setting failed identifier or bound validation.
	#[error("invalid setting: {0}")]
	Invalid(#[from] CandidateError),

	/// An environment variable held a malformed value.
	#[error("invalid {var} entry {value:?}: {reason}")]
	InvalidEnv {
		/// Variable name.
		var: &'static str,
		/// The offending entry.
		value: String,
		/// What was expected.
		reason: &'static str,
	},
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
