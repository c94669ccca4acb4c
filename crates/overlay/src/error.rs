//! Error types for the overlay controller.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating an [`OverlayConfig`].
///
/// [`OverlayConfig`]: crate::OverlayConfig
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// The file is not valid TOML or does not match the schema.
	#[error("TOML parse error: {0}")]
	Parse(#[from] toml::de::Error),

	/// A value parsed but is out of range.
	#[error("invalid value for '{field}': {reason}")]
	Invalid {
		field: &'static str,
		reason: &'static str,
	},
}

/// Errors returned by [`OverlayController`] entry points.
///
/// [`OverlayController`]: crate::OverlayController
#[derive(Debug, Error)]
pub enum ControllerError {
	/// `start` was called more than once.
	#[error("overlay controller already started")]
	AlreadyStarted,

	/// The orchestrator is not running (never started, or shut down).
	#[error("overlay controller is not running")]
	Closed,

	#[error(transparent)]
	Config(#[from] ConfigError),
}

pub type Result<T, E = ControllerError> = std::result::Result<T, E>;
