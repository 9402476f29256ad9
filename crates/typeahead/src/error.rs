//! Error types for the typeahead engine.

use thiserror::Error;

/// Error raised by a caller-supplied hook, passed through untouched.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Errors detected while binding a session. These are fatal: the caller has to
/// fix its configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// The TOML configuration could not be parsed.
	#[error("invalid typeahead configuration: {0}")]
	Parse(#[from] toml::de::Error),

	/// `wait-ms` exceeds [`MAX_WAIT_MS`](crate::config::MAX_WAIT_MS).
	#[error("wait-ms {0} exceeds the maximum of {max} ms", max = crate::config::MAX_WAIT_MS)]
	InvalidWait(u64),

	/// The session was built without a source.
	#[error("typeahead session requires a source")]
	MissingSource,

	/// Items cannot be labelled: no label expression and no text form.
	#[error("typeahead session requires a label expression for its items")]
	MissingLabel,

	/// The session was built without a model binding.
	#[error("typeahead session requires a model binding")]
	MissingBinding,
}

/// Rejection payload of an asynchronous source.
///
/// Rejections are never surfaced to the session's caller; they read as "no
/// matches" and are only logged.
#[derive(Debug, Error)]
pub enum SourceError {
	/// The source rejected the lookup with a message.
	#[error("lookup rejected: {0}")]
	Rejected(String),

	/// Any other failure raised by the source.
	#[error(transparent)]
	Other(HookError),
}

/// Errors surfaced while committing a selection.
#[derive(Debug, Error)]
pub enum SelectError {
	/// The on-select hook failed. The session state is already committed.
	#[error(transparent)]
	Hook(HookError),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
