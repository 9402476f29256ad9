//! Session configuration.
//!
//! Plain options are deserialisable so hosts can keep them next to the rest of
//! their settings:
//!
//! ```toml
//! min-length = 2
//! wait-ms = 200
//! editable = false
//! append-to-body = true
//! on-reject = "keep"
//! ```
//!
//! Callbacks (label/model expressions, on-select, input formatter) are not
//! serialisable and are attached through [`SessionBuilder`](crate::SessionBuilder).

use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Upper bound for `wait-ms`.
pub const MAX_WAIT_MS: u64 = 60_000;

/// What a rejected lookup does to the popup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectPolicy {
	/// Clear the matches and close the popup.
	#[default]
	Close,
	/// Leave whatever is displayed untouched.
	Keep,
}

/// Options for one typeahead session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct TypeaheadConfig {
	/// Minimum number of characters before a lookup is issued.
	pub min_length: usize,
	/// Quiet period after the last keystroke before looking up.
	pub wait_ms: u64,
	/// Whether free text is an acceptable model value.
	pub editable: bool,
	/// Render the popup in the shared slot instead of next to the input.
	pub append_to_body: bool,
	/// Popup behaviour when the source rejects.
	pub on_reject: RejectPolicy,
}

impl Default for TypeaheadConfig {
	fn default() -> Self {
		Self {
			min_length: 1,
			wait_ms: 0,
			editable: true,
			append_to_body: false,
			on_reject: RejectPolicy::Close,
		}
	}
}

impl TypeaheadConfig {
	/// Parses and validates a TOML document.
	pub fn from_toml_str(input: &str) -> Result<Self> {
		let config: Self = toml::from_str(input)?;
		config.validated()
	}

	/// Checks limits and normalises degenerate values.
	///
	/// A `min-length` of zero is raised to one: blank input never looks up.
	pub fn validated(mut self) -> Result<Self> {
		if self.wait_ms > MAX_WAIT_MS {
			return Err(ConfigError::InvalidWait(self.wait_ms));
		}
		self.min_length = self.min_length.max(1);
		Ok(self)
	}

	/// Debounce window as a [`Duration`].
	pub fn wait(&self) -> Duration {
		Duration::from_millis(self.wait_ms)
	}
}
