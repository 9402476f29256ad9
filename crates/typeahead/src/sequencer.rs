//! Request sequencing with last-issued-wins semantics.
//!
//! Every lookup gets a fresh [`RequestId`]. Only the most recently issued id
//! is current; results carrying any other id are stale and must be dropped.
//! In-flight lookups are never aborted, only ignored on arrival.

use std::fmt;

/// Monotonic identifier of one lookup request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
	/// Raw counter value.
	pub const fn get(self) -> u64 {
		self.0
	}
}

impl fmt::Display for RequestId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// The outstanding lookup, if the newest request has not settled yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
	/// Id of the request.
	pub id: RequestId,
	/// Text the source was asked about.
	pub query: String,
}

/// How an arriving result relates to the newest request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
	/// The result belongs to the newest request.
	Current,
	/// A newer request was issued (or the request was retired).
	Stale,
}

/// Issues request ids and classifies arriving results.
#[derive(Debug, Default)]
pub struct RequestSequencer {
	current: RequestId,
	pending: Option<PendingRequest>,
}

impl RequestSequencer {
	/// Creates a sequencer with no request issued.
	pub fn new() -> Self {
		Self::default()
	}

	/// Allocates the next id for a lookup of `query`, superseding any
	/// outstanding request.
	pub fn issue(&mut self, query: &str) -> RequestId {
		self.current = RequestId(self.current.0 + 1);
		self.pending = Some(PendingRequest {
			id: self.current,
			query: query.to_owned(),
		});
		self.current
	}

	/// Supersedes the outstanding request without issuing a new one.
	///
	/// Returns whether a request was outstanding.
	pub fn retire(&mut self) -> bool {
		let Some(pending) = self.pending.take() else {
			return false;
		};
		self.current = RequestId(self.current.0 + 1);
		tracing::trace!(request_id = pending.id.get(), "typeahead.lookup.retire");
		true
	}

	/// Records the arrival of a result for `id`.
	pub fn settle(&mut self, id: RequestId) -> Settlement {
		if id != self.current {
			return Settlement::Stale;
		}
		match self.pending.take() {
			Some(_) => Settlement::Current,
			None => Settlement::Stale,
		}
	}

	/// Whether `id` is the newest request.
	pub fn is_current(&self, id: RequestId) -> bool {
		id == self.current
	}

	/// Newest id handed out (or retired).
	pub fn current(&self) -> RequestId {
		self.current
	}

	/// The outstanding request, if any.
	pub fn pending(&self) -> Option<&PendingRequest> {
		self.pending.as_ref()
	}

	/// Whether the newest request is still outstanding.
	pub fn is_loading(&self) -> bool {
		self.pending.is_some()
	}
}
