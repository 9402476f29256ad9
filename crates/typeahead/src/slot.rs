//! Shared popup slot for sessions rendering outside their input's container.
//!
//! Only one session owns the slot at a time. Focus claims it (taking it from
//! any previous owner), blur and teardown release it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique identity of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl SessionId {
	/// Allocates the next id. Ids start at 1.
	pub(crate) fn next() -> Self {
		static NEXT: AtomicU64 = AtomicU64::new(0);
		Self(NEXT.fetch_add(1, Ordering::Relaxed).wrapping_add(1))
	}

	/// Raw value.
	pub const fn get(self) -> u64 {
		self.0
	}
}

impl fmt::Display for SessionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "session-{}", self.0)
	}
}

#[derive(Debug, Default)]
struct SlotState {
	owner: Option<SessionId>,
	transfers: u64,
}

/// Registry of the shared popup slot. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct SlotRegistry {
	state: Rc<RefCell<SlotState>>,
}

impl SlotRegistry {
	/// Creates an unowned slot.
	pub fn new() -> Self {
		Self::default()
	}

	/// Gives the slot to `id`. Returns the previous owner when ownership moved.
	pub fn claim(&self, id: SessionId) -> Option<SessionId> {
		let mut state = self.state.borrow_mut();
		let previous = state.owner.replace(id);
		match previous {
			Some(prev) if prev != id => {
				state.transfers += 1;
				tracing::debug!(from = prev.get(), to = id.get(), "typeahead.slot.transfer");
				Some(prev)
			}
			_ => None,
		}
	}

	/// Releases the slot if `id` owns it. Returns whether it did.
	pub fn release(&self, id: SessionId) -> bool {
		let mut state = self.state.borrow_mut();
		if state.owner == Some(id) {
			state.owner = None;
			return true;
		}
		false
	}

	/// Current owner.
	pub fn owner(&self) -> Option<SessionId> {
		self.state.borrow().owner
	}

	/// Whether `id` owns the slot.
	pub fn is_owned_by(&self, id: SessionId) -> bool {
		self.owner() == Some(id)
	}

	/// Number of times ownership moved directly between sessions.
	pub fn transfers(&self) -> u64 {
		self.state.borrow().transfers
	}
}
