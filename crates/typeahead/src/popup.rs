//! Popup visibility and active-index navigation.
//!
//! The popup is either closed (no matches) or open with a non-empty match
//! list and an active index that always points into it. Closing drops the
//! matches, so "open" and "has matches" never disagree.

use crate::matches::Match;

/// Open/closed state of the suggestion popup.
#[derive(Debug, Clone)]
pub enum PopupState<T, M> {
	/// Nothing displayed.
	Closed,
	/// Matches displayed with one of them highlighted.
	Open {
		/// Current matches, never empty.
		matches: Vec<Match<T, M>>,
		/// Highlighted match, always a valid index into `matches`.
		active: usize,
	},
}

impl<T, M> Default for PopupState<T, M> {
	fn default() -> Self {
		Self::Closed
	}
}

impl<T, M> PopupState<T, M> {
	/// Opens on `matches` with the first one active. An empty list closes.
	pub fn open(&mut self, matches: Vec<Match<T, M>>) {
		*self = if matches.is_empty() {
			Self::Closed
		} else {
			Self::Open { matches, active: 0 }
		};
	}

	/// Closes the popup and drops its matches. Returns whether it was open.
	pub fn close(&mut self) -> bool {
		let was_open = self.is_open();
		*self = Self::Closed;
		was_open
	}

	/// Whether the popup is open.
	pub fn is_open(&self) -> bool {
		matches!(self, Self::Open { .. })
	}

	/// Displayed matches; empty when closed.
	pub fn matches(&self) -> &[Match<T, M>] {
		match self {
			Self::Closed => &[],
			Self::Open { matches, .. } => matches,
		}
	}

	/// Highlighted index; `None` when closed.
	pub fn active_index(&self) -> Option<usize> {
		match self {
			Self::Closed => None,
			Self::Open { active, .. } => Some(*active),
		}
	}

	/// Highlighted match; `None` when closed.
	pub fn active_match(&self) -> Option<&Match<T, M>> {
		match self {
			Self::Closed => None,
			Self::Open { matches, active } => matches.get(*active),
		}
	}

	/// Moves the highlight down, wrapping past the end.
	pub fn next(&mut self) -> bool {
		let Self::Open { matches, active } = self else {
			return false;
		};
		*active = (*active + 1) % matches.len();
		true
	}

	/// Moves the highlight up, wrapping before the start.
	pub fn prev(&mut self) -> bool {
		let Self::Open { matches, active } = self else {
			return false;
		};
		*active = (*active + matches.len() - 1) % matches.len();
		true
	}

	/// Highlights match `index`. Out-of-range indices are ignored.
	pub fn hover(&mut self, index: usize) -> bool {
		let Self::Open { matches, active } = self else {
			return false;
		};
		if index >= matches.len() {
			return false;
		}
		*active = index;
		true
	}

	/// Closes and yields the highlighted match.
	pub fn take_active(&mut self) -> Option<Match<T, M>> {
		let index = self.active_index()?;
		self.take(index)
	}

	/// Closes and yields match `index`. Out-of-range indices change nothing.
	pub fn take(&mut self, index: usize) -> Option<Match<T, M>> {
		let Self::Open { matches, .. } = self else {
			return None;
		};
		if index >= matches.len() {
			return None;
		}
		let selected = matches.swap_remove(index);
		*self = Self::Closed;
		Some(selected)
	}
}
