//! Rendering observers.
//!
//! Observers receive a [`RenderView`] whenever the matches, the active index,
//! the open flag or the loading flag change. Drawing the popup, highlighting
//! and positioning it are entirely theirs.

use crate::matches::Match;

/// Borrowed view of everything a renderer needs.
#[derive(Debug)]
pub struct RenderView<'a, T, M> {
	/// Displayed matches, empty when closed.
	pub matches: &'a [Match<T, M>],
	/// Highlighted match.
	pub active_index: Option<usize>,
	/// Whether the popup is visible.
	pub is_open: bool,
	/// Whether the newest lookup is outstanding.
	pub loading: bool,
	/// Current input text, used for match highlighting.
	pub query: &'a str,
	/// Whether the popup renders in the shared slot owned by this session.
	pub in_shared_slot: bool,
}

/// Receives render notifications.
pub trait RenderObserver<T, M> {
	/// Called after a visible change.
	fn render(&mut self, view: &RenderView<'_, T, M>);
}

impl<T, M, F> RenderObserver<T, M> for F
where
	F: FnMut(&RenderView<'_, T, M>),
{
	fn render(&mut self, view: &RenderView<'_, T, M>) {
		self(view)
	}
}

/// Cheap fingerprint of the observable state, used to suppress redundant
/// notifications. `revision` changes whenever the match list is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RenderStamp {
	pub revision: u64,
	pub active_index: Option<usize>,
	pub is_open: bool,
	pub loading: bool,
}
