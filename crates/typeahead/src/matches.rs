//! Candidate records produced from raw source items.

/// One candidate suggestion.
///
/// Matches are rebuilt wholesale for every accepted lookup and never patched,
/// so the fields are read-only once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Match<T, M> {
	label: String,
	model: M,
	item: T,
	index: usize,
}

impl<T, M> Match<T, M> {
	pub(crate) fn new(index: usize, item: T, label: String, model: M) -> Self {
		Self {
			label,
			model,
			item,
			index,
		}
	}

	/// Text shown for this match in the popup.
	pub fn label(&self) -> &str {
		&self.label
	}

	/// Value written to the model binding when this match is selected.
	pub fn model(&self) -> &M {
		&self.model
	}

	/// Raw item as returned by the source.
	pub fn item(&self) -> &T {
		&self.item
	}

	/// Position in the source's result order.
	pub fn index(&self) -> usize {
		self.index
	}
}
