//! Keys understood by the popup.

/// Key pressed in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
	/// Previous match.
	Up,
	/// Next match.
	Down,
	/// Commit the active match.
	Enter,
	/// Commit the active match.
	Tab,
	/// Close the popup.
	Escape,
	/// Anything else; never consumed.
	Other,
}

impl Key {
	/// Maps a DOM-style key code (`keydown.which`).
	pub fn from_code(code: u32) -> Self {
		match code {
			9 => Self::Tab,
			13 => Self::Enter,
			27 => Self::Escape,
			38 => Self::Up,
			40 => Self::Down,
			_ => Self::Other,
		}
	}

	/// Whether the popup consumes this key while open.
	pub fn is_hot(self) -> bool {
		!matches!(self, Self::Other)
	}
}

/// Whether the engine consumed a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
	/// Consumed; the host should suppress its default handling.
	Handled,
	/// Not consumed.
	Ignored,
}

/// Where a pointer press landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
	/// The input element itself; keeps the popup open.
	Input,
	/// Match `n` in the popup; commits it.
	Match(usize),
	/// Anywhere else; closes the popup.
	Outside,
}
