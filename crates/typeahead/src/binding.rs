//! Model binding collaborator.
//!
//! The binding owns the model value shared with the rest of the host. The
//! engine writes to it only when a selection is committed or when typed text
//! is mirrored into the model by the validation gate. Changes made by the host
//! itself are announced through [`Binding::on_external_change`]; the session
//! re-renders its text from the binding on its next entry point (or at once
//! under a [`Driver`](crate::Driver)).

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

/// Validation key raised while non-editable input holds free text.
pub const EDITABLE_ERROR: &str = "editable";

/// Value held by the model binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValue<M> {
	/// No value; the input is blank.
	Empty,
	/// Placeholder for rejected free text (non-editable mode).
	Invalid,
	/// Typed text accepted as-is (editable mode).
	FreeText(String),
	/// A committed model value.
	Value(M),
}

impl<M> Default for ModelValue<M> {
	fn default() -> Self {
		Self::Empty
	}
}

impl<M> ModelValue<M> {
	/// The committed value, if any.
	pub fn as_value(&self) -> Option<&M> {
		match self {
			Self::Value(value) => Some(value),
			_ => None,
		}
	}
}

/// Callback fired when the host replaces the model value.
pub type ExternalChangeFn = Box<dyn FnMut()>;

/// External model store bound to one input.
pub trait Binding<M> {
	/// Current model value.
	fn read(&self) -> ModelValue<M>;

	/// Replaces the model value.
	fn write(&mut self, value: ModelValue<M>);

	/// Raises (`invalid = true`) or clears a validation error.
	fn set_validation_error(&mut self, key: &str, invalid: bool);

	/// Registers `notify`, fired whenever the value changes outside the
	/// engine. Writes made through [`write`](Self::write) never fire it.
	fn on_external_change(&mut self, notify: ExternalChangeFn);
}

#[derive(Debug)]
struct MemoryState<M> {
	value: ModelValue<M>,
	errors: BTreeSet<String>,
	writes: usize,
}

/// In-memory binding with shared handles.
///
/// Clones observe the same state, so a host can keep one handle while the
/// session owns another.
pub struct MemoryBinding<M> {
	state: Rc<RefCell<MemoryState<M>>>,
	watchers: Rc<RefCell<Vec<ExternalChangeFn>>>,
}

impl<M> Clone for MemoryBinding<M> {
	fn clone(&self) -> Self {
		Self {
			state: Rc::clone(&self.state),
			watchers: Rc::clone(&self.watchers),
		}
	}
}

impl<M: fmt::Debug> fmt::Debug for MemoryBinding<M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemoryBinding")
			.field("state", &self.state)
			.field("watchers", &self.watchers.borrow().len())
			.finish()
	}
}

impl<M> Default for MemoryBinding<M> {
	fn default() -> Self {
		Self::new(ModelValue::Empty)
	}
}

impl<M> MemoryBinding<M> {
	/// Creates a binding holding `value`.
	pub fn new(value: ModelValue<M>) -> Self {
		Self {
			state: Rc::new(RefCell::new(MemoryState {
				value,
				errors: BTreeSet::new(),
				writes: 0,
			})),
			watchers: Rc::new(RefCell::new(Vec::new())),
		}
	}

	/// Whether validation error `key` is raised.
	pub fn has_error(&self, key: &str) -> bool {
		self.state.borrow().errors.contains(key)
	}

	/// Number of writes performed through [`Binding::write`].
	pub fn writes(&self) -> usize {
		self.state.borrow().writes
	}

	/// Replaces the value as the host would, without counting it as an
	/// engine write, and notifies every watcher.
	pub fn set(&self, value: ModelValue<M>) {
		self.state.borrow_mut().value = value;
		let mut watchers = std::mem::take(&mut *self.watchers.borrow_mut());
		for notify in &mut watchers {
			notify();
		}
		let mut slot = self.watchers.borrow_mut();
		watchers.append(&mut slot);
		*slot = watchers;
	}
}

impl<M: Clone> MemoryBinding<M> {
	/// Current value.
	pub fn value(&self) -> ModelValue<M> {
		self.state.borrow().value.clone()
	}
}

impl<M: Clone> Binding<M> for MemoryBinding<M> {
	fn read(&self) -> ModelValue<M> {
		self.value()
	}

	fn write(&mut self, value: ModelValue<M>) {
		let mut state = self.state.borrow_mut();
		state.value = value;
		state.writes += 1;
	}

	fn set_validation_error(&mut self, key: &str, invalid: bool) {
		let mut state = self.state.borrow_mut();
		if invalid {
			state.errors.insert(key.to_owned());
		} else {
			state.errors.remove(key);
		}
	}

	fn on_external_change(&mut self, notify: ExternalChangeFn) {
		self.watchers.borrow_mut().push(notify);
	}
}
