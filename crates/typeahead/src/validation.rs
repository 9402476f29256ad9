//! Validation gate for typed text.
//!
//! In editable mode typed text is mirrored into the model as free text. With
//! `editable = false` only committed matches are valid: non-empty typed text
//! sets the model to [`ModelValue::Invalid`] and raises [`EDITABLE_ERROR`].
//! Blank input is always valid and clears the model.

use crate::binding::{Binding, EDITABLE_ERROR, ModelValue};

/// Tracks the `editable` validation error for one input.
#[derive(Debug)]
pub struct ValidationGate {
	editable: bool,
	invalid: bool,
}

impl ValidationGate {
	/// Creates a gate. `editable = true` accepts free text.
	pub fn new(editable: bool) -> Self {
		Self {
			editable,
			invalid: false,
		}
	}

	/// Handles text typed by the user.
	pub fn on_view_change<M, B: Binding<M> + ?Sized>(&mut self, text: &str, binding: &mut B) {
		if text.is_empty() {
			binding.write(ModelValue::Empty);
			self.set_invalid(false, binding);
		} else if self.editable {
			binding.write(ModelValue::FreeText(text.to_owned()));
		} else {
			binding.write(ModelValue::Invalid);
			self.set_invalid(true, binding);
		}
	}

	/// Marks the current value as a committed match.
	pub fn satisfy<M, B: Binding<M> + ?Sized>(&mut self, binding: &mut B) {
		self.set_invalid(false, binding);
	}

	/// Whether the editable error is currently raised.
	pub fn is_invalid(&self) -> bool {
		self.invalid
	}

	fn set_invalid<M, B: Binding<M> + ?Sized>(&mut self, invalid: bool, binding: &mut B) {
		if self.invalid != invalid {
			tracing::trace!(invalid, "typeahead.validation.editable");
		}
		self.invalid = invalid;
		binding.set_validation_error(EDITABLE_ERROR, invalid);
	}
}
