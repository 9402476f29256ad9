//! Selection committer.

use crate::binding::{Binding, ModelValue};
use crate::error::{HookError, SelectError};
use crate::expr::Expressions;
use crate::matches::Match;
use crate::validation::ValidationGate;

/// Caller notification for a committed selection: `(item, model, label)`.
pub type OnSelectFn<T, M> = Box<dyn FnMut(&T, &M, &str) -> Result<(), HookError>>;

/// Writes a chosen match back through the binding and notifies the caller.
pub struct SelectionCommitter<T, M> {
	on_select: Option<OnSelectFn<T, M>>,
}

impl<T, M: Clone> SelectionCommitter<T, M> {
	pub(crate) fn new(on_select: Option<OnSelectFn<T, M>>) -> Self {
		Self { on_select }
	}

	/// Label displayed after committing `selected`.
	///
	/// The input formatter wins when configured; otherwise the match label.
	pub fn display_label(&self, selected: &Match<T, M>, expr: &Expressions<T, M>) -> String {
		match expr.input_formatter() {
			Some(format) => format(selected.model()),
			None => selected.label().to_owned(),
		}
	}

	/// Writes the model value and clears the editable error.
	pub fn write<B: Binding<M> + ?Sized>(&self, selected: &Match<T, M>, binding: &mut B, gate: &mut ValidationGate) {
		binding.write(ModelValue::Value(selected.model().clone()));
		gate.satisfy(binding);
	}

	/// Invokes the on-select hook. Its error is returned unmodified.
	pub fn notify(&mut self, selected: &Match<T, M>) -> Result<(), SelectError> {
		let Some(on_select) = self.on_select.as_mut() else {
			return Ok(());
		};
		on_select(selected.item(), selected.model(), selected.label()).map_err(SelectError::Hook)
	}
}

impl<T, M> std::fmt::Debug for SelectionCommitter<T, M> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SelectionCommitter")
			.field("on_select", &self.on_select.is_some())
			.finish()
	}
}
