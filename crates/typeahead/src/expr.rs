//! Typed label and model expressions.
//!
//! Each raw item yields a display label and a model value. Going the other
//! way, a bound model value is turned back into display text for initial
//! rendering and for external model changes:
//!
//! 1. the input formatter, when one is configured;
//! 2. the label-from-model expression (explicit, or derived when model values
//!    are the items themselves);
//! 3. the model's own text form.

use crate::matches::Match;

/// Maps a raw item to its display label.
pub type LabelFn<T> = Box<dyn Fn(&T) -> String>;
/// Maps a raw item to its model value.
pub type ModelFn<T, M> = Box<dyn Fn(&T) -> M>;
/// Maps a model value back to a label, when it can.
pub type ModelLabelFn<M> = Box<dyn Fn(&M) -> Option<String>>;
/// Formats a model value as display text.
pub type FormatFn<M> = Box<dyn Fn(&M) -> String>;

/// Label and model mapping for one session.
pub struct Expressions<T, M> {
	label: LabelFn<T>,
	model: ModelFn<T, M>,
	label_from_model: Option<ModelLabelFn<M>>,
	model_text: Option<FormatFn<M>>,
	input_formatter: Option<FormatFn<M>>,
}

impl<T, M> Expressions<T, M> {
	pub(crate) fn new(
		label: LabelFn<T>,
		model: ModelFn<T, M>,
		label_from_model: Option<ModelLabelFn<M>>,
		model_text: Option<FormatFn<M>>,
		input_formatter: Option<FormatFn<M>>,
	) -> Self {
		Self {
			label,
			model,
			label_from_model,
			model_text,
			input_formatter,
		}
	}

	/// Label for a raw item.
	pub fn label(&self, item: &T) -> String {
		(self.label)(item)
	}

	/// Model value for a raw item.
	pub fn model(&self, item: &T) -> M {
		(self.model)(item)
	}

	/// Caller-supplied formatter for model values, if any.
	pub fn input_formatter(&self) -> Option<&FormatFn<M>> {
		self.input_formatter.as_ref()
	}

	/// Maps raw items to matches, keeping source order.
	pub fn to_matches(&self, items: Vec<T>) -> Vec<Match<T, M>> {
		items
			.into_iter()
			.enumerate()
			.map(|(index, item)| {
				let label = self.label(&item);
				let model = self.model(&item);
				Match::new(index, item, label, model)
			})
			.collect()
	}

	/// Display text for a bound model value, without consulting any source.
	///
	/// Returns `None` when no expression resolves and the model has no text form.
	pub fn view_text(&self, model: &M) -> Option<String> {
		if let Some(format) = &self.input_formatter {
			return Some(format(model));
		}
		if let Some(label) = self.label_from_model.as_ref().and_then(|f| f(model)) {
			return Some(label);
		}
		self.model_text.as_ref().map(|f| f(model))
	}
}

impl<T, M> std::fmt::Debug for Expressions<T, M> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Expressions")
			.field("label_from_model", &self.label_from_model.is_some())
			.field("model_text", &self.model_text.is_some())
			.field("input_formatter", &self.input_formatter.is_some())
			.finish_non_exhaustive()
	}
}
