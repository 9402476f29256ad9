//! Per-input typeahead session.
//!
//! A [`Session`] is the live state of one bound input: displayed text, focus,
//! popup, outstanding request and pending debounce trigger. Every mutation
//! runs to completion synchronously. The only suspension point is a deferred
//! source lookup, which the session hands out through
//! [`take_deferred`](Session::take_deferred) and takes back through
//! [`settle`](Session::settle).
//!
//! # Event flow
//!
//! ```text
//! input_text ─► Debouncer ─► lookup (RequestSequencer + Source)
//!                                 │ Ready            │ Deferred
//!                                 ▼                  ▼
//!                               settle ◄──────── executor
//!                                 │
//!                                 ▼
//!                             PopupState ─► RenderObserver
//! handle_key / pointer_down ─► PopupState ─► select ─► Binding
//! ```
//!
//! # Invariants
//!
//! * The popup is open only while the input is focused and has matches.
//! * A result is applied only if its request id is the newest one issued.
//! * The binding is written only by [`select`](Session::select) and by the
//!   validation gate on user input.
//!
//! # External model changes
//!
//! The session subscribes to its binding at bind time. A host-side change only
//! marks the session dirty; the text is re-rendered from the binding by
//! [`sync_external`](Session::sync_external), which every entry point runs
//! first. The popup never opens as a result.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::binding::{Binding, ExternalChangeFn, ModelValue};
use crate::commit::{OnSelectFn, SelectionCommitter};
use crate::config::{RejectPolicy, TypeaheadConfig};
use crate::debounce::{Clock, Debouncer, SystemClock};
use crate::error::{ConfigError, HookError, SelectError, SourceError};
use crate::expr::{Expressions, FormatFn, ModelFn, ModelLabelFn};
use crate::key::{Key, KeyOutcome, PointerTarget};
use crate::matches::Match;
use crate::observer::{RenderObserver, RenderStamp, RenderView};
use crate::popup::PopupState;
use crate::sequencer::{PendingRequest, RequestId, RequestSequencer, Settlement};
use crate::slot::{SessionId, SlotRegistry};
use crate::source::{Lookup, LookupFuture, Source};
use crate::validation::ValidationGate;

/// A lookup waiting on its source's future.
pub struct DeferredLookup<T> {
	/// Request the result belongs to.
	pub id: RequestId,
	/// Text the source was asked about.
	pub query: String,
	/// The source's computation.
	pub future: LookupFuture<T>,
}

impl<T> fmt::Debug for DeferredLookup<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DeferredLookup")
			.field("id", &self.id)
			.field("query", &self.query)
			.finish_non_exhaustive()
	}
}

/// Host event, for hosts that queue input instead of calling methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent<M> {
	/// Input gained focus.
	Focus,
	/// Input lost focus.
	Blur,
	/// User changed the text.
	Input(String),
	/// Key pressed in the input.
	Key(Key),
	/// Pointer moved over match `n`.
	Hover(usize),
	/// Pointer pressed.
	Pointer(PointerTarget),
	/// The host changed the model value.
	ExternalChange(ModelValue<M>),
	/// Input element is going away.
	Teardown,
}

/// Live typeahead state of one input.
pub struct Session<T, M> {
	id: SessionId,
	config: TypeaheadConfig,
	source: Box<dyn Source<T>>,
	expr: Expressions<T, M>,
	committer: SelectionCommitter<T, M>,
	binding: Box<dyn Binding<M>>,
	gate: ValidationGate,
	observers: Vec<Box<dyn RenderObserver<T, M>>>,
	slots: Option<SlotRegistry>,
	clock: Rc<dyn Clock>,
	debounce: Debouncer,
	sequencer: RequestSequencer,
	popup: PopupState<T, M>,
	view_text: String,
	focused: bool,
	deferred: Vec<DeferredLookup<T>>,
	revision: u64,
	last_stamp: RenderStamp,
	torn_down: bool,
	external: Rc<Cell<bool>>,
	clock_set: bool,
}

impl<T, M> fmt::Debug for Session<T, M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Session")
			.field("id", &self.id)
			.field("config", &self.config)
			.field("view_text", &self.view_text)
			.field("focused", &self.focused)
			.field("open", &self.popup.is_open())
			.field("matches", &self.popup.matches().len())
			.field("active_index", &self.popup.active_index())
			.field("request", &self.sequencer.current())
			.field("loading", &self.sequencer.is_loading())
			.field("deferred", &self.deferred.len())
			.finish_non_exhaustive()
	}
}

impl<T, M: Clone> Session<T, M> {
	/// Session identity.
	pub fn id(&self) -> SessionId {
		self.id
	}

	/// Validated configuration.
	pub fn config(&self) -> &TypeaheadConfig {
		&self.config
	}

	/// Text currently displayed in the input.
	pub fn view_text(&self) -> &str {
		&self.view_text
	}

	/// Whether the popup is open.
	pub fn is_open(&self) -> bool {
		self.popup.is_open()
	}

	/// Displayed matches, empty when closed.
	pub fn matches(&self) -> &[Match<T, M>] {
		self.popup.matches()
	}

	/// Highlighted match index.
	pub fn active_index(&self) -> Option<usize> {
		self.popup.active_index()
	}

	/// Highlighted match.
	pub fn active_match(&self) -> Option<&Match<T, M>> {
		self.popup.active_match()
	}

	/// Whether the newest lookup is still outstanding.
	pub fn is_loading(&self) -> bool {
		self.sequencer.is_loading()
	}

	/// Whether the input has focus.
	pub fn is_focused(&self) -> bool {
		self.focused
	}

	/// Newest request id issued (or retired).
	pub fn request_id(&self) -> RequestId {
		self.sequencer.current()
	}

	/// The outstanding request, if any.
	pub fn pending_request(&self) -> Option<&PendingRequest> {
		self.sequencer.pending()
	}

	/// Whether the editable validation error is raised.
	pub fn is_invalid(&self) -> bool {
		self.gate.is_invalid()
	}

	/// When the pending debounce trigger fires.
	pub fn next_deadline(&self) -> Option<Instant> {
		self.debounce.deadline()
	}

	/// Whether deferred lookups are waiting to be picked up.
	pub fn has_deferred(&self) -> bool {
		!self.deferred.is_empty()
	}

	/// Whether [`teardown`](Self::teardown) ran.
	pub fn is_torn_down(&self) -> bool {
		self.torn_down
	}

	/// Snapshot handed to observers.
	pub fn view(&self) -> RenderView<'_, T, M> {
		RenderView {
			matches: self.popup.matches(),
			active_index: self.popup.active_index(),
			is_open: self.popup.is_open(),
			loading: self.sequencer.is_loading(),
			query: &self.view_text,
			in_shared_slot: self.in_shared_slot(),
		}
	}

	/// Re-renders the text from the binding if the host changed the model
	/// since the last call. Returns whether it did.
	pub fn sync_external(&mut self) -> bool {
		if !self.external.replace(false) || self.torn_down {
			return false;
		}
		let value = self.binding.read();
		self.on_external_change(value);
		true
	}

	/// The input gained focus.
	pub fn focus(&mut self) {
		if self.torn_down {
			return;
		}
		self.sync_external();
		self.focused = true;
		if self.config.append_to_body
			&& let Some(slots) = &self.slots
		{
			slots.claim(self.id);
		}
		trace!(session = self.id.get(), "typeahead.focus");
		self.notify();
	}

	/// The input lost focus. Closes the popup; in-flight lookups still settle
	/// (clearing `loading`) but can no longer open it.
	pub fn blur(&mut self) {
		self.sync_external();
		self.focused = false;
		self.popup.close();
		self.release_slot();
		trace!(session = self.id.get(), "typeahead.blur");
		self.notify();
	}

	/// The user changed the input text.
	pub fn input_text(&mut self, text: impl Into<String>) {
		if self.torn_down {
			return;
		}
		self.sync_external();
		self.view_text = text.into();
		self.gate.on_view_change(&self.view_text, &mut *self.binding);

		if self.view_text.chars().count() < self.config.min_length {
			self.debounce.cancel();
			self.sequencer.retire();
			self.popup.close();
			trace!(session = self.id.get(), text_len = self.view_text.len(), "typeahead.input.below_min_length");
		} else if let Some(query) = self.debounce.on_text_changed(&self.view_text, self.clock.now()) {
			self.lookup(query);
		}
		self.notify();
	}

	/// Fires the debounce trigger if its deadline has passed.
	///
	/// Returns whether a lookup was issued.
	pub fn fire_due(&mut self) -> bool {
		self.sync_external();
		let Some(query) = self.debounce.take_due(self.clock.now()) else {
			return false;
		};
		self.lookup(query);
		self.notify();
		true
	}

	/// Hands out deferred lookups issued since the last call.
	pub fn take_deferred(&mut self) -> Vec<DeferredLookup<T>> {
		std::mem::take(&mut self.deferred)
	}

	/// Applies the outcome of request `id`.
	///
	/// Results of superseded requests are dropped. A rejection reads as "no
	/// matches" (or leaves the popup alone under [`RejectPolicy::Keep`]).
	pub fn settle(&mut self, id: RequestId, result: Result<Vec<T>, SourceError>) -> Settlement {
		self.sync_external();
		let settlement = self.apply(id, result);
		self.notify();
		settlement
	}

	/// Handles a key pressed in the input.
	///
	/// Hot keys are consumed only while the popup is open.
	pub fn handle_key(&mut self, key: Key) -> Result<KeyOutcome, SelectError> {
		self.sync_external();
		if !self.popup.is_open() || !key.is_hot() {
			return Ok(KeyOutcome::Ignored);
		}
		match key {
			Key::Down => {
				self.popup.next();
			}
			Key::Up => {
				self.popup.prev();
			}
			Key::Escape => {
				self.popup.close();
				trace!(session = self.id.get(), "typeahead.popup.escape");
			}
			Key::Enter | Key::Tab => {
				if let Some(selected) = self.popup.take_active() {
					self.select(selected)?;
				}
				return Ok(KeyOutcome::Handled);
			}
			Key::Other => return Ok(KeyOutcome::Ignored),
		}
		self.notify();
		Ok(KeyOutcome::Handled)
	}

	/// Pointer moved over match `index`.
	pub fn hover(&mut self, index: usize) {
		self.sync_external();
		if self.popup.hover(index) {
			self.notify();
		}
	}

	/// Pointer pressed somewhere.
	pub fn pointer_down(&mut self, target: PointerTarget) -> Result<(), SelectError> {
		self.sync_external();
		match target {
			PointerTarget::Input => {}
			PointerTarget::Match(index) => {
				if let Some(selected) = self.popup.take(index) {
					return self.select(selected);
				}
			}
			PointerTarget::Outside => {
				if self.popup.close() {
					trace!(session = self.id.get(), "typeahead.popup.click_outside");
				}
			}
		}
		self.notify();
		Ok(())
	}

	/// Commits `selected`: writes its model value and label, clears the
	/// editable error, closes the popup, then runs the on-select hook.
	///
	/// The writes do not count as typing: no lookup is triggered and pending
	/// lookups are superseded. A hook error is returned as-is, after the
	/// session state has been committed.
	pub fn select(&mut self, selected: Match<T, M>) -> Result<(), SelectError> {
		let label = self.committer.display_label(&selected, &self.expr);
		self.debounce.cancel();
		self.sequencer.retire();
		self.popup.close();
		self.view_text = label;
		self.committer.write(&selected, &mut *self.binding, &mut self.gate);
		debug!(session = self.id.get(), index = selected.index(), label = %selected.label(), "typeahead.select");
		self.notify();
		self.committer.notify(&selected)
	}

	/// The host changed the model value. Re-renders the text without looking
	/// up or opening the popup.
	///
	/// Hosts whose binding announces its changes never need to call this.
	pub fn on_external_change(&mut self, value: ModelValue<M>) {
		self.view_text = self.render_model(&value);
		trace!(session = self.id.get(), text_len = self.view_text.len(), "typeahead.model.external");
		self.notify();
	}

	/// Tears the session down. Pending work is dropped and later settlements
	/// are ignored.
	pub fn teardown(&mut self) {
		self.debounce.cancel();
		self.sequencer.retire();
		self.deferred.clear();
		self.popup.close();
		self.focused = false;
		self.release_slot();
		self.torn_down = true;
		debug!(session = self.id.get(), "typeahead.teardown");
		self.notify();
	}

	/// Dispatches a queued host event.
	pub fn handle(&mut self, event: SessionEvent<M>) -> Result<(), SelectError> {
		match event {
			SessionEvent::Focus => self.focus(),
			SessionEvent::Blur => self.blur(),
			SessionEvent::Input(text) => self.input_text(text),
			SessionEvent::Key(key) => {
				self.handle_key(key)?;
			}
			SessionEvent::Hover(index) => self.hover(index),
			SessionEvent::Pointer(target) => self.pointer_down(target)?,
			SessionEvent::ExternalChange(value) => self.on_external_change(value),
			SessionEvent::Teardown => self.teardown(),
		}
		Ok(())
	}

	/// Switches time source. A pending debounce trigger restarts its wait on
	/// the new clock.
	pub(crate) fn set_clock(&mut self, clock: Rc<dyn Clock>) {
		self.debounce.rearm(clock.now());
		self.clock = clock;
	}

	pub(crate) fn has_custom_clock(&self) -> bool {
		self.clock_set
	}

	/// Adds another listener for host-side model changes.
	pub(crate) fn watch_external(&mut self, notify: ExternalChangeFn) {
		self.binding.on_external_change(notify);
	}

	fn lookup(&mut self, query: String) {
		let id = self.sequencer.issue(&query);
		debug!(session = self.id.get(), request_id = id.get(), text_len = query.len(), "typeahead.lookup.issue");
		match self.source.lookup(&query) {
			Lookup::Ready(items) => {
				self.apply(id, Ok(items));
			}
			Lookup::Deferred(future) => self.deferred.push(DeferredLookup { id, query, future }),
		}
	}

	fn apply(&mut self, id: RequestId, result: Result<Vec<T>, SourceError>) -> Settlement {
		if self.sequencer.settle(id) == Settlement::Stale {
			debug!(session = self.id.get(), request_id = id.get(), current = self.sequencer.current().get(), "typeahead.lookup.stale");
			return Settlement::Stale;
		}
		match result {
			Ok(items) if !items.is_empty() && self.focused => {
				let matches = self.expr.to_matches(items);
				debug!(session = self.id.get(), request_id = id.get(), matches = matches.len(), "typeahead.lookup.settle");
				self.popup.open(matches);
				self.revision += 1;
			}
			Ok(items) => {
				debug!(session = self.id.get(), request_id = id.get(), matches = items.len(), focused = self.focused, "typeahead.lookup.settle_closed");
				self.popup.close();
			}
			Err(error) => {
				warn!(session = self.id.get(), request_id = id.get(), error = %error, "typeahead.lookup.rejected");
				if self.config.on_reject == RejectPolicy::Close {
					self.popup.close();
				}
			}
		}
		Settlement::Current
	}

	fn render_model(&self, value: &ModelValue<M>) -> String {
		match value {
			ModelValue::Value(model) => self.expr.view_text(model).unwrap_or_else(|| {
				warn!(session = self.id.get(), "typeahead.model.no_text_form");
				String::new()
			}),
			ModelValue::FreeText(text) => text.clone(),
			ModelValue::Empty | ModelValue::Invalid => String::new(),
		}
	}

	fn release_slot(&mut self) {
		if let Some(slots) = &self.slots {
			slots.release(self.id);
		}
	}

	fn in_shared_slot(&self) -> bool {
		self.config.append_to_body && self.slots.as_ref().is_some_and(|s| s.is_owned_by(self.id))
	}

	fn stamp(&self) -> RenderStamp {
		RenderStamp {
			revision: self.revision,
			active_index: self.popup.active_index(),
			is_open: self.popup.is_open(),
			loading: self.sequencer.is_loading(),
		}
	}

	fn notify(&mut self) {
		let stamp = self.stamp();
		if stamp == self.last_stamp {
			return;
		}
		self.last_stamp = stamp;
		trace!(
			session = self.id.get(),
			open = stamp.is_open,
			active = ?stamp.active_index,
			loading = stamp.loading,
			"typeahead.render"
		);
		if self.observers.is_empty() {
			return;
		}
		let mut observers = std::mem::take(&mut self.observers);
		let view = self.view();
		for observer in &mut observers {
			observer.render(&view);
		}
		self.observers = observers;
	}
}

fn as_item<T>(model: &T) -> Option<&T> {
	Some(model)
}

type ModelAsItemFn<T, M> = Box<dyn for<'a> Fn(&'a M) -> Option<&'a T>>;

/// Builds a [`Session`], checking its configuration.
///
/// ```ignore
/// let binding = MemoryBinding::default();
/// let mut session = SessionBuilder::new()
/// 	.source(ListSource::new(["foo", "bar", "baz"].map(String::from)))
/// 	.binding(binding.clone())
/// 	.build()?;
/// ```
pub struct SessionBuilder<T, M> {
	config: TypeaheadConfig,
	source: Option<Box<dyn Source<T>>>,
	label: Option<Rc<dyn Fn(&T) -> String>>,
	model: ModelFn<T, M>,
	model_as_item: Option<ModelAsItemFn<T, M>>,
	label_from_model: Option<ModelLabelFn<M>>,
	model_text: Option<FormatFn<M>>,
	input_formatter: Option<FormatFn<M>>,
	on_select: Option<OnSelectFn<T, M>>,
	binding: Option<Box<dyn Binding<M>>>,
	observers: Vec<Box<dyn RenderObserver<T, M>>>,
	slots: Option<SlotRegistry>,
	clock: Option<Rc<dyn Clock>>,
}

impl<T: Clone + fmt::Display + 'static> SessionBuilder<T, T> {
	/// Items are their own model values and are labelled by their text form.
	pub fn new() -> Self {
		Self::identity().label(T::to_string).model_text(T::to_string)
	}
}

impl<T: Clone + fmt::Display + 'static> Default for SessionBuilder<T, T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: Clone + 'static> SessionBuilder<T, T> {
	/// Items are their own model values; labels come from [`label`](Self::label).
	pub fn identity() -> Self {
		let mut builder = Self::with_model(T::clone);
		builder.model_as_item = Some(Box::new(as_item::<T>));
		builder
	}
}

impl<T: 'static, M: Clone + fmt::Display + 'static> SessionBuilder<T, M> {
	/// Model values are derived from items and fall back to their own text
	/// form when no label can be resolved for them.
	pub fn mapped(model: impl Fn(&T) -> M + 'static) -> Self {
		Self::with_model(model).model_text(M::to_string)
	}
}

impl<T: 'static, M: Clone + 'static> SessionBuilder<T, M> {
	/// Model values are derived from items by `model`.
	pub fn with_model(model: impl Fn(&T) -> M + 'static) -> Self {
		Self {
			config: TypeaheadConfig::default(),
			source: None,
			label: None,
			model: Box::new(model),
			model_as_item: None,
			label_from_model: None,
			model_text: None,
			input_formatter: None,
			on_select: None,
			binding: None,
			observers: Vec::new(),
			slots: None,
			clock: None,
		}
	}

	/// Plain options.
	pub fn config(mut self, config: TypeaheadConfig) -> Self {
		self.config = config;
		self
	}

	/// Where items come from.
	pub fn source(mut self, source: impl Source<T> + 'static) -> Self {
		self.source = Some(Box::new(source));
		self
	}

	/// Label expression for items.
	pub fn label(mut self, label: impl Fn(&T) -> String + 'static) -> Self {
		self.label = Some(Rc::new(label));
		self
	}

	/// Label expression for bound model values, used before any lookup.
	pub fn label_from_model(mut self, label: impl Fn(&M) -> Option<String> + 'static) -> Self {
		self.label_from_model = Some(Box::new(label));
		self
	}

	/// Text form of model values, the last resort for display text.
	pub fn model_text(mut self, text: impl Fn(&M) -> String + 'static) -> Self {
		self.model_text = Some(Box::new(text));
		self
	}

	/// Formatter applied to model values before display. Takes precedence
	/// over every label expression.
	pub fn input_formatter(mut self, format: impl Fn(&M) -> String + 'static) -> Self {
		self.input_formatter = Some(Box::new(format));
		self
	}

	/// Hook run after a selection is committed.
	pub fn on_select(mut self, hook: impl FnMut(&T, &M, &str) -> Result<(), HookError> + 'static) -> Self {
		self.on_select = Some(Box::new(hook));
		self
	}

	/// External model store.
	pub fn binding(mut self, binding: impl Binding<M> + 'static) -> Self {
		self.binding = Some(Box::new(binding));
		self
	}

	/// Adds a render observer.
	pub fn observer(mut self, observer: impl RenderObserver<T, M> + 'static) -> Self {
		self.observers.push(Box::new(observer));
		self
	}

	/// Shared popup slot, used when `append_to_body` is set.
	pub fn slots(mut self, slots: SlotRegistry) -> Self {
		self.slots = Some(slots);
		self
	}

	/// Time source for debounce deadlines. Defaults to [`SystemClock`].
	///
	/// Only meaningful for sessions driven by hand. [`Driver::new`](crate::Driver::new)
	/// always switches the session to [`TokioClock`](crate::TokioClock), since
	/// it sleeps on tokio's timer until each deadline.
	pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
		self.clock = Some(Rc::new(clock));
		self
	}

	/// Validates the configuration and binds the session.
	///
	/// The initial model value is rendered into the input text without
	/// opening the popup or issuing a lookup.
	pub fn build(self) -> Result<Session<T, M>, ConfigError> {
		let Self {
			config,
			source,
			label,
			model,
			model_as_item,
			label_from_model,
			model_text,
			input_formatter,
			on_select,
			binding,
			observers,
			slots,
			clock,
		} = self;

		let config = config.validated()?;
		let source = source.ok_or(ConfigError::MissingSource)?;
		let label = label.ok_or(ConfigError::MissingLabel)?;
		let mut binding = binding.ok_or(ConfigError::MissingBinding)?;
		let clock_set = clock.is_some();
		let clock = clock.unwrap_or_else(|| Rc::new(SystemClock) as Rc<dyn Clock>);

		let external = Rc::new(Cell::new(false));
		let dirty = Rc::clone(&external);
		binding.on_external_change(Box::new(move || dirty.set(true)));

		let label_from_model = label_from_model.or_else(|| {
			let as_item = model_as_item?;
			let label = Rc::clone(&label);
			Some(Box::new(move |model: &M| as_item(model).map(|item| label(item))) as ModelLabelFn<M>)
		});
		let item_label = Rc::clone(&label);
		let expr = Expressions::new(
			Box::new(move |item: &T| item_label(item)),
			model,
			label_from_model,
			model_text,
			input_formatter,
		);

		let mut session = Session {
			id: SessionId::next(),
			gate: ValidationGate::new(config.editable),
			debounce: Debouncer::new(config.wait()),
			config,
			source,
			expr,
			committer: SelectionCommitter::new(on_select),
			binding,
			observers,
			slots,
			clock,
			sequencer: RequestSequencer::new(),
			popup: PopupState::default(),
			view_text: String::new(),
			focused: false,
			deferred: Vec::new(),
			revision: 0,
			last_stamp: RenderStamp {
				revision: 0,
				active_index: None,
				is_open: false,
				loading: false,
			},
			torn_down: false,
			external,
			clock_set,
		};
		let initial = session.binding.read();
		session.view_text = session.render_model(&initial);
		debug!(session = session.id.get(), text_len = session.view_text.len(), "typeahead.bind");
		Ok(session)
	}
}

#[cfg(test)]
mod tests;
