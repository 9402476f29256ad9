use std::cell::RefCell;
use std::time::Duration;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use crate::binding::{EDITABLE_ERROR, MemoryBinding};
use crate::debounce::ManualClock;
use crate::source::ListSource;

#[derive(Debug, Clone, PartialEq)]
struct State {
	code: &'static str,
	name: &'static str,
}

fn states() -> Vec<State> {
	vec![
		State {
			code: "AL",
			name: "Alaska",
		},
		State {
			code: "CL",
			name: "California",
		},
	]
}

fn state_source() -> impl FnMut(&str) -> Lookup<State> {
	|text: &str| {
		let needle = text.to_lowercase();
		Lookup::Ready(states().into_iter().filter(|s| s.name.to_lowercase().contains(&needle)).collect())
	}
}

fn words() -> ListSource<String> {
	ListSource::new(["foo", "bar", "baz"].map(String::from))
}

fn basic(config: TypeaheadConfig) -> (Session<String, String>, MemoryBinding<String>) {
	let binding = MemoryBinding::default();
	let session = SessionBuilder::new()
		.config(config)
		.source(words())
		.binding(binding.clone())
		.build()
		.unwrap();
	(session, binding)
}

fn type_text<T, M: Clone>(session: &mut Session<T, M>, text: &str) {
	session.focus();
	session.input_text(text);
}

fn labels<T, M: Clone>(session: &Session<T, M>) -> Vec<String> {
	session.matches().iter().map(|m| m.label().to_owned()).collect()
}

fn deferred_session() -> (Session<String, String>, MemoryBinding<String>) {
	let binding = MemoryBinding::default();
	let session = SessionBuilder::<String, String>::new()
		.source(|_: &str| Lookup::deferred(std::future::pending()))
		.binding(binding.clone())
		.build()
		.unwrap();
	(session, binding)
}

fn owned(items: &[&str]) -> Vec<String> {
	items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn closed_by_default() {
	let (session, _) = basic(TypeaheadConfig::default());
	assert!(!session.is_open());
	assert_eq!(session.active_index(), None);
	assert!(!session.is_loading());
	assert_eq!(session.view_text(), "");
}

#[test]
fn initial_render_uses_label_expression() {
	let binding = MemoryBinding::new(ModelValue::Value(states()[0].clone()));
	let session = SessionBuilder::identity()
		.label(|s: &State| s.name.to_owned())
		.source(state_source())
		.binding(binding.clone())
		.build()
		.unwrap();

	assert_eq!(session.view_text(), "Alaska");
	assert!(!session.is_open());
	assert_eq!(session.request_id().get(), 0);
	assert_eq!(binding.writes(), 0);
}

#[test]
fn initial_render_falls_back_to_model_text() {
	let binding = MemoryBinding::new(ModelValue::Value("AL".to_owned()));
	let session = SessionBuilder::mapped(|s: &State| s.code.to_owned())
		.label(|s: &State| format!("{}{}", s.name, s.code))
		.source(state_source())
		.binding(binding)
		.build()
		.unwrap();

	assert_eq!(session.view_text(), "AL");
}

#[test]
fn initial_render_prefers_label_from_model() {
	let binding = MemoryBinding::new(ModelValue::Value("CL".to_owned()));
	let session = SessionBuilder::mapped(|s: &State| s.code.to_owned())
		.label(|s: &State| s.name.to_owned())
		.label_from_model(|code: &String| states().into_iter().find(|s| s.code == code.as_str()).map(|s| s.name.to_owned()))
		.source(state_source())
		.binding(binding)
		.build()
		.unwrap();

	assert_eq!(session.view_text(), "California");
}

#[test]
fn initial_render_prefers_input_formatter() {
	let binding = MemoryBinding::new(ModelValue::Value(states()[0].clone()));
	let session = SessionBuilder::identity()
		.label(|s: &State| s.name.to_owned())
		.input_formatter(|s: &State| s.code.to_owned())
		.source(state_source())
		.binding(binding.clone())
		.build()
		.unwrap();

	assert_eq!(session.view_text(), "AL");
	assert_eq!(binding.value(), ModelValue::Value(states()[0].clone()));
}

#[test]
fn initial_render_of_unset_model_is_blank() {
	let session = SessionBuilder::identity()
		.label(|s: &State| format!("{} {}", s.name, s.code))
		.source(state_source())
		.binding(MemoryBinding::default())
		.build()
		.unwrap();

	assert_eq!(session.view_text(), "");
}

#[test]
fn external_model_change_never_opens_popup() {
	let (mut session, _) = basic(TypeaheadConfig::default());
	session.focus();
	session.on_external_change(ModelValue::Value("foo".into()));

	assert_eq!(session.view_text(), "foo");
	assert!(!session.is_open());
	assert_eq!(session.request_id().get(), 0);
}

#[test]
fn opens_and_closes_based_on_matches() {
	let (mut session, _) = basic(TypeaheadConfig::default());

	type_text(&mut session, "ba");
	assert!(session.is_open());
	assert_eq!(labels(&session), owned(&["bar", "baz"]));
	assert_eq!(session.active_index(), Some(0));

	session.input_text("");
	assert!(!session.is_open());
	assert!(session.matches().is_empty());
	assert_eq!(session.active_index(), None);
}

#[test]
fn text_below_min_length_is_not_looked_up() {
	let queries = Rc::new(RefCell::new(Vec::<String>::new()));
	let log = Rc::clone(&queries);
	let mut session = SessionBuilder::new()
		.config(TypeaheadConfig {
			min_length: 2,
			..Default::default()
		})
		.source(move |text: &str| {
			log.borrow_mut().push(text.to_owned());
			Lookup::Ready(owned(&["bar", "baz"]))
		})
		.binding(MemoryBinding::default())
		.build()
		.unwrap();

	type_text(&mut session, "b");
	assert!(!session.is_open());
	assert!(!session.is_loading());
	assert!(queries.borrow().is_empty());

	session.input_text("ba");
	assert!(session.is_open());
	assert_eq!(*queries.borrow(), owned(&["ba"]));
}

#[test]
fn custom_model_mapping_is_written_on_select() {
	let binding = MemoryBinding::default();
	let mut session = SessionBuilder::mapped(|item: &String| format!("prefix{item}"))
		.label(String::clone)
		.source(words())
		.binding(binding.clone())
		.build()
		.unwrap();

	type_text(&mut session, "f");
	session.handle_key(Key::Enter).unwrap();

	assert_eq!(binding.value(), ModelValue::Value("prefixfoo".into()));
	assert_eq!(session.view_text(), "foo");
}

#[test]
fn custom_label_function_renders_matches() {
	let mut session = SessionBuilder::new()
		.label(|item: &String| format!("prefix{item}"))
		.source(words())
		.binding(MemoryBinding::default())
		.build()
		.unwrap();

	type_text(&mut session, "fo");
	assert_eq!(labels(&session), owned(&["prefixfoo"]));
	assert_eq!(session.matches()[0].model(), "foo");
}

#[test]
fn editable_input_binds_free_text() {
	let (mut session, binding) = basic(TypeaheadConfig::default());
	type_text(&mut session, "not in matches");

	assert_eq!(binding.value(), ModelValue::FreeText("not in matches".into()));
	assert!(!binding.has_error(EDITABLE_ERROR));
}

#[test]
fn non_editable_free_text_is_invalid_until_a_match_is_selected() {
	let (mut session, binding) = basic(TypeaheadConfig {
		editable: false,
		..Default::default()
	});

	type_text(&mut session, "not in matches");
	assert_eq!(binding.value(), ModelValue::Invalid);
	assert!(binding.has_error(EDITABLE_ERROR));
	assert!(session.is_invalid());

	session.input_text("foo");
	session.handle_key(Key::Enter).unwrap();
	assert_eq!(binding.value(), ModelValue::Value("foo".into()));
	assert!(!binding.has_error(EDITABLE_ERROR));
	assert!(!session.is_invalid());
}

#[test]
fn blank_input_is_exempt_from_editable_check() {
	let (mut session, binding) = basic(TypeaheadConfig {
		editable: false,
		..Default::default()
	});

	type_text(&mut session, "not in matches");
	session.input_text("");

	assert_eq!(binding.value(), ModelValue::Empty);
	assert!(!binding.has_error(EDITABLE_ERROR));
}

#[test]
fn lookup_waits_for_debounce() {
	let clock = ManualClock::new();
	let mut session = SessionBuilder::new()
		.config(TypeaheadConfig {
			wait_ms: 200,
			..Default::default()
		})
		.source(words())
		.binding(MemoryBinding::default())
		.clock(clock.clone())
		.build()
		.unwrap();

	type_text(&mut session, "foo");
	assert!(!session.is_open());
	assert_eq!(session.next_deadline(), Some(clock.now() + Duration::from_millis(200)));
	assert!(!session.fire_due());

	clock.advance(Duration::from_millis(200));
	assert!(session.fire_due());
	assert!(session.is_open());
	assert_eq!(labels(&session), owned(&["foo"]));
	assert_eq!(session.next_deadline(), None);
}

fn recording_session(clock: &ManualClock) -> (Session<String, String>, Rc<RefCell<Vec<String>>>) {
	let queries = Rc::new(RefCell::new(Vec::<String>::new()));
	let log = Rc::clone(&queries);
	let session = SessionBuilder::new()
		.config(TypeaheadConfig {
			wait_ms: 200,
			..Default::default()
		})
		.source(move |text: &str| {
			log.borrow_mut().push(text.to_owned());
			Lookup::Ready(owned(&["foo", "bar", "baz"]))
		})
		.binding(MemoryBinding::default())
		.clock(clock.clone())
		.build()
		.unwrap();
	(session, queries)
}

#[test]
fn typing_within_wait_cancels_earlier_trigger() {
	let clock = ManualClock::new();
	let (mut session, queries) = recording_session(&clock);

	type_text(&mut session, "first");
	clock.advance(Duration::from_millis(100));
	session.input_text("second");
	clock.advance(Duration::from_millis(150));
	assert!(!session.fire_due());

	clock.advance(Duration::from_millis(50));
	assert!(session.fire_due());
	assert_eq!(*queries.borrow(), owned(&["second"]));
}

#[test]
fn typing_after_wait_looks_up_again() {
	let clock = ManualClock::new();
	let (mut session, queries) = recording_session(&clock);

	type_text(&mut session, "first");
	clock.advance(Duration::from_millis(200));
	session.fire_due();

	session.input_text("second");
	clock.advance(Duration::from_millis(200));
	session.fire_due();

	assert_eq!(*queries.borrow(), owned(&["first", "second"]));
}

#[test]
fn enter_selects_active_match() {
	let (mut session, binding) = basic(TypeaheadConfig::default());
	type_text(&mut session, "b");

	assert_eq!(session.handle_key(Key::Enter).unwrap(), KeyOutcome::Handled);
	assert_eq!(binding.value(), ModelValue::Value("bar".into()));
	assert_eq!(session.view_text(), "bar");
	assert!(!session.is_open());
	assert!(session.matches().is_empty());
}

#[test]
fn tab_selects_active_match() {
	let (mut session, binding) = basic(TypeaheadConfig::default());
	type_text(&mut session, "b");

	assert_eq!(session.handle_key(Key::Tab).unwrap(), KeyOutcome::Handled);
	assert_eq!(binding.value(), ModelValue::Value("bar".into()));
	assert_eq!(session.view_text(), "bar");
	assert!(!session.is_open());
}

#[test]
fn click_selects_match() {
	let (mut session, binding) = basic(TypeaheadConfig::default());
	type_text(&mut session, "b");

	session.pointer_down(PointerTarget::Match(1)).unwrap();
	assert_eq!(binding.value(), ModelValue::Value("baz".into()));
	assert_eq!(session.view_text(), "baz");
	assert!(!session.is_open());
	assert!(session.is_focused());
}

#[test]
fn on_select_receives_item_model_and_label() {
	let seen = Rc::new(RefCell::new(None));
	let sink = Rc::clone(&seen);
	let binding = MemoryBinding::default();
	let mut session = SessionBuilder::mapped(|s: &State| s.code.to_owned())
		.label(|s: &State| s.name.to_owned())
		.source(state_source())
		.binding(binding.clone())
		.on_select(move |item: &State, model: &String, label: &str| {
			*sink.borrow_mut() = Some((item.clone(), model.clone(), label.to_owned()));
			Ok(())
		})
		.build()
		.unwrap();

	type_text(&mut session, "Alas");
	session.handle_key(Key::Enter).unwrap();

	assert_eq!(binding.value(), ModelValue::Value("AL".into()));
	assert_eq!(*seen.borrow(), Some((states()[0].clone(), "AL".to_owned(), "Alaska".to_owned())));
}

#[test]
fn selection_displays_match_label() {
	let mut session = SessionBuilder::mapped(|s: &State| s.code.to_owned())
		.label(|s: &State| s.name.to_owned())
		.source(state_source())
		.binding(MemoryBinding::default())
		.build()
		.unwrap();

	type_text(&mut session, "Alas");
	session.handle_key(Key::Enter).unwrap();
	assert_eq!(session.view_text(), "Alaska");
}

#[test]
fn selection_prefers_input_formatter_for_display() {
	let binding = MemoryBinding::default();
	let mut session = SessionBuilder::mapped(|s: &State| s.code.to_owned())
		.label(|s: &State| s.name.to_owned())
		.input_formatter(|code: &String| code.clone())
		.source(state_source())
		.binding(binding.clone())
		.build()
		.unwrap();

	type_text(&mut session, "Alas");
	session.handle_key(Key::Enter).unwrap();
	assert_eq!(binding.value(), ModelValue::Value("AL".into()));
	assert_eq!(session.view_text(), "AL");
}

#[test]
fn selection_hook_error_propagates_after_commit() {
	let binding = MemoryBinding::default();
	let mut session = SessionBuilder::new()
		.source(words())
		.binding(binding.clone())
		.on_select(|_: &String, _: &String, _: &str| Err("host failure".into()))
		.build()
		.unwrap();

	type_text(&mut session, "foo");
	let err = session.handle_key(Key::Enter).unwrap_err();

	assert_eq!(err.to_string(), "host failure");
	assert_eq!(binding.value(), ModelValue::Value("foo".into()));
	assert!(!session.is_open());
}

#[test]
fn selecting_twice_is_idempotent() {
	let (mut session, binding) = basic(TypeaheadConfig::default());
	type_text(&mut session, "foo");
	let chosen = session.active_match().cloned().unwrap();

	session.select(chosen.clone()).unwrap();
	let first = (binding.value(), session.view_text().to_owned());
	session.select(chosen).unwrap();
	let second = (binding.value(), session.view_text().to_owned());

	assert_eq!(first, second);
	assert_eq!(session.handle_key(Key::Enter).unwrap(), KeyOutcome::Ignored);
}

#[test]
fn up_and_down_wrap_around() {
	let (mut session, _) = basic(TypeaheadConfig::default());
	type_text(&mut session, "b");
	assert_eq!(session.active_index(), Some(0));

	session.handle_key(Key::Down).unwrap();
	assert_eq!(session.active_index(), Some(1));
	session.handle_key(Key::Down).unwrap();
	assert_eq!(session.active_index(), Some(0));
	session.handle_key(Key::Up).unwrap();
	assert_eq!(session.active_index(), Some(1));
	session.handle_key(Key::Up).unwrap();
	assert_eq!(session.active_index(), Some(0));
	assert!(session.is_open());
}

#[test]
fn escape_closes_popup() {
	let (mut session, binding) = basic(TypeaheadConfig::default());
	type_text(&mut session, "b");

	assert_eq!(session.handle_key(Key::Escape).unwrap(), KeyOutcome::Handled);
	assert!(!session.is_open());
	assert_eq!(binding.value(), ModelValue::FreeText("b".into()));
}

#[test]
fn keys_are_ignored_while_closed() {
	let (mut session, binding) = basic(TypeaheadConfig::default());
	session.focus();

	for key in [Key::Up, Key::Down, Key::Enter, Key::Tab, Key::Escape] {
		assert_eq!(session.handle_key(key).unwrap(), KeyOutcome::Ignored);
	}
	assert_eq!(binding.writes(), 0);
}

#[test]
fn other_keys_are_never_consumed() {
	let (mut session, _) = basic(TypeaheadConfig::default());
	type_text(&mut session, "b");
	assert_eq!(session.handle_key(Key::Other).unwrap(), KeyOutcome::Ignored);
	assert!(session.is_open());
}

#[test]
fn hover_highlights_match() {
	let (mut session, _) = basic(TypeaheadConfig::default());
	type_text(&mut session, "b");

	session.hover(1);
	assert_eq!(session.active_index(), Some(1));
	assert!(session.is_open());
}

#[test]
fn click_on_input_keeps_popup_open() {
	let (mut session, _) = basic(TypeaheadConfig::default());
	type_text(&mut session, "b");

	session.pointer_down(PointerTarget::Input).unwrap();
	assert!(session.is_open());
	assert_eq!(session.active_index(), Some(0));
}

#[test]
fn click_outside_closes_popup() {
	let (mut session, _) = basic(TypeaheadConfig::default());
	type_text(&mut session, "b");

	session.pointer_down(PointerTarget::Outside).unwrap();
	assert!(!session.is_open());
}

#[test]
fn deferred_results_open_popup() {
	let (mut session, _) = deferred_session();
	type_text(&mut session, "c");
	assert!(!session.is_open());
	assert!(session.is_loading());

	let lookups = session.take_deferred();
	assert_eq!(lookups.len(), 1);
	assert_eq!(lookups[0].query, "c");

	let settlement = session.settle(lookups[0].id, Ok(owned(&["good", "stuff"])));
	assert_eq!(settlement, Settlement::Current);
	assert!(session.is_open());
	assert_eq!(session.active_index(), Some(0));
	assert_eq!(labels(&session), owned(&["good", "stuff"]));
	assert!(!session.is_loading());
}

#[test]
fn rejected_lookup_stays_closed() {
	let (mut session, _) = deferred_session();
	type_text(&mut session, "c");
	let id = session.take_deferred()[0].id;

	session.settle(id, Err(SourceError::Rejected("fail".into())));
	assert!(!session.is_open());
	assert!(!session.is_loading());
}

#[test]
fn rejection_closes_displayed_matches_by_default() {
	let (mut session, _) = deferred_session();
	type_text(&mut session, "c");
	let first = session.take_deferred()[0].id;
	session.settle(first, Ok(owned(&["cat"])));

	session.input_text("ca");
	let second = session.take_deferred()[0].id;
	session.settle(second, Err(SourceError::Rejected("offline".into())));
	assert!(!session.is_open());
}

#[test]
fn keep_policy_leaves_matches_on_rejection() {
	let mut session = SessionBuilder::<String, String>::new()
		.config(TypeaheadConfig {
			on_reject: RejectPolicy::Keep,
			..Default::default()
		})
		.source(|_: &str| Lookup::deferred(std::future::pending()))
		.binding(MemoryBinding::default())
		.build()
		.unwrap();

	type_text(&mut session, "c");
	let first = session.take_deferred()[0].id;
	session.settle(first, Ok(owned(&["cat", "cow"])));

	session.input_text("ca");
	let second = session.take_deferred()[0].id;
	session.settle(second, Err(SourceError::Rejected("offline".into())));

	assert!(session.is_open());
	assert_eq!(labels(&session), owned(&["cat", "cow"]));
	assert!(!session.is_loading());
}

#[test]
fn stale_result_is_discarded() {
	let (mut session, _) = deferred_session();
	type_text(&mut session, "a");
	session.input_text("ab");
	let lookups = session.take_deferred();
	let (older, newer) = (lookups[0].id, lookups[1].id);

	assert_eq!(session.settle(newer, Ok(owned(&["abc"]))), Settlement::Current);
	assert_eq!(session.settle(older, Ok(owned(&["a1", "a2"]))), Settlement::Stale);

	assert_eq!(labels(&session), owned(&["abc"]));
	assert!(!session.is_loading());
}

#[test]
fn stale_result_does_not_clear_loading() {
	let (mut session, _) = deferred_session();
	type_text(&mut session, "a");
	session.input_text("ab");
	let lookups = session.take_deferred();

	session.settle(lookups[0].id, Ok(owned(&["a1"])));
	assert!(session.is_loading());
	assert!(!session.is_open());
}

#[test]
fn result_after_blur_does_not_open() {
	let (mut session, _) = deferred_session();
	type_text(&mut session, "match");
	let id = session.take_deferred()[0].id;

	session.blur();
	assert!(session.is_loading());

	session.settle(id, Ok(owned(&["match"])));
	assert!(!session.is_open());
	assert!(!session.is_loading());
}

#[test]
fn deleting_below_min_length_clears_loading() {
	let mut session = SessionBuilder::<String, String>::new()
		.config(TypeaheadConfig {
			min_length: 2,
			..Default::default()
		})
		.source(|_: &str| Lookup::deferred(std::future::pending()))
		.binding(MemoryBinding::default())
		.build()
		.unwrap();

	type_text(&mut session, "match");
	assert!(session.is_loading());
	let id = session.take_deferred()[0].id;

	session.input_text("m");
	assert!(!session.is_loading());

	assert_eq!(session.settle(id, Ok(owned(&["match"]))), Settlement::Stale);
	assert!(!session.is_open());
}

#[test]
fn observers_see_only_visible_changes() {
	let log = Rc::new(RefCell::new(Vec::new()));
	let sink = Rc::clone(&log);
	let mut session = SessionBuilder::new()
		.source(words())
		.binding(MemoryBinding::default())
		.observer(move |view: &RenderView<'_, String, String>| {
			sink.borrow_mut().push((view.is_open, view.active_index, view.matches.len(), view.loading));
		})
		.build()
		.unwrap();

	session.focus();
	assert!(log.borrow().is_empty());

	session.input_text("b");
	session.handle_key(Key::Down).unwrap();
	session.hover(1);
	session.handle_key(Key::Escape).unwrap();

	assert_eq!(
		*log.borrow(),
		vec![(true, Some(0), 2, false), (true, Some(1), 2, false), (false, None, 0, false)]
	);
}

#[test]
fn teardown_ignores_late_results() {
	let (mut session, _) = deferred_session();
	type_text(&mut session, "c");
	let id = session.take_deferred()[0].id;

	session.teardown();
	assert!(session.is_torn_down());
	assert_eq!(session.settle(id, Ok(owned(&["cat"]))), Settlement::Stale);
	assert!(!session.is_open());

	session.focus();
	session.input_text("ca");
	assert!(!session.has_deferred());
	assert!(!session.is_focused());
}

#[test]
fn select_supersedes_pending_lookup() {
	let (mut session, _) = deferred_session();
	type_text(&mut session, "c");
	let first = session.take_deferred()[0].id;
	session.settle(first, Ok(owned(&["cat"])));

	session.input_text("ca");
	let second = session.take_deferred()[0].id;
	session.pointer_down(PointerTarget::Match(0)).unwrap();

	assert_eq!(session.settle(second, Ok(owned(&["cat", "cart"]))), Settlement::Stale);
	assert!(!session.is_open());
	assert_eq!(session.view_text(), "cat");
}

#[test]
fn shared_slot_follows_focus() {
	let slots = SlotRegistry::new();
	let config = TypeaheadConfig {
		append_to_body: true,
		..Default::default()
	};
	let build = || {
		SessionBuilder::new()
			.config(config.clone())
			.source(words())
			.binding(MemoryBinding::default())
			.slots(slots.clone())
			.build()
			.unwrap()
	};
	let mut first = build();
	let mut second = build();

	type_text(&mut first, "ba");
	assert!(first.view().in_shared_slot);

	first.blur();
	second.focus();
	assert_eq!(slots.owner(), Some(second.id()));
	assert!(!first.view().in_shared_slot);
	assert!(second.view().in_shared_slot);

	first.focus();
	assert_eq!(slots.owner(), Some(first.id()));
	assert_eq!(slots.transfers(), 1);

	first.teardown();
	assert_eq!(slots.owner(), None);
}

#[test]
fn local_popup_never_touches_shared_slot() {
	let slots = SlotRegistry::new();
	let mut session = SessionBuilder::new()
		.source(words())
		.binding(MemoryBinding::default())
		.slots(slots.clone())
		.build()
		.unwrap();

	type_text(&mut session, "ba");
	assert_eq!(slots.owner(), None);
	assert!(!session.view().in_shared_slot);
}

#[test]
fn missing_collaborators_are_configuration_errors() {
	let err = SessionBuilder::<String, String>::new()
		.binding(MemoryBinding::default())
		.build()
		.unwrap_err();
	assert!(matches!(err, ConfigError::MissingSource));

	let err = SessionBuilder::<State, State>::identity()
		.source(state_source())
		.binding(MemoryBinding::default())
		.build()
		.unwrap_err();
	assert!(matches!(err, ConfigError::MissingLabel));

	let err = SessionBuilder::<String, String>::new().source(words()).build().unwrap_err();
	assert!(matches!(err, ConfigError::MissingBinding));
}

#[test]
fn invalid_wait_is_rejected_at_bind_time() {
	let err = SessionBuilder::new()
		.config(TypeaheadConfig {
			wait_ms: 120_000,
			..Default::default()
		})
		.source(words())
		.binding(MemoryBinding::default())
		.build()
		.unwrap_err();
	assert!(matches!(err, ConfigError::InvalidWait(120_000)));
}

#[test]
fn queued_events_dispatch_to_methods() {
	let (mut session, binding) = basic(TypeaheadConfig::default());
	for event in [
		SessionEvent::Focus,
		SessionEvent::Input("ba".into()),
		SessionEvent::Key(Key::Down),
		SessionEvent::Key(Key::Enter),
	] {
		session.handle(event).unwrap();
	}
	assert_eq!(binding.value(), ModelValue::Value("baz".into()));
	assert_eq!(session.view_text(), "baz");
}

#[test]
fn host_binding_change_rerenders_without_opening() {
	let binding = MemoryBinding::new(ModelValue::Value("foo".to_owned()));
	let mut session = SessionBuilder::new()
		.source(words())
		.binding(binding.clone())
		.build()
		.unwrap();
	assert_eq!(session.view_text(), "foo");
	session.focus();

	binding.set(ModelValue::Value("bar".to_owned()));
	assert!(session.sync_external());
	assert_eq!(session.view_text(), "bar");
	assert!(!session.is_open());
	assert_eq!(session.request_id().get(), 0);
	assert_eq!(binding.writes(), 0);
	assert!(!session.sync_external());
}

#[test]
fn next_entry_point_picks_up_host_change() {
	let (mut session, binding) = basic(TypeaheadConfig::default());
	session.focus();

	binding.set(ModelValue::Value("baz".to_owned()));
	assert_eq!(session.handle_key(Key::Down).unwrap(), KeyOutcome::Ignored);
	assert_eq!(session.view_text(), "baz");
	assert!(!session.is_open());

	binding.set(ModelValue::Empty);
	session.hover(0);
	assert_eq!(session.view_text(), "");
}

#[test]
fn host_change_after_teardown_is_ignored() {
	let binding = MemoryBinding::new(ModelValue::Value("foo".to_owned()));
	let mut session = SessionBuilder::new()
		.source(words())
		.binding(binding.clone())
		.build()
		.unwrap();

	session.teardown();
	binding.set(ModelValue::Value("bar".to_owned()));
	assert!(!session.sync_external());
	assert_eq!(session.view_text(), "foo");
}

#[test]
fn pending_request_tracks_outstanding_lookup() {
	let (mut session, _) = deferred_session();
	assert_eq!(session.pending_request(), None);

	type_text(&mut session, "ca");
	let pending = session.pending_request().cloned().unwrap();
	assert_eq!(pending.query, "ca");
	assert_eq!(pending.id, session.request_id());

	session.settle(pending.id, Ok(owned(&["cat"])));
	assert_eq!(session.pending_request(), None);
}

fn counting_session(config: TypeaheadConfig, clock: &ManualClock) -> (Session<String, String>, Rc<RefCell<Vec<String>>>) {
	let queries = Rc::new(RefCell::new(Vec::<String>::new()));
	let log = Rc::clone(&queries);
	let session = SessionBuilder::new()
		.config(config)
		.source(move |text: &str| {
			log.borrow_mut().push(text.to_owned());
			Lookup::Ready(owned(&["abc", "bca", "cab"]))
		})
		.binding(MemoryBinding::default())
		.clock(clock.clone())
		.build()
		.unwrap();
	(session, queries)
}

fn short_text() -> impl Strategy<Value = (usize, String)> {
	(1usize..8).prop_flat_map(|min| (Just(min), proptest::collection::vec(proptest::char::range('a', 'z'), 0..min)))
		.prop_map(|(min, chars)| (min, chars.into_iter().collect()))
}

#[derive(Debug, Clone)]
enum Step {
	Event(SessionEvent<String>),
	Settle(usize, bool),
}

fn step() -> impl Strategy<Value = Step> {
	prop_oneof![
		Just(Step::Event(SessionEvent::Focus)),
		Just(Step::Event(SessionEvent::Blur)),
		"[a-c]{0,3}".prop_map(|text| Step::Event(SessionEvent::Input(text))),
		proptest::sample::select(vec![Key::Up, Key::Down, Key::Enter, Key::Tab, Key::Escape, Key::Other])
			.prop_map(|key| Step::Event(SessionEvent::Key(key))),
		(0usize..4).prop_map(|index| Step::Event(SessionEvent::Hover(index))),
		(0usize..4).prop_map(|index| Step::Event(SessionEvent::Pointer(PointerTarget::Match(index)))),
		Just(Step::Event(SessionEvent::Pointer(PointerTarget::Input))),
		Just(Step::Event(SessionEvent::Pointer(PointerTarget::Outside))),
		(any::<usize>(), any::<bool>()).prop_map(|(pick, ok)| Step::Settle(pick, ok)),
	]
}

proptest! {
	/// Text shorter than the minimum length never reaches the source.
	#[test]
	fn prop_short_text_is_never_looked_up((min, text) in short_text()) {
		let clock = ManualClock::new();
		let config = TypeaheadConfig { min_length: min, ..Default::default() };
		let (mut session, queries) = counting_session(config, &clock);

		type_text(&mut session, &text);
		prop_assert!(queries.borrow().is_empty());
		prop_assert!(!session.is_open());
		prop_assert!(!session.is_loading());
		prop_assert_eq!(session.next_deadline(), None);
	}

	/// Within one debounce window only the last text is looked up.
	#[test]
	fn prop_debounce_looks_up_last_text(
		edits in proptest::collection::vec(("[a-z]{1,6}", 0u64..200), 1..12),
	) {
		let clock = ManualClock::new();
		let config = TypeaheadConfig { wait_ms: 200, ..Default::default() };
		let (mut session, queries) = counting_session(config, &clock);
		session.focus();

		for (text, gap) in &edits {
			clock.advance(Duration::from_millis(*gap));
			prop_assert!(!session.fire_due());
			session.input_text(text.as_str());
		}
		clock.advance(Duration::from_millis(200));
		prop_assert!(session.fire_due());

		let last = edits.last().map(|(text, _)| text.clone());
		prop_assert_eq!(queries.borrow().clone(), last.into_iter().collect::<Vec<_>>());
	}

	/// However K overlapping lookups settle, only the newest one's result is shown.
	#[test]
	fn prop_newest_lookup_wins(
		order in (2usize..7).prop_flat_map(|k| Just((0..k).collect::<Vec<_>>()).prop_shuffle()),
	) {
		let (mut session, _) = deferred_session();
		session.focus();
		for n in 0..order.len() {
			session.input_text(format!("q{n}"));
		}
		let lookups = session.take_deferred();
		prop_assert_eq!(lookups.len(), order.len());

		let newest = order.len() - 1;
		for &n in &order {
			let settlement = session.settle(lookups[n].id, Ok(vec![format!("{}!", lookups[n].query)]));
			prop_assert_eq!(settlement == Settlement::Current, n == newest);
		}
		prop_assert_eq!(labels(&session), vec![format!("q{newest}!")]);
		prop_assert!(!session.is_loading());
	}

	/// An open popup always belongs to a focused input, shows matches and
	/// highlights one of them.
	#[test]
	fn prop_open_popup_is_consistent(steps in proptest::collection::vec(step(), 1..60)) {
		let (mut session, _) = deferred_session();
		let mut pool: Vec<DeferredLookup<String>> = Vec::new();

		for step in steps {
			match step {
				Step::Event(event) => session.handle(event).unwrap(),
				Step::Settle(pick, ok) => {
					if !pool.is_empty() {
						let lookup = pool.remove(pick % pool.len());
						let result = if ok {
							Ok(["abc", "bca", "cab"]
								.into_iter()
								.filter(|word| word.contains(lookup.query.as_str()))
								.map(String::from)
								.collect())
						} else {
							Err(SourceError::Rejected("offline".into()))
						};
						session.settle(lookup.id, result);
					}
				}
			}
			pool.extend(session.take_deferred());

			if session.is_open() {
				prop_assert!(session.is_focused());
				prop_assert!(!session.matches().is_empty());
				let active = session.active_index();
				prop_assert!(active.is_some_and(|i| i < session.matches().len()));
			} else {
				prop_assert!(session.matches().is_empty());
				prop_assert_eq!(session.active_index(), None);
			}
		}
	}
}
