//! Typeahead suggestion engine.
//!
//! This crate turns text typed into an input into a popup of candidate
//! matches, lets the user navigate and commit one, and writes the chosen
//! value back through a model binding. It carries no UI: hosts feed it input
//! events and draw whatever [`RenderObserver`]s are told to draw.
//!
//! # Pieces
//!
//! - **[`Source`]**: the caller's lookup, answering synchronously or with a
//!   deferred future
//! - **[`RequestSequencer`]**: last-issued-wins request ids, so a slow stale
//!   answer can never replace a newer one
//! - **[`Debouncer`]**: trailing debounce of keystrokes against a [`Clock`]
//! - **[`PopupState`]**: open/closed popup with wraparound navigation
//! - **[`ValidationGate`]**: the `editable` error for free text
//! - **[`Session`]**: ties the above together for one input
//! - **[`Driver`]**: tokio loop polling deferred lookups and debounce timers
//!
//! # Example
//!
//! ```ignore
//! let binding = MemoryBinding::default();
//! let mut session = SessionBuilder::new()
//! 	.config(TypeaheadConfig::from_toml_str("wait-ms = 150")?)
//! 	.source(ListSource::new(["foo", "bar", "baz"].map(String::from)))
//! 	.binding(binding.clone())
//! 	.observer(|view: &RenderView<'_, String, String>| draw(view))
//! 	.build()?;
//!
//! session.focus();
//! session.input_text("ba");
//! session.handle_key(Key::Enter)?;
//! assert_eq!(binding.value(), ModelValue::Value("bar".into()));
//! ```
//!
//! # Logging
//!
//! The crate emits [`tracing`] events named `typeahead.*` and installs no
//! subscriber of its own.

pub mod binding;
pub mod commit;
pub mod config;
pub mod debounce;
pub mod driver;
pub mod error;
pub mod expr;
pub mod highlight;
pub mod key;
pub mod matches;
pub mod observer;
pub mod popup;
pub mod sequencer;
pub mod session;
pub mod slot;
pub mod source;
pub mod validation;

pub use binding::{Binding, EDITABLE_ERROR, ExternalChangeFn, MemoryBinding, ModelValue};
pub use commit::OnSelectFn;
pub use config::{MAX_WAIT_MS, RejectPolicy, TypeaheadConfig};
pub use debounce::{Clock, Debouncer, ManualClock, SystemClock};
pub use driver::{Driver, DriverHandle, TokioClock};
pub use error::{ConfigError, HookError, Result, SelectError, SourceError};
pub use highlight::{Segment, highlight};
pub use key::{Key, KeyOutcome, PointerTarget};
pub use matches::Match;
pub use observer::{RenderObserver, RenderView};
pub use popup::PopupState;
pub use sequencer::{PendingRequest, RequestId, RequestSequencer, Settlement};
pub use session::{DeferredLookup, Session, SessionBuilder, SessionEvent};
pub use slot::{SessionId, SlotRegistry};
pub use source::{ListSource, Lookup, LookupFuture, Source};
pub use validation::ValidationGate;
