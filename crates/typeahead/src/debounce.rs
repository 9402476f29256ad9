//! Trailing debounce for text changes.
//!
//! Only the most recent change within the wait window survives. The pending
//! trigger is the one cancellable primitive of the engine: replacing or
//! cancelling it simply drops the stale text, the source never sees it.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Time source for debounce deadlines.
pub trait Clock {
	/// Current instant.
	fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> Instant {
		Instant::now()
	}
}

/// Clock advanced by hand, for hosts that drive time themselves.
#[derive(Debug, Clone)]
pub struct ManualClock {
	now: Rc<Cell<Instant>>,
}

impl Default for ManualClock {
	fn default() -> Self {
		Self::new()
	}
}

impl ManualClock {
	/// Creates a clock frozen at the current instant.
	pub fn new() -> Self {
		Self {
			now: Rc::new(Cell::new(Instant::now())),
		}
	}

	/// Moves the clock forward.
	pub fn advance(&self, by: Duration) {
		self.now.set(self.now.get() + by);
	}
}

impl Clock for ManualClock {
	fn now(&self) -> Instant {
		self.now.get()
	}
}

#[derive(Debug)]
struct Scheduled {
	text: String,
	due: Instant,
}

/// Delays lookups until input has been quiet for `wait`.
#[derive(Debug)]
pub struct Debouncer {
	wait: Duration,
	scheduled: Option<Scheduled>,
}

impl Debouncer {
	/// Creates a debouncer with the given quiet period.
	pub fn new(wait: Duration) -> Self {
		Self { wait, scheduled: None }
	}

	/// Records a text change.
	///
	/// Cancels any pending trigger. With a zero wait the text is returned for
	/// immediate lookup; otherwise it is scheduled and `None` is returned.
	pub fn on_text_changed(&mut self, text: &str, now: Instant) -> Option<String> {
		self.cancel();
		if self.wait.is_zero() {
			return Some(text.to_owned());
		}
		let due = now + self.wait;
		tracing::trace!(text_len = text.len(), wait_ms = self.wait.as_millis() as u64, "typeahead.debounce.schedule");
		self.scheduled = Some(Scheduled {
			text: text.to_owned(),
			due,
		});
		None
	}

	/// Drops the pending trigger. Returns whether one was pending.
	pub fn cancel(&mut self) -> bool {
		let cancelled = self.scheduled.take().is_some();
		if cancelled {
			tracing::trace!("typeahead.debounce.cancel");
		}
		cancelled
	}

	/// When the pending trigger fires, if any.
	pub fn deadline(&self) -> Option<Instant> {
		self.scheduled.as_ref().map(|s| s.due)
	}

	/// Whether a trigger is pending.
	pub fn is_pending(&self) -> bool {
		self.scheduled.is_some()
	}

	/// Restarts the pending trigger's full wait from `now`. Used when the
	/// clock it was scheduled against is replaced.
	pub fn rearm(&mut self, now: Instant) -> bool {
		let Some(scheduled) = self.scheduled.as_mut() else {
			return false;
		};
		scheduled.due = now + self.wait;
		true
	}

	/// Takes the pending text if its deadline has passed.
	pub fn take_due(&mut self, now: Instant) -> Option<String> {
		if self.scheduled.as_ref().is_some_and(|s| now >= s.due) {
			return self.scheduled.take().map(|s| s.text);
		}
		None
	}
}
