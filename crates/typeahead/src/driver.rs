//! Tokio driver for a [`Session`].
//!
//! The session itself never awaits. [`Driver`] owns it and supplies the two
//! things it cannot do alone: polling deferred lookups and waking up when a
//! debounce deadline passes. Lookups run concurrently in a
//! [`FuturesUnordered`]; whichever settles first is handed back to the
//! session, which discards it unless it belongs to the newest request.
//!
//! Hosts either call session methods directly through
//! [`session_mut`](Driver::session_mut) and then [`run_until_idle`](Driver::run_until_idle),
//! or queue [`SessionEvent`]s through a [`DriverHandle`] while
//! [`run`](Driver::run) is active.
//!
//! ```ignore
//! let mut driver = Driver::new(session);
//! let handle = driver.handle();
//! handle.send(SessionEvent::Focus);
//! handle.send(SessionEvent::Input("ba".into()));
//! driver.run(cancel).await?;
//! ```

use std::rc::Rc;
use std::time::Instant;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{Notify, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::debounce::Clock;
use crate::error::{SelectError, SourceError};
use crate::sequencer::RequestId;
use crate::session::{Session, SessionEvent};

type Settled<T> = (RequestId, Result<Vec<T>, SourceError>);

/// Clock reading tokio's time source, so paused test time applies to
/// debounce deadlines.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

impl Clock for TokioClock {
	fn now(&self) -> Instant {
		tokio::time::Instant::now().into_std()
	}
}

/// Queues events for a running [`Driver`].
pub struct DriverHandle<M> {
	tx: mpsc::UnboundedSender<SessionEvent<M>>,
}

impl<M> Clone for DriverHandle<M> {
	fn clone(&self) -> Self {
		Self { tx: self.tx.clone() }
	}
}

impl<M> std::fmt::Debug for DriverHandle<M> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DriverHandle").field("closed", &self.tx.is_closed()).finish()
	}
}

impl<M> DriverHandle<M> {
	/// Queues `event`. Returns false once the driver is gone.
	pub fn send(&self, event: SessionEvent<M>) -> bool {
		self.tx.send(event).is_ok()
	}
}

/// Owns a [`Session`] and runs its deferred lookups and debounce timer.
pub struct Driver<T, M> {
	session: Session<T, M>,
	in_flight: FuturesUnordered<LocalBoxFuture<'static, Settled<T>>>,
	tx: mpsc::UnboundedSender<SessionEvent<M>>,
	rx: mpsc::UnboundedReceiver<SessionEvent<M>>,
	external: Rc<Notify>,
}

impl<T, M> std::fmt::Debug for Driver<T, M> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Driver")
			.field("session", &self.session)
			.field("in_flight", &self.in_flight.len())
			.finish_non_exhaustive()
	}
}

impl<T: 'static, M: Clone> Driver<T, M> {
	/// Wraps `session`, switching it to [`TokioClock`]. A clock configured
	/// through [`SessionBuilder::clock`](crate::SessionBuilder::clock) is
	/// replaced, and a pending debounce trigger restarts its wait.
	///
	/// The driver also listens to the session's binding, so host-side model
	/// changes are rendered while [`run`](Self::run) is waiting.
	pub fn new(mut session: Session<T, M>) -> Self {
		if session.has_custom_clock() {
			debug!(session = session.id().get(), "typeahead.driver.clock_replaced");
		}
		session.set_clock(Rc::new(TokioClock));

		let external = Rc::new(Notify::new());
		let wake = Rc::clone(&external);
		session.watch_external(Box::new(move || wake.notify_one()));

		let (tx, rx) = mpsc::unbounded_channel();
		Self {
			session,
			in_flight: FuturesUnordered::new(),
			tx,
			rx,
			external,
		}
	}

	/// Handle for queueing events.
	pub fn handle(&self) -> DriverHandle<M> {
		DriverHandle { tx: self.tx.clone() }
	}

	/// The driven session.
	pub fn session(&self) -> &Session<T, M> {
		&self.session
	}

	/// The driven session, for direct calls.
	pub fn session_mut(&mut self) -> &mut Session<T, M> {
		&mut self.session
	}

	/// Stops driving and returns the session. Unsettled lookups are dropped.
	pub fn into_session(self) -> Session<T, M> {
		self.session
	}

	/// Lookups still being polled.
	pub fn in_flight(&self) -> usize {
		self.in_flight.len()
	}

	/// Moves newly deferred lookups into the polling set.
	fn enqueue(&mut self) {
		for lookup in self.session.take_deferred() {
			let id = lookup.id;
			trace!(session = self.session.id().get(), request_id = id.get(), "typeahead.driver.enqueue");
			let future = lookup.future;
			self.in_flight.push(async move { (id, future.await) }.boxed_local());
		}
	}

	/// Applies every queued event.
	fn drain_events(&mut self) -> Result<(), SelectError> {
		self.session.sync_external();
		while let Ok(event) = self.rx.try_recv() {
			self.session.handle(event)?;
		}
		self.enqueue();
		Ok(())
	}

	fn settle(&mut self, (id, result): Settled<T>) {
		self.session.settle(id, result);
		self.enqueue();
	}

	fn fire_due(&mut self) {
		if self.session.fire_due() {
			self.enqueue();
		}
	}

	/// Waits for the next lookup settlement or debounce deadline and applies
	/// it. Queued events are applied first.
	///
	/// Returns false without waiting when nothing is pending.
	pub async fn step(&mut self) -> Result<bool, SelectError> {
		self.drain_events()?;
		self.fire_due();

		let deadline = self.session.next_deadline();
		if self.in_flight.is_empty() && deadline.is_none() {
			return Ok(false);
		}

		tokio::select! {
			biased;

			Some(settled) = self.in_flight.next(), if !self.in_flight.is_empty() => self.settle(settled),
			() = wait_until(deadline) => self.fire_due(),
		}
		Ok(true)
	}

	/// Steps until no lookup is in flight and no trigger is scheduled.
	pub async fn run_until_idle(&mut self) -> Result<(), SelectError> {
		while self.step().await? {}
		Ok(())
	}

	/// Drives the session from queued events until `cancel` fires.
	///
	/// A selection hook error stops the loop and is returned.
	pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), SelectError> {
		debug!(session = self.session.id().get(), "typeahead.driver.start");
		loop {
			self.enqueue();
			let deadline = self.session.next_deadline();

			tokio::select! {
				biased;

				() = cancel.cancelled() => break,

				Some(settled) = self.in_flight.next(), if !self.in_flight.is_empty() => self.settle(settled),

				() = self.external.notified() => {
					self.session.sync_external();
				}

				event = self.rx.recv() => match event {
					Some(event) => self.session.handle(event)?,
					None => break,
				},

				() = wait_until(deadline) => self.fire_due(),
			}
		}
		debug!(session = self.session.id().get(), in_flight = self.in_flight.len(), "typeahead.driver.stop");
		Ok(())
	}
}

async fn wait_until(deadline: Option<Instant>) {
	match deadline {
		Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
		None => std::future::pending().await,
	}
}
