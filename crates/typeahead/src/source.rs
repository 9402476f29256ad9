//! Source adapter: the caller's lookup function.
//!
//! A source answers a query either immediately ([`Lookup::Ready`]) or with a
//! deferred computation ([`Lookup::Deferred`]). Deferred lookups are handed to
//! the [`Driver`](crate::Driver) (or any other executor) together with the
//! request id they belong to; the session decides on arrival whether the
//! result is still wanted.

use std::fmt;
use std::future::Future;

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::error::SourceError;

/// Future resolving to a deferred lookup's raw items.
pub type LookupFuture<T> = LocalBoxFuture<'static, Result<Vec<T>, SourceError>>;

/// Answer of a source for one query.
pub enum Lookup<T> {
	/// Already settled.
	Ready(Vec<T>),
	/// Settles later.
	Deferred(LookupFuture<T>),
}

impl<T: 'static> Lookup<T> {
	/// Wraps a future as a deferred lookup.
	pub fn deferred<F>(future: F) -> Self
	where
		F: Future<Output = Result<Vec<T>, SourceError>> + 'static,
	{
		Self::Deferred(future.boxed_local())
	}

	/// A deferred lookup that rejects once polled.
	pub fn rejected(error: SourceError) -> Self {
		Self::deferred(async move { Err(error) })
	}
}

impl<T> From<Vec<T>> for Lookup<T> {
	fn from(items: Vec<T>) -> Self {
		Self::Ready(items)
	}
}

impl<T> fmt::Debug for Lookup<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Ready(items) => f.debug_tuple("Ready").field(&items.len()).finish(),
			Self::Deferred(_) => f.write_str("Deferred"),
		}
	}
}

/// Produces candidate items for the current input text.
///
/// Sources may have side effects and are not assumed idempotent: the session
/// calls [`lookup`](Self::lookup) exactly once per issued request.
pub trait Source<T> {
	/// Looks up items for `text`.
	fn lookup(&mut self, text: &str) -> Lookup<T>;
}

impl<T, F> Source<T> for F
where
	F: FnMut(&str) -> Lookup<T>,
{
	fn lookup(&mut self, text: &str) -> Lookup<T> {
		self(text)
	}
}

/// Static list filtered by case-insensitive substring of each item's text.
#[derive(Debug, Clone)]
pub struct ListSource<T> {
	items: Vec<T>,
}

impl<T> ListSource<T> {
	/// Creates a source over `items`.
	pub fn new(items: impl IntoIterator<Item = T>) -> Self {
		Self {
			items: items.into_iter().collect(),
		}
	}
}

impl<T: Clone + fmt::Display> Source<T> for ListSource<T> {
	fn lookup(&mut self, text: &str) -> Lookup<T> {
		let needle = text.to_lowercase();
		Lookup::Ready(
			self.items
				.iter()
				.filter(|item| item.to_string().to_lowercase().contains(&needle))
				.cloned()
				.collect(),
		)
	}
}
