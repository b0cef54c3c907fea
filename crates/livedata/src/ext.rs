use crate::live_data::LiveData;
use crate::operator::{Operator, derive};

/// Operators available on every [`LiveData`].
///
/// Each operator returns a new stream fed by `self`. The new stream observes
/// `self` only while it has an active observer of its own.
pub trait LiveDataExt<T> {
	/// Emit only values that differ from the last emitted one.
	fn distinct(&self) -> LiveData<T>
	where
		T: Clone + PartialEq;

	/// Emit only values matching `predicate`.
	fn filter(&self, predicate: impl FnMut(&T) -> bool + 'static) -> LiveData<T>
	where
		T: Clone;

	/// Emit the first value, then stop listening to `self`.
	fn first(&self) -> LiveData<T>
	where
		T: Clone;

	/// Emit `transform` applied to every value.
	///
	/// A panic in `transform` propagates to the caller of `set_value` on the
	/// upstream stream.
	fn map<U: 'static>(&self, transform: impl FnMut(&T) -> U + 'static) -> LiveData<U>;
}

impl<T: 'static> LiveDataExt<T> for LiveData<T> {
	fn distinct(&self) -> LiveData<T>
	where
		T: Clone + PartialEq,
	{
		derive(self, Operator::distinct())
	}

	fn filter(&self, predicate: impl FnMut(&T) -> bool + 'static) -> LiveData<T>
	where
		T: Clone,
	{
		derive(self, Operator::filter(predicate))
	}

	fn first(&self) -> LiveData<T>
	where
		T: Clone,
	{
		derive(self, Operator::first())
	}

	fn map<U: 'static>(&self, transform: impl FnMut(&T) -> U + 'static) -> LiveData<U> {
		derive(self, Operator::map(transform))
	}
}

/// Operators for streams of optional values.
pub trait NullableLiveDataExt<U> {
	/// Emit the inner value of every `Some`, dropping `None`.
	fn non_null(&self) -> LiveData<U>;
}

impl<U: Clone + 'static> NullableLiveDataExt<U> for LiveData<Option<U>> {
	fn non_null(&self) -> LiveData<U> {
		derive(self, Operator::non_null())
	}
}
