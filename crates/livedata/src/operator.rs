//! Stream operators.
//!
//! Every operator is a variant of [`Operator`]. A derived stream is a mediator
//! with a single source whose callback runs [`Operator::apply`] and acts on the
//! returned [`Step`].

use std::rc::Rc;

use tracing::trace;

use crate::live_data::LiveData;
use crate::mediator::MediatorLiveData;

/// What a derived stream does with one upstream value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step<U> {
	Publish(U),
	/// Publish, then stop listening to the source.
	PublishAndDetach(U),
	Skip,
}

pub(crate) enum Operator<T, U> {
	/// Publish when the value differs from the stream's current one.
	Distinct {
		lift: fn(&T) -> U,
		same: fn(&U, &U) -> bool,
	},
	Filter {
		predicate: Box<dyn FnMut(&T) -> bool>,
		lift: fn(&T) -> U,
	},
	First {
		lift: fn(&T) -> U,
	},
	Map(Box<dyn FnMut(&T) -> U>),
	/// Publish the inner value of `Some`, skip `None`.
	NonNull {
		unwrap: fn(&T) -> Option<U>,
	},
}

impl<T: Clone> Operator<T, T> {
	pub(crate) fn distinct() -> Self
	where
		T: PartialEq,
	{
		Self::Distinct {
			lift: T::clone,
			same: T::eq,
		}
	}

	pub(crate) fn filter(predicate: impl FnMut(&T) -> bool + 'static) -> Self {
		Self::Filter {
			predicate: Box::new(predicate),
			lift: T::clone,
		}
	}

	pub(crate) fn first() -> Self {
		Self::First {
			lift: T::clone,
		}
	}
}

impl<U: Clone> Operator<Option<U>, U> {
	pub(crate) fn non_null() -> Self {
		Self::NonNull {
			unwrap: Option::<U>::clone,
		}
	}
}

impl<T, U> Operator<T, U> {
	pub(crate) fn map(transform: impl FnMut(&T) -> U + 'static) -> Self {
		Self::Map(Box::new(transform))
	}

	pub(crate) fn name(&self) -> &'static str {
		match self {
			Self::Distinct {
				..
			} => "distinct",
			Self::Filter {
				..
			} => "filter",
			Self::First {
				..
			} => "first",
			Self::Map(_) => "map",
			Self::NonNull {
				..
			} => "non_null",
		}
	}

	/// Decide what to publish for `value`, given the stream's `current` value.
	pub(crate) fn apply(&mut self, value: &T, current: Option<&U>) -> Step<U> {
		match self {
			Self::Distinct {
				lift,
				same,
			} => {
				let next = lift(value);
				match current {
					Some(current) if same(current, &next) => Step::Skip,
					_ => Step::Publish(next),
				}
			}
			Self::Filter {
				predicate,
				lift,
			} => {
				if predicate(value) {
					Step::Publish(lift(value))
				} else {
					Step::Skip
				}
			}
			Self::First {
				lift,
			} => Step::PublishAndDetach(lift(value)),
			Self::Map(transform) => Step::Publish(transform(value)),
			Self::NonNull {
				unwrap,
			} => unwrap(value).map_or(Step::Skip, Step::Publish),
		}
	}
}

/// Build the stream of `source` values passed through `operator`.
pub(crate) fn derive<T: 'static, U: 'static>(source: &LiveData<T>, mut operator: Operator<T, U>) -> LiveData<U> {
	trace!(operator = operator.name(), "deriving stream");

	let mediator = MediatorLiveData::<U>::new();
	let target = Rc::downgrade(&mediator.shared);
	let source_key = source.key();
	mediator.link_source(source, move |value: &T| {
		let Some(target) = target.upgrade() else {
			return;
		};
		let current = target.current();
		match operator.apply(value, current.as_deref()) {
			Step::Publish(next) => target.set_value(next),
			Step::PublishAndDetach(next) => {
				target.set_value(next);
				target.remove_source(source_key);
			}
			Step::Skip => {}
		}
	});
	mediator.into()
}
