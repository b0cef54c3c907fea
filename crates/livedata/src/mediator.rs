use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::error::LiveDataError;
use crate::live_data::{LiveData, MutableLiveData, START_VERSION, Shared, Subscription};

/// A source feeding a mediator. Owned by the mediator's shared state.
pub(crate) trait Source {
	/// Identity of the observed container.
	fn key(&self) -> usize;
	/// Start observing the source.
	fn plug(&self);
	/// Stop observing the source.
	fn unplug(&self);
	/// Unplug for good; later `plug` calls do nothing.
	fn detach(&self);
}

struct SourceLink<S> {
	source: LiveData<S>,
	/// The mediator this link feeds
	owner: Weak<dyn Any>,
	on_changed: Rc<RefCell<dyn FnMut(&S)>>,
	/// Last source version forwarded, shared with the live subscription
	version: Rc<Cell<i64>>,
	subscription: RefCell<Option<Subscription>>,
	detached: Cell<bool>,
}

impl<S> SourceLink<S> {
	fn release(&self) {
		let subscription = self.subscription.borrow_mut().take();
		if let Some(subscription) = subscription {
			subscription.remove_observer();
		}
	}
}

impl<S: 'static> Source for SourceLink<S> {
	fn key(&self) -> usize {
		self.source.key()
	}

	fn plug(&self) {
		if self.detached.get() || self.subscription.borrow().is_some() {
			return;
		}
		trace!(source = self.key(), "plugging mediator source");

		let on_changed = self.on_changed.clone();
		let version = self.version.clone();
		let source = Rc::downgrade(&self.source.shared);
		// While plugged, the source keeps the mediator alive; unplugging releases it
		let owner = self.owner.upgrade();
		let subscription = self.source.observe_forever(move |value: &S| {
			let _owner = &owner;
			let Some(source) = source.upgrade() else {
				return;
			};
			let current = source.version();
			if version.get() != current {
				version.set(current);
				(&mut *on_changed.borrow_mut())(value);
			}
		});

		if self.detached.get() {
			// Removed while the current value was being delivered
			subscription.remove_observer();
		} else {
			*self.subscription.borrow_mut() = Some(subscription);
		}
	}

	fn unplug(&self) {
		trace!(source = self.key(), "unplugging mediator source");
		self.release();
	}

	fn detach(&self) {
		self.detached.set(true);
		self.release();
	}
}

impl<S> Drop for SourceLink<S> {
	fn drop(&mut self) {
		self.release();
	}
}

/// A [`MutableLiveData`] that reacts to other live data.
///
/// Each source is observed only while the mediator itself has an active
/// observer. Dereferences to [`MutableLiveData`], so the mediator can also be
/// set directly.
///
/// # Example
///
/// ```
/// use livedata::{MediatorLiveData, MutableLiveData};
///
/// let celsius = MutableLiveData::<f64>::new();
/// let fahrenheit = MediatorLiveData::<f64>::new();
///
/// let sink = fahrenheit.downgrade();
/// fahrenheit
/// 	.add_source(&celsius, move |c: &f64| {
/// 		if let Some(fahrenheit) = sink.upgrade() {
/// 			fahrenheit.set_value(c * 9.0 / 5.0 + 32.0);
/// 		}
/// 	})
/// 	.unwrap();
///
/// let subscription = fahrenheit.observe_forever(|_: &f64| {});
/// celsius.set_value(100.0);
/// assert_eq!(fahrenheit.value(), Some(212.0));
/// subscription.remove_observer();
/// ```
pub struct MediatorLiveData<T> {
	live: MutableLiveData<T>,
}

impl<T: 'static> MediatorLiveData<T> {
	pub fn new() -> Self {
		Self {
			live: MutableLiveData::new(),
		}
	}

	/// Start forwarding values of `source` to `on_changed`.
	///
	/// Returns [`LiveDataError::SourceAlreadyAdded`] if `source` is already
	/// attached to this mediator.
	pub fn add_source<S: 'static>(
		&self,
		source: &LiveData<S>,
		on_changed: impl FnMut(&S) + 'static,
	) -> Result<(), LiveDataError> {
		if self.live.shared.has_source(source.key()) {
			return Err(LiveDataError::SourceAlreadyAdded);
		}
		self.link_source(source, on_changed);
		Ok(())
	}

	/// Stop forwarding values of `source`. Unknown sources are ignored.
	pub fn remove_source<S: 'static>(&self, source: &LiveData<S>) {
		self.live.shared.remove_source(source.key());
	}

	pub(crate) fn link_source<S: 'static>(&self, source: &LiveData<S>, on_changed: impl FnMut(&S) + 'static) {
		let owner: Weak<dyn Any> = Rc::downgrade(&self.live.shared) as Weak<dyn Any>;
		let link = SourceLink {
			source: source.clone(),
			owner,
			on_changed: Rc::new(RefCell::new(on_changed)),
			version: Rc::new(Cell::new(START_VERSION)),
			subscription: RefCell::new(None),
			detached: Cell::new(false),
		};
		self.live.shared.push_source(Rc::new(link));
	}

	/// A handle that does not keep the mediator alive.
	///
	/// Source callbacks that set the mediator should capture this handle, since
	/// the mediator owns its sources.
	pub fn downgrade(&self) -> WeakMediatorLiveData<T> {
		WeakMediatorLiveData {
			shared: Rc::downgrade(&self.live.shared),
		}
	}

	#[cfg(test)]
	pub(crate) fn source_count(&self) -> usize {
		self.live.shared.source_count()
	}
}

/// Non-owning handle to a [`MediatorLiveData`], from [`MediatorLiveData::downgrade`].
pub struct WeakMediatorLiveData<T> {
	shared: Weak<Shared<T>>,
}

impl<T: 'static> WeakMediatorLiveData<T> {
	/// The mediator, if any handle to it or an active observer still keeps it alive.
	pub fn upgrade(&self) -> Option<MediatorLiveData<T>> {
		self.shared.upgrade().map(|shared| MediatorLiveData {
			live: MutableLiveData::from_shared(shared),
		})
	}
}

impl<T> Clone for WeakMediatorLiveData<T> {
	fn clone(&self) -> Self {
		Self {
			shared: self.shared.clone(),
		}
	}
}

impl<T> fmt::Debug for WeakMediatorLiveData<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WeakMediatorLiveData").field("alive", &(self.shared.strong_count() > 0)).finish()
	}
}

impl<T: 'static> Default for MediatorLiveData<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Clone for MediatorLiveData<T> {
	fn clone(&self) -> Self {
		Self {
			live: self.live.clone(),
		}
	}
}

impl<T> Deref for MediatorLiveData<T> {
	type Target = MutableLiveData<T>;

	fn deref(&self) -> &MutableLiveData<T> {
		&self.live
	}
}

impl<T> From<MediatorLiveData<T>> for LiveData<T> {
	fn from(mediator: MediatorLiveData<T>) -> Self {
		mediator.live.into()
	}
}

impl<T: fmt::Debug> fmt::Debug for MediatorLiveData<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.live.fmt(f)
	}
}
