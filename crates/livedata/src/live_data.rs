//! Observable value containers.
//!
//! # Dispatch
//!
//! Setting a value bumps the container's version and walks the observer list.
//! Each observer remembers the last version it received, so it never sees the
//! same version twice, and an observer that becomes active later catches up
//! with the current value exactly once.
//!
//! Setting a value from inside an observer does not recurse: the running pass
//! is marked invalid and restarted with the newest value once the observer
//! returns.
//!
//! # Activity
//!
//! An observer is active while it is registered forever, or while its
//! lifecycle is at least `Started`. The container counts active observers; a
//! mediator subscribes to its sources only while that count is non-zero.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::lifecycle::{Lifecycle, LifecycleState, WeakLifecycle};
use crate::mediator::Source;

/// Version of a container that was never set.
pub(crate) const START_VERSION: i64 = -1;

type Callback<T> = Rc<RefCell<dyn FnMut(&T)>>;

enum Binding {
	Forever,
	Owner {
		lifecycle: WeakLifecycle,
		listener: u64,
	},
}

struct ObserverEntry<T> {
	id: u64,
	callback: Callback<T>,
	binding: Binding,
	active: bool,
	last_version: i64,
}

/// Shared state behind every handle to one container.
pub(crate) struct Shared<T> {
	data: RefCell<Option<Rc<T>>>,
	version: Cell<i64>,
	observers: RefCell<Vec<ObserverEntry<T>>>,
	next_id: Cell<u64>,
	active_count: Cell<usize>,
	changing_active_state: Cell<bool>,
	dispatching: Cell<bool>,
	invalidated: Cell<bool>,
	/// Mediator sources, plugged while `active_count > 0`
	sources: RefCell<Vec<Rc<dyn Source>>>,
}

/// Resets the dispatching flag even if an observer panics.
struct DispatchGuard<'a>(&'a Cell<bool>);

impl Drop for DispatchGuard<'_> {
	fn drop(&mut self) {
		self.0.set(false);
	}
}

impl<T: 'static> Shared<T> {
	fn new(value: Option<T>) -> Self {
		let version = if value.is_some() {
			START_VERSION + 1
		} else {
			START_VERSION
		};
		Self {
			data: RefCell::new(value.map(Rc::new)),
			version: Cell::new(version),
			observers: RefCell::new(Vec::new()),
			next_id: Cell::new(0),
			active_count: Cell::new(0),
			changing_active_state: Cell::new(false),
			dispatching: Cell::new(false),
			invalidated: Cell::new(false),
			sources: RefCell::new(Vec::new()),
		}
	}

	pub(crate) fn current(&self) -> Option<Rc<T>> {
		self.data.borrow().clone()
	}

	pub(crate) fn version(&self) -> i64 {
		self.version.get()
	}

	pub(crate) fn set_value(&self, value: T) {
		self.version.set(self.version.get() + 1);
		*self.data.borrow_mut() = Some(Rc::new(value));
		self.dispatch(None);
	}

	fn observe(self: &Rc<Self>, lifecycle: &Lifecycle, callback: Callback<T>) -> Subscription {
		if lifecycle.current_state() == LifecycleState::Destroyed {
			return Subscription::detached();
		}

		let id = self.next_observer_id();
		// The lifecycle keeps this container alive until the observer is removed
		let shared = Rc::clone(self);
		let listener =
			lifecycle.add_listener(Rc::new(move |state: LifecycleState| shared.on_owner_state(id, state)));

		self.observers.borrow_mut().push(ObserverEntry {
			id,
			callback,
			binding: Binding::Owner {
				lifecycle: lifecycle.downgrade(),
				listener,
			},
			active: false,
			last_version: START_VERSION,
		});
		self.on_owner_state(id, lifecycle.current_state());
		self.subscription(id)
	}

	fn observe_forever(self: &Rc<Self>, callback: Callback<T>) -> Subscription {
		let id = self.next_observer_id();
		self.observers.borrow_mut().push(ObserverEntry {
			id,
			callback,
			binding: Binding::Forever,
			active: false,
			last_version: START_VERSION,
		});
		self.set_active(id, true);
		self.subscription(id)
	}

	fn remove_observer(&self, id: u64) {
		let removed = {
			let mut observers = self.observers.borrow_mut();
			let Some(index) = observers.iter().position(|entry| entry.id == id) else {
				return;
			};
			observers.remove(index)
		};

		if let Binding::Owner {
			lifecycle,
			listener,
		} = &removed.binding
		{
			if let Some(lifecycle) = lifecycle.upgrade() {
				lifecycle.remove_listener(*listener);
			}
		}
		if removed.active {
			self.change_active_counter(-1);
		}
	}

	fn remove_observers_of(&self, lifecycle: &Lifecycle) {
		let ids: Vec<u64> = self
			.observers
			.borrow()
			.iter()
			.filter(|entry| {
				matches!(&entry.binding, Binding::Owner { lifecycle: owner, .. } if owner.is(lifecycle))
			})
			.map(|entry| entry.id)
			.collect();
		for id in ids {
			self.remove_observer(id);
		}
	}

	fn on_owner_state(&self, id: u64, state: LifecycleState) {
		if state == LifecycleState::Destroyed {
			trace!(observer = id, "owner destroyed, removing observer");
			self.remove_observer(id);
		} else {
			self.set_active(id, state.is_at_least(LifecycleState::Started));
		}
	}

	fn set_active(&self, id: u64, active: bool) {
		{
			let mut observers = self.observers.borrow_mut();
			let Some(entry) = observers.iter_mut().find(|entry| entry.id == id) else {
				return;
			};
			if entry.active == active {
				return;
			}
			entry.active = active;
		}

		self.change_active_counter(if active { 1 } else { -1 });
		if active {
			self.dispatch(Some(id));
		}
	}

	/// Track the active observer count and plug or unplug sources on 0 <-> 1 edges.
	///
	/// Plugging a source can add or remove observers of this container, which
	/// changes the count again; the loop settles those changes in one call.
	fn change_active_counter(&self, delta: isize) {
		let mut previous = self.active_count.get();
		self.active_count.set(previous.saturating_add_signed(delta));
		if self.changing_active_state.get() {
			return;
		}

		self.changing_active_state.set(true);
		while previous != self.active_count.get() {
			let current = self.active_count.get();
			let became_active = previous == 0 && current > 0;
			let became_inactive = previous > 0 && current == 0;
			previous = current;

			if became_active {
				self.plug_sources();
			} else if became_inactive {
				self.unplug_sources();
			}
		}
		self.changing_active_state.set(false);
	}

	fn dispatch(&self, mut initiator: Option<u64>) {
		if self.dispatching.get() {
			self.invalidated.set(true);
			return;
		}

		self.dispatching.set(true);
		let _guard = DispatchGuard(&self.dispatching);
		loop {
			self.invalidated.set(false);
			if let Some(id) = initiator.take() {
				self.consider_notify(id);
			} else {
				let ids: Vec<u64> = self.observers.borrow().iter().map(|entry| entry.id).collect();
				for id in ids {
					self.consider_notify(id);
					if self.invalidated.get() {
						break;
					}
				}
			}
			if !self.invalidated.get() {
				break;
			}
		}
	}

	fn consider_notify(&self, id: u64) {
		let (callback, value) = {
			let mut observers = self.observers.borrow_mut();
			let Some(entry) = observers.iter_mut().find(|entry| entry.id == id) else {
				return;
			};
			let version = self.version.get();
			if !entry.active || entry.last_version >= version {
				return;
			}
			let Some(value) = self.data.borrow().clone() else {
				return;
			};
			entry.last_version = version;
			(entry.callback.clone(), value)
		};

		(&mut *callback.borrow_mut())(&*value);
	}

	pub(crate) fn has_source(&self, key: usize) -> bool {
		self.sources.borrow().iter().any(|source| source.key() == key)
	}

	#[cfg(test)]
	pub(crate) fn source_count(&self) -> usize {
		self.sources.borrow().len()
	}

	pub(crate) fn push_source(&self, source: Rc<dyn Source>) {
		self.sources.borrow_mut().push(source.clone());
		if self.active_count.get() > 0 {
			source.plug();
		}
	}

	pub(crate) fn remove_source(&self, key: usize) {
		let removed = {
			let mut sources = self.sources.borrow_mut();
			let Some(index) = sources.iter().position(|source| source.key() == key) else {
				return;
			};
			sources.remove(index)
		};
		removed.detach();
	}

	fn plug_sources(&self) {
		let sources = self.sources.borrow().clone();
		if !sources.is_empty() {
			debug!(sources = sources.len(), "mediator became active");
		}
		for source in sources {
			// An earlier source may have removed this one while delivering its value
			if self.has_source(source.key()) {
				source.plug();
			}
		}
	}

	fn unplug_sources(&self) {
		let sources = self.sources.borrow().clone();
		if !sources.is_empty() {
			debug!(sources = sources.len(), "mediator became inactive");
		}
		for source in sources {
			source.unplug();
		}
	}

	fn next_observer_id(&self) -> u64 {
		let id = self.next_id.get();
		self.next_id.set(id + 1);
		id
	}

	fn subscription(self: &Rc<Self>, id: u64) -> Subscription {
		let registry: Weak<dyn ObserverRegistry> = Rc::downgrade(self) as Weak<dyn ObserverRegistry>;
		Subscription {
			registry: Some(registry),
			id,
		}
	}
}

/// Type-erased access used by [`Subscription`].
trait ObserverRegistry {
	fn detach(&self, id: u64);
	fn is_attached(&self, id: u64) -> bool;
}

impl<T: 'static> ObserverRegistry for Shared<T> {
	fn detach(&self, id: u64) {
		self.remove_observer(id);
	}

	fn is_attached(&self, id: u64) -> bool {
		self.observers.borrow().iter().any(|entry| entry.id == id)
	}
}

/// Handle returned by [`LiveData::observe`] and [`LiveData::observe_forever`].
///
/// Dropping the handle does not remove the observer; call
/// [`remove_observer`](Subscription::remove_observer) for that.
pub struct Subscription {
	registry: Option<Weak<dyn ObserverRegistry>>,
	id: u64,
}

impl Subscription {
	fn detached() -> Self {
		Self {
			registry: None,
			id: 0,
		}
	}

	/// Stop delivering values to this observer. Calling it again does nothing.
	pub fn remove_observer(&self) {
		if let Some(registry) = self.registry.as_ref().and_then(Weak::upgrade) {
			registry.detach(self.id);
		}
	}

	/// Check whether the observer is still registered.
	pub fn is_attached(&self) -> bool {
		self.registry
			.as_ref()
			.and_then(Weak::upgrade)
			.is_some_and(|registry| registry.is_attached(self.id))
	}
}

impl fmt::Debug for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription")
			.field("id", &self.id)
			.field("attached", &self.is_attached())
			.finish()
	}
}

/// Read side of an observable value.
///
/// Handles are cheap to clone and all clones observe the same value. The type
/// is `!Send`: values are set and delivered on a single thread.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use livedata::MutableLiveData;
///
/// let count = MutableLiveData::<u32>::new();
/// let seen = Rc::new(RefCell::new(Vec::new()));
///
/// let sink = seen.clone();
/// let subscription = count.observe_forever(move |value: &u32| sink.borrow_mut().push(*value));
///
/// count.set_value(1);
/// count.set_value(2);
/// subscription.remove_observer();
/// count.set_value(3);
///
/// assert_eq!(*seen.borrow(), vec![1, 2]);
/// assert_eq!(count.value(), Some(3));
/// ```
pub struct LiveData<T> {
	pub(crate) shared: Rc<Shared<T>>,
}

impl<T: 'static> LiveData<T> {
	pub(crate) fn from_shared(shared: Rc<Shared<T>>) -> Self {
		Self {
			shared,
		}
	}

	/// A copy of the current value, or `None` if it was never set.
	pub fn value(&self) -> Option<T>
	where
		T: Clone,
	{
		self.shared.current().map(|value| (*value).clone())
	}

	/// Run `f` with a reference to the current value.
	pub fn with_current<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
		let current = self.shared.current();
		f(current.as_deref())
	}

	/// Number of times the value was set, minus one. `-1` means never set.
	pub fn version(&self) -> i64 {
		self.shared.version()
	}

	/// Observe values while `owner` is at least started.
	///
	/// The observer is removed automatically when `owner` is destroyed. Until
	/// then `owner` keeps this container alive, so observing a temporary
	/// derived stream is fine. An already-destroyed owner is ignored and the
	/// returned subscription is detached.
	pub fn observe(&self, owner: &Lifecycle, observer: impl FnMut(&T) + 'static) -> Subscription {
		self.shared.observe(owner, Rc::new(RefCell::new(observer)))
	}

	/// Observe every value until the subscription is removed.
	///
	/// The observer immediately receives the current value, if one is set. A
	/// derived stream stays alive while it has an observer, even if every
	/// handle to it was dropped.
	pub fn observe_forever(&self, observer: impl FnMut(&T) + 'static) -> Subscription {
		self.shared.observe_forever(Rc::new(RefCell::new(observer)))
	}

	/// Remove every observer bound to `owner`.
	pub fn remove_observers(&self, owner: &Lifecycle) {
		self.shared.remove_observers_of(owner);
	}

	pub fn has_observers(&self) -> bool {
		!self.shared.observers.borrow().is_empty()
	}

	pub fn has_active_observers(&self) -> bool {
		self.shared.active_count.get() > 0
	}

	/// Identity of the underlying container.
	pub(crate) fn key(&self) -> usize {
		Rc::as_ptr(&self.shared) as *const () as usize
	}
}

impl<T> Clone for LiveData<T> {
	fn clone(&self) -> Self {
		Self {
			shared: self.shared.clone(),
		}
	}
}

impl<T: fmt::Debug> fmt::Debug for LiveData<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LiveData")
			.field("value", &self.shared.data.borrow())
			.field("version", &self.shared.version.get())
			.field("observers", &self.shared.observers.borrow().len())
			.field("active", &self.shared.active_count.get())
			.finish()
	}
}

/// An observable value that can be set.
///
/// Dereferences to [`LiveData`] for the read side.
pub struct MutableLiveData<T> {
	live: LiveData<T>,
}

impl<T: 'static> MutableLiveData<T> {
	/// Create a container with no value.
	pub fn new() -> Self {
		Self {
			live: LiveData::from_shared(Rc::new(Shared::new(None))),
		}
	}

	pub(crate) fn from_shared(shared: Rc<Shared<T>>) -> Self {
		Self {
			live: LiveData::from_shared(shared),
		}
	}

	/// Create a container holding `value` at version 0.
	pub fn with_value(value: T) -> Self {
		Self {
			live: LiveData::from_shared(Rc::new(Shared::new(Some(value)))),
		}
	}

	/// Set the value and deliver it to active observers.
	pub fn set_value(&self, value: T) {
		self.live.shared.set_value(value);
	}

	/// A read-only handle to the same value.
	pub fn live_data(&self) -> LiveData<T> {
		self.live.clone()
	}
}

impl<T: 'static> Default for MutableLiveData<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Clone for MutableLiveData<T> {
	fn clone(&self) -> Self {
		Self {
			live: self.live.clone(),
		}
	}
}

impl<T> Deref for MutableLiveData<T> {
	type Target = LiveData<T>;

	fn deref(&self) -> &LiveData<T> {
		&self.live
	}
}

impl<T> From<MutableLiveData<T>> for LiveData<T> {
	fn from(mutable: MutableLiveData<T>) -> Self {
		mutable.live
	}
}

impl<T: fmt::Debug> fmt::Debug for MutableLiveData<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.live.fmt(f)
	}
}
