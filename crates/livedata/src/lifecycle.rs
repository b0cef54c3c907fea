//! Lifecycle owners.
//!
//! A [`Lifecycle`] is the state machine that lifecycle-bound subscriptions
//! follow: an observer registered through
//! [`LiveData::observe`](crate::LiveData::observe) only receives values while
//! its lifecycle is at least [`LifecycleState::Started`], and is removed when
//! the lifecycle reaches [`LifecycleState::Destroyed`].

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::error::LiveDataError;

/// Lifecycle states, ordered from `Destroyed` to `Resumed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LifecycleState {
	/// Terminal state; no further transitions are allowed.
	Destroyed,
	/// Constructed but not yet created.
	#[default]
	Initialized,
	Created,
	/// Visible; observers bound to the lifecycle are active from here on.
	Started,
	Resumed,
}

impl LifecycleState {
	/// Check whether this state is the same as or later than `other`.
	pub fn is_at_least(self, other: LifecycleState) -> bool {
		self >= other
	}
}

/// Lifecycle events and the state each one leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
	OnCreate,
	OnStart,
	OnResume,
	OnPause,
	OnStop,
	OnDestroy,
}

impl LifecycleEvent {
	/// The state a lifecycle is in right after this event.
	pub fn target_state(self) -> LifecycleState {
		match self {
			Self::OnCreate | Self::OnStop => LifecycleState::Created,
			Self::OnStart | Self::OnPause => LifecycleState::Started,
			Self::OnResume => LifecycleState::Resumed,
			Self::OnDestroy => LifecycleState::Destroyed,
		}
	}
}

pub(crate) type StateListener = Rc<dyn Fn(LifecycleState)>;

struct Inner {
	state: Cell<LifecycleState>,
	listeners: RefCell<Vec<(u64, StateListener)>>,
	next_id: Cell<u64>,
}

/// Handle to a lifecycle. Clones share the same state.
///
/// # Example
///
/// ```
/// use livedata::{Lifecycle, LifecycleEvent, LifecycleState};
///
/// let lifecycle = Lifecycle::new();
/// lifecycle.handle_event(LifecycleEvent::OnCreate).unwrap();
/// lifecycle.handle_event(LifecycleEvent::OnStart).unwrap();
/// assert!(lifecycle.current_state().is_at_least(LifecycleState::Started));
/// ```
#[derive(Clone)]
pub struct Lifecycle {
	inner: Rc<Inner>,
}

impl Lifecycle {
	/// Create a lifecycle in the `Initialized` state.
	pub fn new() -> Self {
		Self {
			inner: Rc::new(Inner {
				state: Cell::new(LifecycleState::Initialized),
				listeners: RefCell::new(Vec::new()),
				next_id: Cell::new(0),
			}),
		}
	}

	pub fn current_state(&self) -> LifecycleState {
		self.inner.state.get()
	}

	/// Move to `state` and notify bound observers.
	///
	/// A destroyed lifecycle cannot move anywhere, and a lifecycle that was
	/// never created cannot be destroyed.
	pub fn set_current_state(&self, state: LifecycleState) -> Result<(), LiveDataError> {
		let from = self.current_state();
		if from == state {
			return Ok(());
		}
		if from == LifecycleState::Destroyed
			|| (from == LifecycleState::Initialized && state == LifecycleState::Destroyed)
		{
			return Err(LiveDataError::IllegalTransition {
				from,
				to: state,
			});
		}

		trace!(?from, to = ?state, "lifecycle transition");
		self.inner.state.set(state);

		let listeners: Vec<(u64, StateListener)> = self.inner.listeners.borrow().clone();
		for (id, listener) in listeners {
			// Skip listeners detached by an earlier listener in this pass
			if self.inner.listeners.borrow().iter().any(|(other, _)| *other == id) {
				listener(state);
			}
		}
		Ok(())
	}

	/// Move to the state that follows `event`.
	pub fn handle_event(&self, event: LifecycleEvent) -> Result<(), LiveDataError> {
		self.set_current_state(event.target_state())
	}

	pub(crate) fn add_listener(&self, listener: StateListener) -> u64 {
		let id = self.inner.next_id.get();
		self.inner.next_id.set(id + 1);
		self.inner.listeners.borrow_mut().push((id, listener));
		id
	}

	pub(crate) fn remove_listener(&self, id: u64) {
		// Dropped after the borrow ends, the listener may own observers
		let _removed = {
			let mut listeners = self.inner.listeners.borrow_mut();
			listeners.iter().position(|(other, _)| *other == id).map(|index| listeners.remove(index))
		};
	}

	pub(crate) fn listener_count(&self) -> usize {
		self.inner.listeners.borrow().len()
	}

	pub(crate) fn downgrade(&self) -> WeakLifecycle {
		WeakLifecycle(Rc::downgrade(&self.inner))
	}
}

/// Non-owning lifecycle handle kept by bound observers.
pub(crate) struct WeakLifecycle(Weak<Inner>);

impl WeakLifecycle {
	pub(crate) fn upgrade(&self) -> Option<Lifecycle> {
		self.0.upgrade().map(|inner| Lifecycle {
			inner,
		})
	}

	/// Check whether this handle points at `lifecycle`.
	pub(crate) fn is(&self, lifecycle: &Lifecycle) -> bool {
		std::ptr::eq(self.0.as_ptr(), Rc::as_ptr(&lifecycle.inner))
	}
}

impl Default for Lifecycle {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for Lifecycle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Lifecycle")
			.field("state", &self.current_state())
			.field("observers", &self.listener_count())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_state_ordering() {
		assert!(LifecycleState::Resumed.is_at_least(LifecycleState::Started));
		assert!(LifecycleState::Started.is_at_least(LifecycleState::Started));
		assert!(!LifecycleState::Created.is_at_least(LifecycleState::Started));
		assert!(!LifecycleState::Destroyed.is_at_least(LifecycleState::Initialized));
	}

	#[test]
	fn test_event_targets() {
		assert_eq!(LifecycleEvent::OnCreate.target_state(), LifecycleState::Created);
		assert_eq!(LifecycleEvent::OnPause.target_state(), LifecycleState::Started);
		assert_eq!(LifecycleEvent::OnStop.target_state(), LifecycleState::Created);
		assert_eq!(LifecycleEvent::OnDestroy.target_state(), LifecycleState::Destroyed);
	}

	#[test]
	fn test_listeners_see_transitions() {
		let lifecycle = Lifecycle::new();
		let seen = Rc::new(RefCell::new(Vec::new()));
		let sink = seen.clone();
		lifecycle.add_listener(Rc::new(move |state: LifecycleState| sink.borrow_mut().push(state)));

		lifecycle.handle_event(LifecycleEvent::OnCreate).unwrap();
		lifecycle.handle_event(LifecycleEvent::OnResume).unwrap();
		// Same state again is a no-op
		lifecycle.set_current_state(LifecycleState::Resumed).unwrap();
		lifecycle.handle_event(LifecycleEvent::OnDestroy).unwrap();

		assert_eq!(
			*seen.borrow(),
			vec![LifecycleState::Created, LifecycleState::Resumed, LifecycleState::Destroyed]
		);
	}

	#[test]
	fn test_listener_can_detach_another() {
		let lifecycle = Lifecycle::new();
		let calls = Rc::new(Cell::new(0));

		let second_id = Rc::new(Cell::new(None));
		let (detacher, target) = (lifecycle.clone(), second_id.clone());
		lifecycle.add_listener(Rc::new(move |_: LifecycleState| {
			if let Some(id) = target.get() {
				detacher.remove_listener(id);
			}
		}));
		let counter = calls.clone();
		second_id.set(Some(lifecycle.add_listener(Rc::new(move |_: LifecycleState| counter.set(counter.get() + 1)))));

		lifecycle.handle_event(LifecycleEvent::OnCreate).unwrap();
		assert_eq!(calls.get(), 0);
		assert_eq!(lifecycle.listener_count(), 1);
	}

	#[test]
	fn test_illegal_transitions() {
		let lifecycle = Lifecycle::new();
		assert_eq!(
			lifecycle.handle_event(LifecycleEvent::OnDestroy),
			Err(LiveDataError::IllegalTransition {
				from: LifecycleState::Initialized,
				to: LifecycleState::Destroyed,
			})
		);

		lifecycle.handle_event(LifecycleEvent::OnCreate).unwrap();
		lifecycle.handle_event(LifecycleEvent::OnDestroy).unwrap();
		assert!(lifecycle.handle_event(LifecycleEvent::OnStart).is_err());
		assert_eq!(lifecycle.current_state(), LifecycleState::Destroyed);
	}
}
