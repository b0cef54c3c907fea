//! Lifecycle-aware observable values.
//!
//! A [`MutableLiveData`] holds a value and notifies observers when it changes.
//! Observers are either bound to a [`Lifecycle`], and receive values only while
//! it is started, or registered forever until their [`Subscription`] is
//! removed.
//!
//! [`MediatorLiveData`] republishes values derived from other live data, and
//! the [`LiveDataExt`] and [`NullableLiveDataExt`] traits build common derived
//! streams on top of it.
//!
//! # Quick Start
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use livedata::{Lifecycle, LifecycleEvent, LiveDataExt, MutableLiveData};
//!
//! let lifecycle = Lifecycle::new();
//! let temperature = MutableLiveData::<i32>::new();
//! let freezing = temperature.map(|degrees: &i32| *degrees <= 0).distinct();
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = seen.clone();
//! freezing.observe(&lifecycle, move |value: &bool| sink.borrow_mut().push(*value));
//!
//! lifecycle.handle_event(LifecycleEvent::OnStart).unwrap();
//! for degrees in [5, 3, -1, -4, 2] {
//! 	temperature.set_value(degrees);
//! }
//!
//! assert_eq!(*seen.borrow(), vec![false, true, false]);
//! ```
//!
//! # Threading
//!
//! All types are `!Send` and `!Sync`. Values are set and delivered on the
//! thread that owns them, and observers run synchronously inside `set_value`.

mod error;
mod ext;
mod lifecycle;
mod live_data;
mod mediator;
mod operator;

pub use error::LiveDataError;
pub use ext::{LiveDataExt, NullableLiveDataExt};
pub use lifecycle::{Lifecycle, LifecycleEvent, LifecycleState};
pub use live_data::{LiveData, MutableLiveData, Subscription};
pub use mediator::{MediatorLiveData, WeakMediatorLiveData};
