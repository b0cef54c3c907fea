use thiserror::Error;

use crate::lifecycle::LifecycleState;

/// Errors reported by lifecycles and mediators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LiveDataError {
	/// The source is already attached to this mediator.
	#[error("source is already attached to this mediator")]
	SourceAlreadyAdded,
	/// The lifecycle cannot move between these states.
	#[error("lifecycle cannot move from {from:?} to {to:?}")]
	IllegalTransition {
		from: LifecycleState,
		to: LifecycleState,
	},
}
