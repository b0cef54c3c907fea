use thiserror::Error;

/// Reasons a [`CacheBuilder`](crate::CacheBuilder) refuses to build a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BuildError {
	/// The cache could never hold an entry.
	#[error("max_size must be greater than 0")]
	ZeroCapacity,
}
