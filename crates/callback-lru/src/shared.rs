use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;

use parking_lot::Mutex;

use crate::cache::LruCache;
#[cfg(feature = "metrics")]
use crate::metrics::CacheMetrics;
use crate::traits::{Factory, NoFactory, NoopListener, RemovalListener, UnitWeigher, Weigher};

/// An [`LruCache`] behind a mutex, shareable across threads via `Arc`.
///
/// Every method takes `&self` and returns owned values, so no lock outlives a
/// call and results can be held across `.await` points. The cache is
/// `Send + Sync` whenever the keys, values and callbacks are `Send`.
///
/// The weigher, factory and removal listener run while the lock is held. They
/// must not call back into the same cache.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
///
/// use callback_lru::SharedLruCache;
///
/// let cache = Arc::new(SharedLruCache::new(128));
///
/// let handles: Vec<_> = (0..4u64)
///     .map(|t| {
///         let cache = cache.clone();
///         thread::spawn(move || {
///             for i in 0..10 {
///                 cache.put(t * 10 + i, i);
///             }
///         })
///     })
///     .collect();
///
/// for handle in handles {
///     handle.join().unwrap();
/// }
///
/// assert_eq!(cache.len(), 40);
/// ```
pub struct SharedLruCache<K, V, W = UnitWeigher, F = NoFactory, L = NoopListener> {
	inner: Mutex<LruCache<K, V, W, F, L>>,
}

impl<K: Hash + Eq, V> SharedLruCache<K, V> {
	/// Create a shared cache holding at most `max_size` unit-weight entries.
	///
	/// # Panics
	///
	/// Panics if `max_size` is 0.
	pub fn new(max_size: usize) -> Self {
		Self::from(LruCache::new(max_size))
	}
}

impl<K, V, W, F, L> SharedLruCache<K, V, W, F, L>
where
	K: Hash + Eq,
	W: Weigher<K, V>,
	F: Factory<K, V>,
	L: RemovalListener<K, V>,
{
	/// See [`LruCache::put`].
	pub fn put(&self, key: K, value: V) -> Option<V> {
		self.inner.lock().put(key, value)
	}

	/// See [`LruCache::get_clone`].
	pub fn get(&self, key: &K) -> Option<V>
	where
		K: Clone,
		V: Clone,
	{
		self.inner.lock().get_clone(key)
	}

	/// See [`LruCache::peek`].
	pub fn peek<Q>(&self, key: &Q) -> Option<V>
	where
		K: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
		V: Clone,
	{
		self.inner.lock().peek(key).cloned()
	}

	/// See [`LruCache::contains`].
	pub fn contains<Q>(&self, key: &Q) -> bool
	where
		K: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
	{
		self.inner.lock().contains(key)
	}

	/// See [`LruCache::remove`].
	pub fn remove<Q>(&self, key: &Q) -> Option<V>
	where
		K: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
	{
		self.inner.lock().remove(key)
	}

	/// See [`LruCache::trim_to_size`].
	pub fn trim_to_size(&self, max_size: usize) {
		self.inner.lock().trim_to_size(max_size);
	}

	/// See [`LruCache::resize`].
	pub fn resize(&self, max_size: usize) {
		self.inner.lock().resize(max_size);
	}

	/// See [`LruCache::evict_all`].
	pub fn evict_all(&self) {
		self.inner.lock().evict_all();
	}

	/// See [`LruCache::snapshot`].
	pub fn snapshot(&self) -> Vec<(K, V)>
	where
		K: Clone,
		V: Clone,
	{
		self.inner.lock().snapshot()
	}

	/// Current total weight of resident entries.
	pub fn size(&self) -> usize {
		self.inner.lock().size()
	}

	/// Maximum total weight.
	pub fn max_size(&self) -> usize {
		self.inner.lock().max_size()
	}

	/// Number of resident entries.
	pub fn len(&self) -> usize {
		self.inner.lock().len()
	}

	/// Check if the cache is empty.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Get a metrics snapshot.
	#[cfg(feature = "metrics")]
	pub fn metrics(&self) -> CacheMetrics {
		self.inner.lock().metrics()
	}

	/// Run `f` with exclusive access to the underlying cache.
	///
	/// Useful for compound operations that must not interleave with other threads.
	pub fn with<R>(&self, f: impl FnOnce(&mut LruCache<K, V, W, F, L>) -> R) -> R {
		f(&mut self.inner.lock())
	}

	/// Unwrap into the underlying cache.
	pub fn into_inner(self) -> LruCache<K, V, W, F, L> {
		self.inner.into_inner()
	}
}

impl<K, V, W, F, L> From<LruCache<K, V, W, F, L>> for SharedLruCache<K, V, W, F, L> {
	fn from(cache: LruCache<K, V, W, F, L>) -> Self {
		Self {
			inner: Mutex::new(cache),
		}
	}
}

impl<K, V, W, F, L> fmt::Debug for SharedLruCache<K, V, W, F, L> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.inner.try_lock() {
			Some(cache) => f.debug_tuple("SharedLruCache").field(&*cache).finish(),
			None => f.write_str("SharedLruCache(<locked>)"),
		}
	}
}
