use std::hash::Hash;

use crate::cache::LruCache;
use crate::error::BuildError;
use crate::shared::SharedLruCache;
use crate::traits::{Factory, NoFactory, NoopListener, RemovalListener, UnitWeigher, Weigher};

/// Default maximum size used by [`CacheBuilder::default`].
const DEFAULT_MAX_SIZE: usize = 1024;

/// Builder for configuring an [`LruCache`].
///
/// Each setter swaps one callback type, so the built cache is fully
/// monomorphized over the closures it was given.
///
/// # Example
///
/// ```
/// use callback_lru::CacheBuilder;
///
/// let mut cache = CacheBuilder::new(64)
///     .weigher(|_key: &String, value: &Vec<u8>| value.len())
///     .factory(|key: &String| Some(key.as_bytes().to_vec()))
///     .on_removed(|evicted: bool, key: &String, _old: &Vec<u8>, _new: Option<&Vec<u8>>| {
///         if evicted {
///             println!("evicted {key}");
///         }
///     })
///     .build();
///
/// assert_eq!(cache.get(&"abc".to_string()), Some(&b"abc".to_vec()));
/// assert_eq!(cache.size(), 3);
/// ```
pub struct CacheBuilder<W = UnitWeigher, F = NoFactory, L = NoopListener> {
	max_size: usize,
	weigher: W,
	factory: F,
	listener: L,
}

impl CacheBuilder {
	/// Create a new builder with the given maximum total weight.
	pub fn new(max_size: usize) -> Self {
		Self {
			max_size,
			weigher: UnitWeigher,
			factory: NoFactory,
			listener: NoopListener,
		}
	}
}

impl<W, F, L> CacheBuilder<W, F, L> {
	/// Set the maximum total weight.
	pub fn max_size(mut self, max_size: usize) -> Self {
		self.max_size = max_size;
		self
	}

	/// Set the function computing each entry's weight.
	///
	/// Default: every entry weighs 1.
	pub fn weigher<W2>(self, weigher: W2) -> CacheBuilder<W2, F, L> {
		CacheBuilder {
			max_size: self.max_size,
			weigher,
			factory: self.factory,
			listener: self.listener,
		}
	}

	/// Set the function producing values on a miss.
	///
	/// Default: misses produce nothing.
	pub fn factory<F2>(self, factory: F2) -> CacheBuilder<W, F2, L> {
		CacheBuilder {
			max_size: self.max_size,
			weigher: self.weigher,
			factory,
			listener: self.listener,
		}
	}

	/// Set the listener notified whenever an entry leaves the cache.
	///
	/// Default: removals are not observed.
	pub fn on_removed<L2>(self, listener: L2) -> CacheBuilder<W, F, L2> {
		CacheBuilder {
			max_size: self.max_size,
			weigher: self.weigher,
			factory: self.factory,
			listener,
		}
	}

	/// Build the cache, reporting invalid settings.
	pub fn try_build<K, V>(self) -> Result<LruCache<K, V, W, F, L>, BuildError>
	where
		K: Hash + Eq,
		W: Weigher<K, V>,
		F: Factory<K, V>,
		L: RemovalListener<K, V>,
	{
		if self.max_size == 0 {
			return Err(BuildError::ZeroCapacity);
		}
		Ok(LruCache::with_callbacks(self.max_size, self.weigher, self.factory, self.listener))
	}

	/// Build the cache.
	///
	/// # Panics
	///
	/// Panics if the maximum size is 0.
	pub fn build<K, V>(self) -> LruCache<K, V, W, F, L>
	where
		K: Hash + Eq,
		W: Weigher<K, V>,
		F: Factory<K, V>,
		L: RemovalListener<K, V>,
	{
		match self.try_build() {
			Ok(cache) => cache,
			Err(err) => panic!("{err}"),
		}
	}

	/// Build a cache that can be shared across threads.
	///
	/// # Panics
	///
	/// Panics if the maximum size is 0.
	pub fn build_shared<K, V>(self) -> SharedLruCache<K, V, W, F, L>
	where
		K: Hash + Eq,
		W: Weigher<K, V>,
		F: Factory<K, V>,
		L: RemovalListener<K, V>,
	{
		SharedLruCache::from(self.build())
	}
}

impl Default for CacheBuilder {
	/// Create a builder with default settings and room for 1024 unit-weight entries.
	fn default() -> Self {
		Self::new(DEFAULT_MAX_SIZE)
	}
}

/// Create a cache from all of its callbacks at once.
///
/// Closure arguments are inferred from the bounds, so no annotations are needed:
///
/// ```
/// use callback_lru::lru_cache;
///
/// let mut cache = lru_cache(
///     10,
///     |_key: &u32, value: &String| value.len(),
///     |key| Some(key.to_string()),
///     |evicted, key, old, _new| println!("{key} -> {old} left (evicted: {evicted})"),
/// );
///
/// assert_eq!(cache.get(&1234).map(String::as_str), Some("1234"));
/// ```
///
/// # Panics
///
/// Panics if `max_size` is 0.
pub fn lru_cache<K, V, W, F, L>(
	max_size: usize,
	size_of: W,
	create: F,
	on_removed: L,
) -> LruCache<K, V, W, F, L>
where
	K: Hash + Eq,
	W: Fn(&K, &V) -> usize,
	F: FnMut(&K) -> Option<V>,
	L: FnMut(bool, &K, &V, Option<&V>),
{
	LruCache::with_callbacks(max_size, size_of, create, on_removed)
}
