use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;

use tracing::{debug, trace};

use crate::lru::RecencyList;
#[cfg(feature = "metrics")]
use crate::metrics::{CacheMetrics, Counters};
use crate::traits::{Factory, NoFactory, NoopListener, RemovalListener, UnitWeigher, Weigher};

/// Size-bounded LRU cache with a pluggable weigher, miss factory and removal listener.
///
/// The cache keeps the sum of entry weights at or below `max_size`. Whenever an
/// insertion pushes the total above the bound, least recently used entries are
/// evicted until it fits again, and each eviction is reported to the
/// [`RemovalListener`] with `evicted = true`.
///
/// # Removal notifications
///
/// | cause                | `evicted` | `new_value` |
/// |----------------------|-----------|-------------|
/// | capacity eviction    | `true`    | `None`      |
/// | [`evict_all`]        | `true`    | `None`      |
/// | [`remove`]           | `false`   | `None`      |
/// | replacing [`put`]    | `false`   | `Some(new)` |
///
/// # Misses
///
/// [`get`] on an absent key calls the [`Factory`] once. A produced value is
/// inserted exactly like a [`put`] (trimming included) and returned; `None`
/// leaves the cache untouched.
///
/// # Thread safety
///
/// Operations take `&mut self` and are not synchronized. Wrap the cache in a
/// [`SharedLruCache`](crate::SharedLruCache) to share it between threads.
///
/// [`evict_all`]: LruCache::evict_all
/// [`remove`]: LruCache::remove
/// [`put`]: LruCache::put
/// [`get`]: LruCache::get
pub struct LruCache<K, V, W = UnitWeigher, F = NoFactory, L = NoopListener> {
	/// Access-ordered entries
	entries: RecencyList<K, V>,
	/// Maximum total weight
	max_size: usize,
	weigher: W,
	factory: F,
	listener: L,
	/// Metrics counters
	#[cfg(feature = "metrics")]
	counters: Counters,
}

impl<K: Hash + Eq, V> LruCache<K, V> {
	/// Create a cache holding at most `max_size` entries.
	///
	/// Every entry weighs 1, misses produce nothing and removals are not observed.
	/// Use [`CacheBuilder`](crate::CacheBuilder) to plug in callbacks.
	///
	/// # Panics
	///
	/// Panics if `max_size` is 0.
	pub fn new(max_size: usize) -> Self {
		Self::with_callbacks(max_size, UnitWeigher, NoFactory, NoopListener)
	}
}

impl<K, V, W, F, L> LruCache<K, V, W, F, L>
where
	K: Hash + Eq,
	W: Weigher<K, V>,
	F: Factory<K, V>,
	L: RemovalListener<K, V>,
{
	/// Create a cache from explicit callbacks.
	///
	/// # Panics
	///
	/// Panics if `max_size` is 0.
	pub fn with_callbacks(max_size: usize, weigher: W, factory: F, listener: L) -> Self {
		assert!(max_size > 0, "max_size must be greater than 0");
		Self {
			entries: RecencyList::new(),
			max_size,
			weigher,
			factory,
			listener,
			#[cfg(feature = "metrics")]
			counters: Counters::default(),
		}
	}

	/// Insert or replace a value and mark it most recently used.
	///
	/// A replaced value is reported as `(false, key, old, Some(new))`, then the
	/// cache is trimmed to `max_size`. The new entry itself is evicted if its
	/// weight alone exceeds `max_size`.
	///
	/// Returns the replaced value.
	pub fn put(&mut self, key: K, value: V) -> Option<V> {
		#[cfg(feature = "metrics")]
		{
			self.counters.puts += 1;
		}
		self.store(key, value)
	}

	/// Look up a value and mark it most recently used.
	///
	/// On a miss the factory is invoked once. A created value is stored as by
	/// [`put`](Self::put) and returned while it is still resident, which is
	/// always the case unless its weight alone exceeds `max_size`. Use
	/// [`get_clone`](Self::get_clone) to receive such a value anyway.
	pub fn get(&mut self, key: &K) -> Option<&V>
	where
		K: Clone,
	{
		if let Some(index) = self.entries.touch(key) {
			#[cfg(feature = "metrics")]
			{
				self.counters.hits += 1;
			}
			return self.entries.value_at(index);
		}

		#[cfg(feature = "metrics")]
		{
			self.counters.misses += 1;
		}
		let value = self.factory.create(key)?;
		#[cfg(feature = "metrics")]
		{
			self.counters.creates += 1;
		}

		self.store(key.clone(), value);
		self.entries.get(key).map(|slot| &slot.value)
	}

	/// Look up a value and return an owned copy.
	///
	/// Behaves like [`get`](Self::get), except that a value created on a miss is
	/// returned even if it was evicted immediately.
	pub fn get_clone(&mut self, key: &K) -> Option<V>
	where
		K: Clone,
		V: Clone,
	{
		if let Some(index) = self.entries.touch(key) {
			#[cfg(feature = "metrics")]
			{
				self.counters.hits += 1;
			}
			return self.entries.value_at(index).cloned();
		}

		#[cfg(feature = "metrics")]
		{
			self.counters.misses += 1;
		}
		let value = self.factory.create(key)?;
		#[cfg(feature = "metrics")]
		{
			self.counters.creates += 1;
		}

		self.store(key.clone(), value.clone());
		Some(value)
	}

	/// Look up a value without changing its recency or calling the factory.
	pub fn peek<Q>(&self, key: &Q) -> Option<&V>
	where
		K: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
	{
		self.entries.get(key).map(|slot| &slot.value)
	}

	/// Check if a key is resident, without changing its recency.
	pub fn contains<Q>(&self, key: &Q) -> bool
	where
		K: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
	{
		self.entries.contains(key)
	}

	/// Remove an entry, reporting it as `(false, key, old, None)`.
	pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
	where
		K: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
	{
		let (key, slot) = self.entries.remove(key)?;
		#[cfg(feature = "metrics")]
		{
			self.counters.removals += 1;
		}
		self.listener.on_removed(false, &key, &slot.value, None);
		Some(slot.value)
	}

	/// Evict least recently used entries until the total weight is at most `max_size`.
	///
	/// This does not change the configured bound; see [`resize`](Self::resize).
	pub fn trim_to_size(&mut self, max_size: usize) {
		while self.entries.size() > max_size {
			if !self.evict_lru() {
				break;
			}
		}
	}

	/// Change the maximum total weight, evicting entries if the cache no longer fits.
	///
	/// # Panics
	///
	/// Panics if `max_size` is 0.
	pub fn resize(&mut self, max_size: usize) {
		assert!(max_size > 0, "max_size must be greater than 0");
		debug!(from = self.max_size, to = max_size, "resizing cache");
		self.max_size = max_size;
		self.trim_to_size(max_size);
	}

	/// Evict every entry, reporting each as evicted.
	pub fn evict_all(&mut self) {
		debug!(entries = self.entries.len(), "evicting all entries");
		while let Some((key, slot)) = self.entries.pop_lru() {
			#[cfg(feature = "metrics")]
			{
				self.counters.evictions += 1;
			}
			self.listener.on_removed(true, &key, &slot.value, None);
		}
	}

	/// Copy of the resident entries, from least to most recently used.
	pub fn snapshot(&self) -> Vec<(K, V)>
	where
		K: Clone,
		V: Clone,
	{
		self.entries.iter().map(|(key, value)| (key.clone(), value.clone())).collect()
	}

	/// Iterate over resident entries from least to most recently used.
	pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
		self.entries.iter()
	}

	/// Current total weight of resident entries.
	pub fn size(&self) -> usize {
		self.entries.size()
	}

	/// Maximum total weight.
	pub fn max_size(&self) -> usize {
		self.max_size
	}

	/// Number of resident entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Check if the cache is empty.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Get a metrics snapshot.
	#[cfg(feature = "metrics")]
	pub fn metrics(&self) -> CacheMetrics {
		CacheMetrics::from_counters(&self.counters, self.size(), self.max_size, self.len())
	}

	/// Insert through the shared put/create path.
	fn store(&mut self, key: K, value: V) -> Option<V> {
		let weight = self.weigher.weight(&key, &value);
		let old = self.entries.remove(&key).map(|(_, slot)| slot);

		// Make room first so the running total cannot overflow
		while self.entries.size().checked_add(weight).is_none() {
			if !self.evict_lru() {
				break;
			}
		}
		self.entries.insert(key, value, weight);

		if let Some(ref old) = old {
			// The replacing entry is now the most recent one
			if let Some((key, slot)) = self.entries.most_recent() {
				self.listener.on_removed(false, key, &old.value, Some(&slot.value));
			}
		}

		self.trim_to_size(self.max_size);
		old.map(|slot| slot.value)
	}

	/// Evict the least recently used entry. Returns `false` if the cache is empty.
	fn evict_lru(&mut self) -> bool {
		let Some((key, slot)) = self.entries.pop_lru() else {
			return false;
		};
		trace!(weight = slot.weight, size = self.entries.size(), "evicted least recently used entry");
		#[cfg(feature = "metrics")]
		{
			self.counters.evictions += 1;
		}
		self.listener.on_removed(true, &key, &slot.value, None);
		true
	}
}

impl<K, V, W, F, L> fmt::Debug for LruCache<K, V, W, F, L> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut debug = f.debug_struct("LruCache");
		debug
			.field("max_size", &self.max_size)
			.field("size", &self.entries.size())
			.field("len", &self.entries.len());
		#[cfg(feature = "metrics")]
		debug.field("hits", &self.counters.hits).field("misses", &self.counters.misses);
		debug.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::LruCache;
	use crate::traits::{NoFactory, NoopListener, RemovalListener, UnitWeigher, Weigher};

	type Log = Rc<RefCell<Vec<(bool, u32, String, Option<String>)>>>;

	fn recording_cache(
		max_size: usize,
	) -> (LruCache<u32, String, impl Weigher<u32, String>, NoFactory, impl RemovalListener<u32, String>>, Log)
	{
		let log: Log = Rc::default();
		let sink = log.clone();
		let cache = LruCache::with_callbacks(
			max_size,
			|_key: &u32, value: &String| value.len(),
			NoFactory,
			move |evicted: bool, key: &u32, old: &String, new: Option<&String>| {
				sink.borrow_mut().push((evicted, *key, old.clone(), new.cloned()));
			},
		);
		(cache, log)
	}

	#[test]
	fn test_put_and_get() {
		let mut cache = LruCache::new(4);

		assert_eq!(cache.put(1, "one"), None);
		assert_eq!(cache.get(&1), Some(&"one"));
		assert_eq!(cache.get(&2), None);
		assert_eq!(cache.len(), 1);
		assert_eq!(cache.size(), 1);
	}

	#[test]
	fn test_put_replaces_and_notifies() {
		let (mut cache, log) = recording_cache(100);

		cache.put(1, "aaa".to_string());
		let old = cache.put(1, "bb".to_string());

		assert_eq!(old.as_deref(), Some("aaa"));
		assert_eq!(cache.size(), 2);
		assert_eq!(*log.borrow(), vec![(false, 1, "aaa".to_string(), Some("bb".to_string()))]);
	}

	#[test]
	fn test_eviction_is_lru_first() {
		let (mut cache, log) = recording_cache(6);

		cache.put(1, "aa".to_string());
		cache.put(2, "bb".to_string());
		cache.put(3, "cc".to_string());
		// Touch 1 so that 2 becomes the eldest
		cache.get(&1);
		cache.put(4, "dddd".to_string());

		assert_eq!(cache.size(), 6);
		assert!(!cache.contains(&2));
		assert!(!cache.contains(&3));
		assert!(cache.contains(&1));
		assert!(cache.contains(&4));
		assert_eq!(
			*log.borrow(),
			vec![(true, 2, "bb".to_string(), None), (true, 3, "cc".to_string(), None)]
		);
	}

	#[test]
	fn test_oversized_entry_evicts_itself() {
		let (mut cache, log) = recording_cache(3);

		cache.put(1, "a".to_string());
		cache.put(2, "toolong".to_string());

		assert!(cache.is_empty());
		assert_eq!(cache.size(), 0);
		assert_eq!(log.borrow().len(), 2);
		assert_eq!(log.borrow()[1], (true, 2, "toolong".to_string(), None));
	}

	#[test]
	fn test_remove_notifies_not_evicted() {
		let (mut cache, log) = recording_cache(10);

		cache.put(7, "x".to_string());
		assert_eq!(cache.remove(&7).as_deref(), Some("x"));
		assert_eq!(cache.remove(&7), None);

		assert_eq!(*log.borrow(), vec![(false, 7, "x".to_string(), None)]);
		assert_eq!(cache.size(), 0);
	}

	#[test]
	fn test_factory_on_miss() {
		let calls = Rc::new(RefCell::new(Vec::new()));
		let seen = calls.clone();
		let mut cache = LruCache::with_callbacks(
			10,
			UnitWeigher,
			move |key: &u32| {
				seen.borrow_mut().push(*key);
				(*key % 2 == 0).then(|| key * 10)
			},
			NoopListener,
		);

		assert_eq!(cache.get(&4), Some(&40));
		assert_eq!(cache.get(&4), Some(&40));
		assert_eq!(*calls.borrow(), vec![4]);

		// Odd keys produce nothing and leave the cache alone
		assert_eq!(cache.get(&3), None);
		assert_eq!(*calls.borrow(), vec![4, 3]);
		assert_eq!(cache.len(), 1);
		assert!(!cache.contains(&3));
	}

	#[test]
	fn test_get_clone_returns_oversized_created_value() {
		let mut cache = LruCache::with_callbacks(
			2,
			|_key: &u32, value: &Vec<u8>| value.len(),
			|key: &u32| Some(vec![0u8; *key as usize]),
			NoopListener,
		);

		assert_eq!(cache.get_clone(&5), Some(vec![0u8; 5]));
		assert!(cache.is_empty());
		assert_eq!(cache.get(&5), None);
		assert_eq!(cache.get(&1), Some(&vec![0u8]));
	}

	#[test]
	fn test_peek_does_not_promote() {
		let mut cache = LruCache::new(2);
		cache.put("a", 1);
		cache.put("b", 2);

		assert_eq!(cache.peek(&"a"), Some(&1));
		cache.put("c", 3);

		assert!(!cache.contains(&"a"));
		assert_eq!(cache.snapshot(), vec![("b", 2), ("c", 3)]);
	}

	#[test]
	fn test_resize_trims() {
		let (mut cache, log) = recording_cache(10);
		for key in 0..5 {
			cache.put(key, "ab".to_string());
		}

		cache.resize(4);
		assert_eq!(cache.max_size(), 4);
		assert_eq!(cache.size(), 4);
		assert_eq!(cache.iter().map(|(key, _)| *key).collect::<Vec<_>>(), vec![3, 4]);
		assert!(log.borrow().iter().all(|(evicted, ..)| *evicted));
	}

	#[test]
	fn test_trim_to_size_keeps_bound() {
		let mut cache = LruCache::new(5);
		for key in 0..5 {
			cache.put(key, ());
		}

		cache.trim_to_size(2);
		assert_eq!(cache.len(), 2);
		assert_eq!(cache.max_size(), 5);
	}

	#[test]
	fn test_evict_all() {
		let (mut cache, log) = recording_cache(10);
		cache.put(1, "a".to_string());
		cache.put(2, "b".to_string());

		cache.evict_all();

		assert!(cache.is_empty());
		assert_eq!(cache.size(), 0);
		assert_eq!(
			*log.borrow(),
			vec![(true, 1, "a".to_string(), None), (true, 2, "b".to_string(), None)]
		);
	}

	#[test]
	#[should_panic(expected = "max_size must be greater than 0")]
	fn test_zero_capacity_panics() {
		let _cache: LruCache<u32, u32> = LruCache::new(0);
	}

	#[test]
	#[should_panic(expected = "max_size must be greater than 0")]
	fn test_resize_to_zero_panics() {
		let mut cache: LruCache<u32, u32> = LruCache::new(1);
		cache.resize(0);
	}

	#[cfg(feature = "metrics")]
	#[test]
	fn test_metrics_counters() {
		let mut cache = LruCache::with_callbacks(2, UnitWeigher, |key: &u32| Some(*key), NoopListener);

		cache.put(1, 1);
		cache.get(&1);
		cache.get(&2);
		cache.get(&3);
		cache.remove(&3);

		let metrics = cache.metrics();
		assert_eq!(metrics.hits, 1);
		assert_eq!(metrics.misses, 2);
		assert_eq!(metrics.creates, 2);
		assert_eq!(metrics.puts, 1);
		assert_eq!(metrics.evictions, 1);
		assert_eq!(metrics.removals, 1);
		assert_eq!(metrics.entry_count, 1);
		assert_eq!(metrics.max_size, 2);
	}

	#[test]
	fn test_extreme_weights_keep_exact_size() {
		let log: Rc<RefCell<Vec<(bool, u32)>>> = Rc::default();
		let sink = log.clone();
		let mut cache = LruCache::with_callbacks(
			usize::MAX,
			|_key: &u32, weight: &usize| *weight,
			NoFactory,
			move |evicted: bool, key: &u32, _old: &usize, _new: Option<&usize>| {
				sink.borrow_mut().push((evicted, *key));
			},
		);

		cache.put(1, usize::MAX);
		assert_eq!(cache.put(1, 1), Some(usize::MAX));
		assert_eq!(cache.size(), 1);

		// Both fit the bound alone but not together
		cache.put(2, usize::MAX);
		assert_eq!(cache.size(), usize::MAX);
		assert_eq!(cache.snapshot(), vec![(2, usize::MAX)]);

		cache.put(3, 5);
		assert_eq!(cache.size(), 5);
		assert_eq!(cache.snapshot(), vec![(3, 5)]);
		assert_eq!(*log.borrow(), vec![(false, 1), (true, 1), (true, 2)]);
	}

	#[test]
	fn test_debug_output() {
		let mut cache = LruCache::new(3);
		cache.put(1, 1);

		let rendered = format!("{cache:?}");
		assert!(rendered.starts_with("LruCache"));
		assert!(rendered.contains("max_size: 3"));
		assert!(rendered.contains("len: 1"));
	}
}
