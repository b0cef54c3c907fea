/// Computes the weight an entry contributes to the cache's total size.
///
/// The weight is computed once, when the entry is inserted, and stored next to
/// the value. Removing or evicting the entry subtracts the stored weight, so a
/// weigher that is not a pure function cannot corrupt the size accounting.
///
/// Any `Fn(&K, &V) -> usize` closure is a weigher:
///
/// ```
/// use callback_lru::CacheBuilder;
///
/// let mut cache = CacheBuilder::new(16)
///     .weigher(|_key: &u32, value: &String| value.len())
///     .build();
///
/// cache.put(1, "hello".to_string());
/// assert_eq!(cache.size(), 5);
/// ```
pub trait Weigher<K, V> {
	/// Weight of the given entry.
	fn weight(&self, key: &K, value: &V) -> usize;
}

impl<K, V, Fun> Weigher<K, V> for Fun
where
	Fun: Fn(&K, &V) -> usize,
{
	fn weight(&self, key: &K, value: &V) -> usize {
		self(key, value)
	}
}

/// Synthesizes a value for a key that missed the cache.
///
/// Returning `None` reports that no value exists for the key; the cache is
/// left untouched in that case.
pub trait Factory<K, V> {
	/// Create the value for `key`, if one exists.
	fn create(&mut self, key: &K) -> Option<V>;
}

impl<K, V, Fun> Factory<K, V> for Fun
where
	Fun: FnMut(&K) -> Option<V>,
{
	fn create(&mut self, key: &K) -> Option<V> {
		self(key)
	}
}

/// Receives every entry that leaves the cache.
///
/// `evicted` is `true` when the entry was dropped to make room (or by
/// [`evict_all`](crate::LruCache::evict_all)), and `false` when it was removed
/// explicitly or replaced by a `put`. `new_value` is only set for replacements.
pub trait RemovalListener<K, V> {
	/// Called after the entry has been detached from the cache.
	fn on_removed(&mut self, evicted: bool, key: &K, old_value: &V, new_value: Option<&V>);
}

impl<K, V, Fun> RemovalListener<K, V> for Fun
where
	Fun: FnMut(bool, &K, &V, Option<&V>),
{
	fn on_removed(&mut self, evicted: bool, key: &K, old_value: &V, new_value: Option<&V>) {
		self(evicted, key, old_value, new_value)
	}
}

/// Every entry weighs 1, so the cache is bounded by entry count.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitWeigher;

impl<K, V> Weigher<K, V> for UnitWeigher {
	fn weight(&self, _key: &K, _value: &V) -> usize {
		1
	}
}

/// Factory that never produces a value.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFactory;

impl<K, V> Factory<K, V> for NoFactory {
	fn create(&mut self, _key: &K) -> Option<V> {
		None
	}
}

/// Listener that ignores removals.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl<K, V> RemovalListener<K, V> for NoopListener {
	fn on_removed(&mut self, _evicted: bool, _key: &K, _old_value: &V, _new_value: Option<&V>) {}
}
