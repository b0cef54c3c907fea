//! Cache statistics.

/// Running counters kept by a cache.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Counters {
	pub hits: u64,
	pub misses: u64,
	pub creates: u64,
	pub puts: u64,
	pub evictions: u64,
	pub removals: u64,
}

/// Snapshot of cache statistics.
///
/// # Example
///
/// ```
/// use callback_lru::LruCache;
///
/// let mut cache = LruCache::new(2);
/// cache.put("a", 1);
/// cache.get(&"a");
/// cache.get(&"b");
///
/// let metrics = cache.metrics();
/// assert_eq!(metrics.hits, 1);
/// assert_eq!(metrics.misses, 1);
/// println!("Hit rate: {:.2}%", metrics.hit_rate() * 100.0);
/// ```
#[non_exhaustive]
#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
	/// Lookups that found a resident entry.
	pub hits: u64,
	/// Lookups that did not find a resident entry, whether or not the factory produced one.
	pub misses: u64,
	/// Values produced by the factory and inserted.
	pub creates: u64,
	/// Calls to `put`.
	pub puts: u64,
	/// Entries dropped to respect the size bound, including `evict_all`.
	pub evictions: u64,
	/// Entries removed through `remove`.
	pub removals: u64,
	/// Current total weight of resident entries.
	pub size: usize,
	/// Configured maximum total weight.
	pub max_size: usize,
	/// Number of resident entries.
	pub entry_count: usize,
}

impl CacheMetrics {
	pub(crate) fn from_counters(
		counters: &Counters,
		size: usize,
		max_size: usize,
		entry_count: usize,
	) -> Self {
		Self {
			hits: counters.hits,
			misses: counters.misses,
			creates: counters.creates,
			puts: counters.puts,
			evictions: counters.evictions,
			removals: counters.removals,
			size,
			max_size,
			entry_count,
		}
	}

	/// Hit rate as a ratio between 0.0 and 1.0.
	///
	/// Returns 0.0 if there have been no lookups.
	pub fn hit_rate(&self) -> f64 {
		let total = self.total_accesses();
		if total == 0 {
			0.0
		} else {
			self.hits as f64 / total as f64
		}
	}

	/// Fraction of `max_size` currently in use.
	pub fn utilization(&self) -> f64 {
		if self.max_size == 0 {
			0.0
		} else {
			self.size as f64 / self.max_size as f64
		}
	}

	/// Total number of lookups (hits + misses).
	pub fn total_accesses(&self) -> u64 {
		self.hits + self.misses
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_rates_with_no_activity() {
		let metrics = CacheMetrics::default();
		assert_eq!(metrics.hit_rate(), 0.0);
		assert_eq!(metrics.utilization(), 0.0);
		assert_eq!(metrics.total_accesses(), 0);
	}

	#[test]
	fn test_rates() {
		let counters = Counters {
			hits: 3,
			misses: 1,
			..Counters::default()
		};
		let metrics = CacheMetrics::from_counters(&counters, 25, 100, 5);

		assert_eq!(metrics.total_accesses(), 4);
		assert!((metrics.hit_rate() - 0.75).abs() < f64::EPSILON);
		assert!((metrics.utilization() - 0.25).abs() < f64::EPSILON);
	}
}
