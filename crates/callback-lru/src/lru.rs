//! Recency-ordered entry storage.
//!
//! Entries live in an [`IndexMap`] whose iteration order is the access order:
//! index 0 is the least recently used entry and the last index is the most
//! recently used one. Promoting an entry moves it to the back, eviction pops
//! from the front.

use std::borrow::Borrow;
use std::hash::Hash;

use ahash::RandomState;
use indexmap::IndexMap;

/// A stored value together with the weight it was admitted with.
pub(crate) struct Slot<V> {
	pub(crate) value: V,
	pub(crate) weight: usize,
}

/// Access-ordered map that tracks the sum of its entry weights.
///
/// Not thread-safe on its own; `SharedLruCache` wraps the owning cache in a mutex.
pub(crate) struct RecencyList<K, V> {
	entries: IndexMap<K, Slot<V>, RandomState>,
	/// Sum of `Slot::weight` over all entries
	size: usize,
}

impl<K, V> RecencyList<K, V> {
	pub fn size(&self) -> usize {
		self.size
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}
}

impl<K: Hash + Eq, V> RecencyList<K, V> {
	pub fn new() -> Self {
		Self {
			entries: IndexMap::with_hasher(RandomState::new()),
			size: 0,
		}
	}

	/// Insert or replace an entry and mark it most recently used.
	///
	/// The caller makes sure the new total fits in a `usize`. Returns the
	/// replaced slot, if any.
	pub fn insert(&mut self, key: K, value: V, weight: usize) -> Option<Slot<V>> {
		let (index, old) = self.entries.insert_full(
			key,
			Slot {
				value,
				weight,
			},
		);
		if let Some(ref old) = old {
			self.size -= old.weight;
			// Replacement keeps the old position, new keys are already at the back
			self.promote(index);
		}
		self.size += weight;

		old
	}

	/// Mark an entry most recently used. Returns its new index.
	pub fn touch<Q>(&mut self, key: &Q) -> Option<usize>
	where
		K: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
	{
		let index = self.entries.get_index_of(key)?;
		Some(self.promote(index))
	}

	/// Value stored at `index`.
	pub fn value_at(&self, index: usize) -> Option<&V> {
		self.entries.get_index(index).map(|(_, slot)| &slot.value)
	}

	/// Look up without changing recency.
	pub fn get<Q>(&self, key: &Q) -> Option<&Slot<V>>
	where
		K: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
	{
		self.entries.get(key)
	}

	pub fn contains<Q>(&self, key: &Q) -> bool
	where
		K: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
	{
		self.entries.contains_key(key)
	}

	/// The most recently used entry.
	pub fn most_recent(&self) -> Option<(&K, &Slot<V>)> {
		self.entries.last()
	}

	/// Remove an entry by key.
	pub fn remove<Q>(&mut self, key: &Q) -> Option<(K, Slot<V>)>
	where
		K: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
	{
		let (_, key, slot) = self.entries.shift_remove_full(key)?;
		self.size -= slot.weight;
		Some((key, slot))
	}

	/// Pop the least recently used entry.
	pub fn pop_lru(&mut self) -> Option<(K, Slot<V>)> {
		let (key, slot) = self.entries.shift_remove_index(0)?;
		self.size -= slot.weight;
		Some((key, slot))
	}

	/// Iterate from least to most recently used.
	pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
		self.entries.iter().map(|(key, slot)| (key, &slot.value))
	}

	/// Move the entry at `index` to the back.
	fn promote(&mut self, index: usize) -> usize {
		let last = self.entries.len() - 1;
		if index != last {
			self.entries.move_index(index, last);
		}
		last
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn keys(list: &RecencyList<u32, &'static str>) -> Vec<u32> {
		list.iter().map(|(key, _)| *key).collect()
	}

	#[test]
	fn test_insert_tracks_size() {
		let mut list = RecencyList::new();

		assert!(list.insert(1, "a", 10).is_none());
		assert!(list.insert(2, "b", 20).is_none());
		assert_eq!(list.size(), 30);
		assert_eq!(list.len(), 2);
	}

	#[test]
	fn test_replace_promotes_and_adjusts_size() {
		let mut list = RecencyList::new();
		list.insert(1, "a", 10);
		list.insert(2, "b", 20);

		let old = list.insert(1, "c", 5).expect("key 1 was present");
		assert_eq!(old.value, "a");
		assert_eq!(old.weight, 10);
		assert_eq!(list.size(), 25);
		assert_eq!(keys(&list), vec![2, 1]);
	}

	#[test]
	fn test_touch_moves_to_back() {
		let mut list = RecencyList::new();
		for key in 0..4 {
			list.insert(key, "x", 1);
		}

		let index = list.touch(&1).expect("key 1 was present");
		assert_eq!(index, 3);
		assert_eq!(keys(&list), vec![0, 2, 3, 1]);
		assert!(list.touch(&9).is_none());
	}

	#[test]
	fn test_pop_lru_order() {
		let mut list = RecencyList::new();
		list.insert(1, "a", 1);
		list.insert(2, "b", 2);
		list.touch(&1);

		let (key, slot) = list.pop_lru().expect("list is not empty");
		assert_eq!((key, slot.value), (2, "b"));
		assert_eq!(list.size(), 1);

		let (key, _) = list.pop_lru().expect("list is not empty");
		assert_eq!(key, 1);
		assert!(list.pop_lru().is_none());
		assert_eq!(list.size(), 0);
	}

	#[test]
	fn test_remove_and_get() {
		let mut list = RecencyList::new();
		list.insert(1, "a", 3);

		assert_eq!(list.get(&1).map(|slot| slot.value), Some("a"));
		assert!(list.contains(&1));

		let (_, slot) = list.remove(&1).expect("key 1 was present");
		assert_eq!(slot.weight, 3);
		assert_eq!(list.size(), 0);
		assert!(!list.contains(&1));
		assert!(list.remove(&1).is_none());
	}
}
