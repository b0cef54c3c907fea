//! # Callback LRU
//!
//! A size-bounded least-recently-used cache with three pluggable callbacks:
//! - **Weigher**: the weight each entry contributes to the bound (default: 1)
//! - **Factory**: synthesizes a value when a lookup misses (default: none)
//! - **Removal listener**: observes every entry leaving the cache, whether it
//!   was evicted, removed or replaced (default: ignored)
//!
//! ## Quick Start
//!
//! ```rust
//! use callback_lru::CacheBuilder;
//!
//! let mut cache = CacheBuilder::new(10)
//!     .weigher(|_key: &&str, value: &String| value.len())
//!     .on_removed(|evicted: bool, key: &&str, old: &String, _new: Option<&String>| {
//!         println!("{key} left the cache (evicted: {evicted}, was {old:?})");
//!     })
//!     .build();
//!
//! cache.put("greeting", "hello".to_string());
//! cache.put("subject", "world".to_string());
//! assert_eq!(cache.size(), 10);
//!
//! // Touch "greeting" so "subject" is now the least recently used entry
//! cache.get(&"greeting");
//! cache.put("mark", "!".to_string());
//!
//! assert!(!cache.contains(&"subject"));
//! assert_eq!(cache.size(), 6);
//! ```
//!
//! ## Thread Safety
//!
//! [`LruCache`] is a plain `&mut self` data structure. [`SharedLruCache`]
//! wraps it in a mutex and can be shared across threads via `Arc`:
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use callback_lru::SharedLruCache;
//!
//! let cache = Arc::new(SharedLruCache::new(1024));
//! cache.put(1u64, "one".to_string());
//! assert_eq!(cache.get(&1).as_deref(), Some("one"));
//! ```

mod builder;
mod cache;
mod error;
mod lru;
#[cfg(feature = "metrics")]
mod metrics;
mod shared;
mod traits;

pub use builder::{CacheBuilder, lru_cache};
pub use cache::LruCache;
pub use error::BuildError;
#[cfg(feature = "metrics")]
pub use metrics::CacheMetrics;
pub use shared::SharedLruCache;
pub use traits::{Factory, NoFactory, NoopListener, RemovalListener, UnitWeigher, Weigher};
