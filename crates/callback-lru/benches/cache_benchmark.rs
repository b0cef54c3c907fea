use std::hint::black_box;
use std::sync::Arc;
use std::thread;

use callback_lru::{CacheBuilder, LruCache, SharedLruCache};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use quick_cache::unsync::Cache as QuickCache;

const CACHE_CAPACITY: usize = 1000;

fn bench_put(c: &mut Criterion) {
	let mut group = c.benchmark_group("put");

	for size in [100u64, 1000, 10000] {
		group.throughput(Throughput::Elements(size));
		group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
			b.iter(|| {
				let mut cache = LruCache::new(CACHE_CAPACITY);
				for i in 0..size {
					cache.put(black_box(i), black_box(vec![0u8; 64]));
				}
			});
		});
	}

	group.finish();
}

fn bench_get_hit(c: &mut Criterion) {
	let mut cache = LruCache::new(CACHE_CAPACITY);
	for i in 0..CACHE_CAPACITY as u64 {
		cache.put(i, vec![0u8; 64]);
	}

	c.bench_function("get_hit", |b| {
		b.iter(|| {
			for i in 0..CACHE_CAPACITY as u64 {
				black_box(cache.get(&black_box(i)));
			}
		});
	});
}

fn bench_get_miss_with_factory(c: &mut Criterion) {
	c.bench_function("get_miss_factory", |b| {
		b.iter(|| {
			let mut cache = CacheBuilder::new(CACHE_CAPACITY)
				.factory(|key: &u64| Some(vec![*key as u8; 64]))
				.build();
			for i in 0..2000u64 {
				black_box(cache.get(&black_box(i)));
			}
		});
	});
}

fn bench_eviction_pressure(c: &mut Criterion) {
	c.bench_function("eviction_pressure", |b| {
		b.iter(|| {
			let mut evicted = 0usize;
			let mut cache = CacheBuilder::new(64 * 100)
				.weigher(|_key: &u64, value: &Vec<u8>| value.len())
				.on_removed(|was_evicted: bool, _key: &u64, _old: &Vec<u8>, _new: Option<&Vec<u8>>| {
					if was_evicted {
						evicted += 1;
					}
				})
				.build();
			for i in 0..1000u64 {
				cache.put(i, vec![0u8; 64]);
			}
			drop(cache);
			black_box(evicted)
		});
	});
}

fn bench_shared_concurrent_reads(c: &mut Criterion) {
	let cache = Arc::new(SharedLruCache::new(CACHE_CAPACITY));
	for i in 0..CACHE_CAPACITY as u64 {
		cache.put(i, vec![0u8; 64]);
	}

	let mut group = c.benchmark_group("shared_concurrent_reads");

	for threads in [1, 2, 4] {
		group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
			b.iter(|| {
				let handles: Vec<_> = (0..threads)
					.map(|_| {
						let cache = cache.clone();
						thread::spawn(move || {
							for i in 0..1000u64 {
								black_box(cache.get(&i));
							}
						})
					})
					.collect();
				for handle in handles {
					handle.join().unwrap();
				}
			});
		});
	}

	group.finish();
}

// Comparison Benchmarks: callback-lru vs quick_cache

fn bench_comparison_get_hit(c: &mut Criterion) {
	let mut group = c.benchmark_group("comparison_get_hit");

	let mut lru = LruCache::new(CACHE_CAPACITY);
	let mut quick = QuickCache::new(CACHE_CAPACITY);
	for i in 0..CACHE_CAPACITY as u64 {
		lru.put(i, vec![0u8; 64]);
		quick.insert(i, vec![0u8; 64]);
	}

	group.bench_function("callback_lru", |b| {
		b.iter(|| {
			for i in 0..CACHE_CAPACITY as u64 {
				black_box(lru.get(&black_box(i)));
			}
		});
	});

	group.bench_function("quick_cache", |b| {
		b.iter(|| {
			for i in 0..CACHE_CAPACITY as u64 {
				black_box(quick.get(&black_box(i)));
			}
		});
	});

	group.finish();
}

criterion_group!(
	benches,
	bench_put,
	bench_get_hit,
	bench_get_miss_with_factory,
	bench_eviction_pressure,
	bench_shared_concurrent_reads,
	bench_comparison_get_hit,
);
criterion_main!(benches);
