//! Short-ID derivation benchmarks.
//!
//! A receiver fingerprints every mempool entry once per announcement, so the
//! per-hash cost multiplies by mempool size under load.

use compact_relay::ShortIdSelector;
use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use relay_benchmarks::utils::{generate_random_hash, seeded_block};

pub fn register_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("relay/short_id");

    let header = seeded_block(1).header;

    group.bench_function("derive_selector", |b| {
        b.iter(|| black_box(ShortIdSelector::derive(black_box(&header), black_box(42))))
    });

    let selector = ShortIdSelector::derive(&header, 42);
    let tx_hash = generate_random_hash();
    group.bench_function("single_fingerprint", |b| {
        b.iter(|| black_box(selector.short_id(black_box(&tx_hash))))
    });

    // Mempool-scan shaped workloads.
    for count in [1_000usize, 10_000, 50_000] {
        let hashes: Vec<[u8; 32]> = (0..count).map(|_| generate_random_hash()).collect();
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(
            BenchmarkId::new("fingerprint_batch", count),
            &hashes,
            |b, hashes| {
                b.iter(|| {
                    let mut acc = 0u64;
                    for hash in hashes {
                        acc ^= selector.short_id(hash);
                    }
                    black_box(acc)
                })
            },
        );
    }

    // Adversarial: hashes sharing a long common prefix must not slow the
    // keyed hash down or cluster its outputs.
    let adversarial: Vec<[u8; 32]> = {
        let prefix = generate_random_hash();
        (0..10_000u32)
            .map(|i| {
                let mut hash = prefix;
                hash[28..].copy_from_slice(&i.to_le_bytes());
                hash
            })
            .collect()
    };
    group.throughput(Throughput::Elements(adversarial.len() as u64));
    group.bench_function("fingerprint_common_prefix_batch", |b| {
        b.iter(|| {
            let mut acc = 0u64;
            for hash in &adversarial {
                acc ^= selector.short_id(hash);
            }
            black_box(acc)
        })
    });

    group.finish();
}
