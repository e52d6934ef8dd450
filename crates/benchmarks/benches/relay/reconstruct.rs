//! Reconstruction benchmarks: announcement to assembled block.

use std::sync::Arc;

use compact_relay::{BlockReconstructor, CompactAnnouncement, InMemoryMempool};
use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use relay_benchmarks::utils::{seeded_block, seeded_tx};

pub fn register_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("relay/reconstruct");

    for tx_count in [100usize, 2_500] {
        let block = seeded_block(tx_count);
        let announcement = CompactAnnouncement::from_block_with_nonce(&block, 42);

        // A pool holding the whole block plus unrelated churn.
        let pool = Arc::new(InMemoryMempool::new());
        for tx in &block.transactions[1..] {
            pool.insert(tx.clone());
        }
        for seed in 0..1_000u32 {
            pool.insert(seeded_tx(1_000_000 + seed));
        }

        group.throughput(Throughput::Elements(tx_count as u64));
        group.bench_with_input(
            BenchmarkId::new("init_warm_mempool", tx_count),
            &announcement,
            |b, announcement| {
                b.iter(|| {
                    let mut reconstructor = BlockReconstructor::new(Arc::clone(&pool));
                    reconstructor.init(black_box(announcement)).unwrap();
                    black_box(reconstructor.missing_indexes().len())
                    // Drop releases the pins inside the measured loop, the
                    // same lifecycle a relay node pays per announcement.
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("init_and_fill", tx_count),
            &announcement,
            |b, announcement| {
                b.iter(|| {
                    let mut reconstructor = BlockReconstructor::new(Arc::clone(&pool));
                    reconstructor.init(black_box(announcement)).unwrap();
                    black_box(reconstructor.fill(&[]).unwrap())
                })
            },
        );
    }

    // Cold mempool: every slot except the coinbase is missing, exercising
    // the request path.
    let block = seeded_block(2_500);
    let announcement = CompactAnnouncement::from_block_with_nonce(&block, 42);
    let empty_pool = Arc::new(InMemoryMempool::new());
    group.bench_function("init_cold_mempool_2500", |b| {
        b.iter(|| {
            let mut reconstructor = BlockReconstructor::new(Arc::clone(&empty_pool));
            reconstructor.init(black_box(&announcement)).unwrap();
            black_box(reconstructor.missing_request())
        })
    });

    group.finish();
}
