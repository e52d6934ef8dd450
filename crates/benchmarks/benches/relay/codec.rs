//! Announcement and request/response codec benchmarks.

use compact_relay::{CompactAnnouncement, MissingRequest};
use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use relay_benchmarks::utils::seeded_block;
use relay_types::wire::WireEncode;

pub fn register_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("relay/codec");

    for tx_count in [100usize, 2_500] {
        let block = seeded_block(tx_count);
        let announcement = CompactAnnouncement::from_block_with_nonce(&block, 42);
        let bytes = announcement.to_bytes();

        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("encode_announcement", tx_count),
            &announcement,
            |b, announcement| b.iter(|| black_box(announcement.to_bytes())),
        );
        group.bench_with_input(
            BenchmarkId::new("decode_announcement", tx_count),
            &bytes,
            |b, bytes| b.iter(|| black_box(CompactAnnouncement::from_bytes(black_box(bytes)))),
        );
    }

    // A sparse request, the common case after a warm mempool resolves most
    // slots locally.
    let request = MissingRequest::new([0x42; 32], (0..64u32).map(|i| i * 37).collect());
    let request_bytes = request.to_bytes();
    group.bench_function("encode_request_64_indexes", |b| {
        b.iter(|| black_box(request.to_bytes()))
    });
    group.bench_function("decode_request_64_indexes", |b| {
        b.iter(|| black_box(MissingRequest::from_bytes(black_box(&request_bytes))))
    });

    group.finish();
}
