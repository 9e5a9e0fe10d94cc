//! # Ledger Query Benchmarks
//!
//! Paging throughput over a generated ledger:
//!
//! | Benchmark | Path exercised |
//! |-----------|----------------|
//! | `page_walk` | token decode, scan resume, residual filtering |
//! | `index_lookup` | secondary index scans by asset and address |
//! | `stream_page` | producer task, blocking-pool steps and channel hand-off |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ledger_query::{
    LedgerQueryApi, LedgerQueryService, MemoryRowStore, QueryContext, TransactionFilter,
};
use ledger_query_tests::fixtures::{LedgerFixture, USDT};
use shared_types::TxnType;
use std::time::Duration;

fn walk_all(
    service: &LedgerQueryService<MemoryRowStore>,
    filter: &TransactionFilter,
    page_size: u64,
) -> usize {
    let mut total = 0;
    let mut token: Option<String> = None;
    loop {
        let mut page = filter.clone().with_limit(page_size);
        page.next_token = token.take();
        let mut execution = service.prepare_transactions(&page).unwrap();
        let rows = execution.by_ref().filter(|e| !e.is_error()).count();
        total += rows;
        match execution.next_token() {
            Some(next) if rows as u64 == page_size => token = Some(next),
            _ => return total,
        }
    }
}

fn bench_page_walk(c: &mut Criterion) {
    let fixture = LedgerFixture::generate(11, 2_000, 64);
    let service = fixture.service();
    let filter = TransactionFilter::new();

    let mut group = c.benchmark_group("page_walk");
    group.measurement_time(Duration::from_secs(5));
    group.throughput(Throughput::Elements(fixture.transactions.len() as u64));

    for page_size in [10u64, 100, 1_000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(page_size),
            &page_size,
            |b, &page_size| b.iter(|| black_box(walk_all(&service, &filter, page_size))),
        );
    }
    group.finish();
}

fn bench_index_lookup(c: &mut Criterion) {
    let fixture = LedgerFixture::generate(11, 2_000, 64);
    let service = fixture.service();
    let address = fixture.addresses[0];

    let mut group = c.benchmark_group("index_lookup");
    let cases = [
        ("asset", TransactionFilter::new().with_asset_id(USDT)),
        ("address", TransactionFilter::new().with_address(address.to_vec())),
        (
            "type_residual",
            TransactionFilter::new().with_type(TxnType::KeyRegistration),
        ),
    ];
    for (name, filter) in cases {
        group.bench_function(name, |b| {
            b.iter(|| black_box(walk_all(&service, &filter, 100)))
        });
    }
    group.finish();
}

fn bench_stream_page(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let fixture = LedgerFixture::generate(11, 500, 32);
    let service = fixture.service();
    let ctx = QueryContext::background();

    let mut group = c.benchmark_group("stream_page");
    for limit in [1u64, 100] {
        let filter = TransactionFilter::new().with_limit(limit);
        group.throughput(Throughput::Elements(limit));
        group.bench_with_input(BenchmarkId::from_parameter(limit), &filter, |b, filter| {
            b.iter(|| {
                runtime.block_on(async {
                    let page = service
                        .transactions(&ctx, filter)
                        .await
                        .unwrap()
                        .collect_page()
                        .await
                        .unwrap();
                    black_box(page.len())
                })
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_page_walk, bench_index_lookup, bench_stream_page);
criterion_main!(benches);
