use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use navdb::storage::id_allocator::IdAllocator;
use std::sync::Arc;
use std::thread;
use rand::Rng;
use tempfile::TempDir;

/// Benchmark sequential allocation on one table (one fsync'd rewrite per id)
fn bench_next_id(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let ids = IdAllocator::open(dir.path().join("id_store.json")).unwrap();

    c.bench_function("next_id_single_table", |b| {
        b.iter(|| black_box(ids.next_id("nav").unwrap()));
    });
}

/// Benchmark allocation cost as the counter file grows
fn bench_next_id_many_tables(c: &mut Criterion) {
    let mut group = c.benchmark_group("next_id_tables");
    group.sample_size(20);

    for table_count in [1, 10, 100].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(table_count),
            table_count,
            |b, &table_count| {
                let dir = TempDir::new().unwrap();
                let ids = IdAllocator::open(dir.path().join("id_store.json")).unwrap();
                let tables: Vec<String> = (0..table_count).map(|i| format!("table_{}", i)).collect();
                for table in &tables {
                    ids.advance_to(table, 1).unwrap();
                }
                let mut rng = rand::thread_rng();

                b.iter(|| {
                    let table = &tables[rng.gen_range(0..tables.len())];
                    black_box(ids.next_id(table).unwrap());
                });
            },
        );
    }

    group.finish();
}

/// Benchmark contended allocation across threads and tables
fn bench_concurrent_next_id(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_next_id");
    group.sample_size(10);

    for thread_count in [2, 4, 8].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(thread_count),
            thread_count,
            |b, &thread_count| {
                let dir = TempDir::new().unwrap();
                let ids = Arc::new(IdAllocator::open(dir.path().join("id_store.json")).unwrap());

                b.iter(|| {
                    let handles: Vec<_> = (0..thread_count)
                        .map(|t| {
                            let ids = ids.clone();
                            thread::spawn(move || {
                                let table = format!("table_{}", t % 2);
                                for _ in 0..10 {
                                    ids.next_id(&table).unwrap();
                                }
                            })
                        })
                        .collect();

                    for handle in handles {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

/// Benchmark reopening a populated counter file
fn bench_open(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("id_store.json");
    {
        let ids = IdAllocator::open(&path).unwrap();
        for i in 0..200 {
            ids.advance_to(&format!("table_{}", i), i + 1).unwrap();
        }
    }

    c.bench_function("open_200_tables", |b| {
        b.iter(|| {
            let ids = IdAllocator::open(black_box(&path)).unwrap();
            black_box(ids.current("table_199"));
        });
    });
}

criterion_group!(
    benches,
    bench_next_id,
    bench_next_id_many_tables,
    bench_concurrent_next_id,
    bench_open
);
criterion_main!(benches);
